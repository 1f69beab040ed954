//! The input element tree: read-only, externally owned, consumed only
//! through the [`ElementNode`] trait. HTML tree construction and CSS
//! cascade happen entirely upstream of this crate — see `spec.md` §1.

use crate::style::StyleView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// One node of the already-built, already-styled document tree.
///
/// Implementors are expected to be cheap to clone (a handle/pointer, not
/// an owned subtree) since the engine clones nodes freely while
/// recursing. `children()` allocates a `Vec` rather than returning a
/// borrowed slice so that implementations backed by an arena, a DOM
/// `RefCell` tree, or a lazily-materialized list can all satisfy the
/// trait without exposing their storage.
pub trait ElementNode: Clone {
    type Style: StyleView;

    fn kind(&self) -> NodeKind;

    /// Lowercased tag name. Meaningless (but must not panic) for text
    /// nodes; implementors may return `""`.
    fn tag_name(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    /// The node's character data. Meaningless for element nodes.
    fn text_content(&self) -> Option<&str>;

    fn children(&self) -> Vec<Self>;

    fn style(&self) -> Self::Style;

    /// The computed style of this element's `::before` pseudo-element,
    /// if any rule in the originating stylesheets matches it. `None`
    /// means no `::before` box is generated, independent of whether the
    /// returned style (when `Some`) has a `content` value — callers
    /// still check `content()` before generating a box, since a rule
    /// can target `::before` without setting `content`, in which case
    /// CSS 2.1 generates nothing.
    fn before_style(&self) -> Option<Self::Style> {
        None
    }

    fn after_style(&self) -> Option<Self::Style> {
        None
    }

    /// The computed style of `::first-letter`, if it matches this
    /// element. See `spec.md` §4.7.
    fn first_letter_style(&self) -> Option<Self::Style> {
        None
    }

    #[must_use]
    fn is_element(&self) -> bool {
        matches!(self.kind(), NodeKind::Element)
    }

    #[must_use]
    fn is_text(&self) -> bool {
        matches!(self.kind(), NodeKind::Text)
    }

    /// `<br>` forces a line break with no box, per `spec.md` §4.1 step 14.
    #[must_use]
    fn is_line_break(&self) -> bool {
        self.is_element() && self.tag_name() == "br"
    }

    /// A replaced image: `<img>`, or `<object>` with a loadable `data`
    /// attribute (`spec.md` §4.1 step 1).
    #[must_use]
    fn replaced_image_source(&self) -> Option<&str> {
        if !self.is_element() {
            return None;
        }
        match self.tag_name() {
            "img" => self.attribute("src"),
            "object" => self.attribute("data"),
            _ => None,
        }
    }
}
