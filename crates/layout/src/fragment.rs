//! The output box tree: an arena of [`LayoutBox`]es addressed by index.
//!
//! `spec.md` §9 calls this out explicitly: parent pointers, float-owner
//! pointers and cell-owner pointers are all *observational* rather than
//! ownership-defining, and the borrow checker rejects a tree of boxes
//! holding `&mut` pointers to their own parents. An arena with
//! index-based back-references sidesteps that entirely while still
//! giving every consumer the same "ask a box for its parent" accessor
//! the spec describes.

use crate::{
    pixels::{CSSPixels, Sides},
    style::Position,
};

pub type BoxId = usize;

/// A rectangular piece of an inline box that was split around a
/// block-level descendant (`spec.md` §4.9, GLOSSARY "Fragment").
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fragment {
    pub x: CSSPixels,
    pub y: CSSPixels,
    pub width: CSSPixels,
    pub height: CSSPixels,
    /// Which of the box's four borders this fragment paints. The first
    /// fragment keeps its left border, the last keeps its right border,
    /// and any fragment in between keeps neither — top/bottom are drawn
    /// on every fragment.
    pub border_edges: Sides<bool>,
}

impl Fragment {
    #[must_use]
    pub const fn whole(x: CSSPixels, y: CSSPixels, width: CSSPixels, height: CSSPixels) -> Self {
        Self {
            x,
            y,
            width,
            height,
            border_edges: Sides {
                top: true,
                right: true,
                bottom: true,
                left: true,
            },
        }
    }
}

/// One node of the produced box tree.
#[derive(Clone, Debug)]
pub struct LayoutBox {
    /// A human-readable label for the element that produced this box
    /// (its tag name, `"#text"`, or a pseudo-element name like
    /// `"::before"`/`"::marker"` for generated boxes). The box tree does
    /// not hold a live reference back into the input element tree — the
    /// caller already has that tree and can correlate by traversal order
    /// if it needs to, same as it correlates styles today.
    pub debug_label: String,

    pub parent: Option<BoxId>,
    pub children: Vec<BoxId>,

    /// Top-left of the *border* box, in root coordinate space.
    pub x: CSSPixels,
    pub y: CSSPixels,

    /// Content-box dimensions.
    pub width: CSSPixels,
    pub height: CSSPixels,

    pub margin: Sides<CSSPixels>,
    pub padding: Sides<CSSPixels>,
    pub border: Sides<CSSPixels>,

    pub position: Position,
    pub z_index: Option<i32>,

    pub image_src: Option<String>,
    pub pseudo_text: Option<String>,

    pub fragments: Vec<Fragment>,
    pub is_first_fragment: bool,
    pub is_last_fragment: bool,

    /// `visibility: hidden` ([FULL-ADD]): the box still lays out and
    /// collapses margins normally, it is just skipped by painting.
    pub visible: bool,

    /// Stacking-context inputs (`spec.md` §4.12) that don't otherwise
    /// affect geometry, stored directly on the box rather than re-read
    /// from the input tree during stacking-tree construction — the box
    /// tree keeps no back-reference to the element that produced it.
    pub opacity: f32,
    pub has_transform: bool,
}

impl LayoutBox {
    #[must_use]
    pub fn new(debug_label: impl Into<String>) -> Self {
        Self {
            debug_label: debug_label.into(),
            parent: None,
            children: Vec::new(),
            x: CSSPixels::ZERO,
            y: CSSPixels::ZERO,
            width: CSSPixels::ZERO,
            height: CSSPixels::ZERO,
            margin: Sides::all(CSSPixels::ZERO),
            padding: Sides::all(CSSPixels::ZERO),
            border: Sides::all(CSSPixels::ZERO),
            position: Position::Static,
            z_index: None,
            image_src: None,
            pseudo_text: None,
            fragments: Vec::new(),
            is_first_fragment: false,
            is_last_fragment: false,
            visible: true,
            opacity: 1.0,
            has_transform: false,
        }
    }

    /// Outer (margin-box) width: `margin.l + border.l + padding.l +
    /// width + padding.r + border.r + margin.r`.
    #[must_use]
    pub fn outer_width(&self) -> CSSPixels {
        self.margin.horizontal_sum()
            + self.border.horizontal_sum()
            + self.padding.horizontal_sum()
            + self.width
    }

    /// Outer (margin-box) height, per `spec.md` §3's invariant.
    #[must_use]
    pub fn outer_height(&self) -> CSSPixels {
        self.margin.vertical_sum() + self.border.vertical_sum() + self.padding.vertical_sum() + self.height
    }

    #[must_use]
    pub fn border_box_x(&self) -> CSSPixels {
        self.x
    }

    #[must_use]
    pub fn border_box_y(&self) -> CSSPixels {
        self.y
    }

    #[must_use]
    pub fn content_x(&self) -> CSSPixels {
        self.x + self.border.left + self.padding.left
    }

    #[must_use]
    pub fn content_y(&self) -> CSSPixels {
        self.y + self.border.top + self.padding.top
    }

    /// Shift this box (but not its descendants) by `(dx, dy)`. Used by
    /// the "shift-children" policy: callers that also need to move the
    /// subtree call [`BoxArena::shift_subtree`].
    pub fn shift(&mut self, dx: CSSPixels, dy: CSSPixels) {
        self.x += dx;
        self.y += dy;
        for fragment in &mut self.fragments {
            fragment.x += dx;
            fragment.y += dy;
        }
    }
}

/// Owns every [`LayoutBox`] produced by one `Engine::layout` call.
#[derive(Clone, Debug, Default)]
pub struct BoxArena {
    boxes: Vec<LayoutBox>,
}

impl BoxArena {
    #[must_use]
    pub fn new() -> Self {
        Self { boxes: Vec::new() }
    }

    pub fn alloc(&mut self, b: LayoutBox) -> BoxId {
        self.boxes.push(b);
        self.boxes.len() - 1
    }

    #[must_use]
    pub fn get(&self, id: BoxId) -> &LayoutBox {
        &self.boxes[id]
    }

    pub fn get_mut(&mut self, id: BoxId) -> &mut LayoutBox {
        &mut self.boxes[id]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn add_child(&mut self, parent: BoxId, child: BoxId) {
        self.boxes[child].parent = Some(parent);
        self.boxes[parent].children.push(child);
    }

    /// Move `root` and every one of its descendants by `(dx, dy)`. This
    /// is how the engine satisfies the "absolute-position delta" and
    /// "shift-children" invariants from `spec.md` §8: a box is built at
    /// a tentative position, and once its final position is known
    /// (after margin collapsing, float placement, or absolute
    /// positioning) the whole subtree is translated coherently in one
    /// step rather than being rebuilt.
    pub fn shift_subtree(&mut self, root: BoxId, dx: CSSPixels, dy: CSSPixels) {
        if dx.is_zero() && dy.is_zero() {
            return;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.boxes[id].shift(dx, dy);
            stack.extend(self.boxes[id].children.iter().copied());
        }
    }

    /// Depth-first iterator in document/paint order (parents before
    /// children, children in the order they were added).
    pub fn iter_subtree(&self, root: BoxId) -> impl Iterator<Item = BoxId> + '_ {
        let mut stack = vec![root];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            // Push in reverse so we pop (and thus visit) in original order.
            stack.extend(self.boxes[id].children.iter().rev().copied());
            Some(id)
        })
    }
}

/// A line box produced by the inline formatter (`spec.md` §3).
#[derive(Clone, Debug)]
pub struct LineBox {
    pub y: CSSPixels,
    pub height: CSSPixels,
    pub left_edge: CSSPixels,
    pub available_width: CSSPixels,
    pub baseline_y: CSSPixels,
    pub children: Vec<BoxId>,
}
