//! Generated content, pseudo-elements and list markers (`spec.md` §4.8,
//! and the `display:list-item` marker generation referenced in §4.1).

use crate::{
    counters::CounterStore,
    dom::ElementNode,
    style::{ContentAtom, ListStyleType, StyleView},
};

/// The resolved text/image runs a `content` value expands to, already
/// split around any `url(...)` atoms the way §4.8 describes: text before
/// the first image, the images themselves in order, and text after the
/// last image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeneratedContent {
    pub pre_image: String,
    pub images: Vec<String>,
    pub post_image: String,
}

impl GeneratedContent {
    #[must_use]
    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    #[must_use]
    pub fn text_only(&self) -> String {
        format!("{}{}", self.pre_image, self.post_image)
    }
}

/// Resolve a parsed `content` atom list into concatenated text runs and
/// an ordered image list, applying `counter-increment` on the owning
/// pseudo-element first (per §4.8: "counter(name) replaced by its
/// current value (after applying counter-increment on this
/// pseudo-element)").
pub fn resolve_content<N: ElementNode>(
    atoms: &[ContentAtom],
    host: &N,
    counters: &CounterStore,
    quote_depth: &mut u32,
) -> GeneratedContent {
    let mut result = GeneratedContent::default();
    let mut quote_depth_local = *quote_depth;

    for atom in atoms {
        let piece = match atom {
            ContentAtom::Literal(s) => s.clone(),
            ContentAtom::Counter(name) => counters.value(name).to_string(),
            ContentAtom::Attr(name) => host.attribute(name).unwrap_or("").to_string(),
            ContentAtom::OpenQuote => {
                let depth = quote_depth_local;
                quote_depth_local += 1;
                quote_char(depth, true).to_string()
            },
            ContentAtom::CloseQuote => {
                quote_depth_local = quote_depth_local.saturating_sub(1);
                quote_char(quote_depth_local, false).to_string()
            },
            ContentAtom::Url(src) => {
                result.images.push(src.clone());
                continue;
            },
        };

        if result.images.is_empty() {
            result.pre_image.push_str(&piece);
        } else {
            result.post_image.push_str(&piece);
        }
    }

    *quote_depth = quote_depth_local;
    result
}

/// Alternates straight double quotes with single quotes at each nesting
/// depth, the common UA-stylesheet convention for `open-quote`/
/// `close-quote` when no `quotes` property override is consulted (the
/// `quotes` property itself is out of scope — see `SPEC_FULL.md`).
fn quote_char(depth: u32, opening: bool) -> char {
    match (depth % 2, opening) {
        (0, true) => '\u{201C}',
        (0, false) => '\u{201D}',
        (_, true) => '\u{2018}',
        (_, false) => '\u{2019}',
    }
}

/// The marker string for a `display: list-item` box, or `None` when
/// `list-style-type: none`. `counter_name` is conventionally `"list-item"`
/// but callers may scope it per list.
#[must_use]
pub fn list_marker_text(style: &dyn StyleView, counters: &CounterStore, counter_name: &str) -> Option<String> {
    match style.list_style_type() {
        ListStyleType::None => None,
        ListStyleType::Decimal => Some(format!("{}.", counters.value(counter_name))),
        other => other.static_marker().map(ToString::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dom::NodeKind, style::Position};

    #[derive(Clone, Default)]
    struct StubStyle;
    impl StyleView for StubStyle {
        fn display(&self) -> crate::style::Display {
            crate::style::Display::Inline
        }
        fn position(&self) -> Position {
            Position::Static
        }
        fn float(&self) -> crate::style::Float {
            crate::style::Float::None
        }
        fn clear(&self) -> crate::style::Clear {
            crate::style::Clear::None
        }
        fn overflow(&self) -> crate::style::Overflow {
            crate::style::Overflow::Visible
        }
        fn margin_top(&self) -> crate::style::LengthPercentageAuto {
            crate::pixels::AutoOr::Auto
        }
        fn margin_right(&self) -> crate::style::LengthPercentageAuto {
            crate::pixels::AutoOr::Auto
        }
        fn margin_bottom(&self) -> crate::style::LengthPercentageAuto {
            crate::pixels::AutoOr::Auto
        }
        fn margin_left(&self) -> crate::style::LengthPercentageAuto {
            crate::pixels::AutoOr::Auto
        }
        fn padding_top(&self) -> crate::style::LengthPercentage {
            crate::style::LengthPercentage::Length(crate::pixels::CSSPixels::ZERO)
        }
        fn padding_right(&self) -> crate::style::LengthPercentage {
            crate::style::LengthPercentage::Length(crate::pixels::CSSPixels::ZERO)
        }
        fn padding_bottom(&self) -> crate::style::LengthPercentage {
            crate::style::LengthPercentage::Length(crate::pixels::CSSPixels::ZERO)
        }
        fn padding_left(&self) -> crate::style::LengthPercentage {
            crate::style::LengthPercentage::Length(crate::pixels::CSSPixels::ZERO)
        }
        fn border_top_width(&self) -> crate::pixels::CSSPixels {
            crate::pixels::CSSPixels::ZERO
        }
        fn border_right_width(&self) -> crate::pixels::CSSPixels {
            crate::pixels::CSSPixels::ZERO
        }
        fn border_bottom_width(&self) -> crate::pixels::CSSPixels {
            crate::pixels::CSSPixels::ZERO
        }
        fn border_left_width(&self) -> crate::pixels::CSSPixels {
            crate::pixels::CSSPixels::ZERO
        }
        fn width(&self) -> crate::style::LengthPercentageAuto {
            crate::pixels::AutoOr::Auto
        }
        fn height(&self) -> crate::style::LengthPercentageAuto {
            crate::pixels::AutoOr::Auto
        }
        fn font_size(&self) -> crate::pixels::CSSPixels {
            crate::pixels::CSSPixels(16.0)
        }
    }

    #[derive(Clone)]
    struct StubNode;
    impl ElementNode for StubNode {
        type Style = StubStyle;
        fn kind(&self) -> NodeKind {
            NodeKind::Element
        }
        fn tag_name(&self) -> &str {
            "q"
        }
        fn attribute(&self, name: &str) -> Option<&str> {
            if name == "data-foo" {
                Some("bar")
            } else {
                None
            }
        }
        fn text_content(&self) -> Option<&str> {
            None
        }
        fn children(&self) -> Vec<Self> {
            Vec::new()
        }
        fn style(&self) -> Self::Style {
            StubStyle
        }
    }

    #[test]
    fn resolves_counter_and_attr_atoms() {
        let mut counters = CounterStore::new();
        counters.reset("item", 0);
        counters.increment("item", 3);
        let atoms = vec![
            ContentAtom::Literal("#".to_string()),
            ContentAtom::Counter("item".to_string()),
            ContentAtom::Literal(" (".to_string()),
            ContentAtom::Attr("data-foo".to_string()),
            ContentAtom::Literal(")".to_string()),
        ];
        let mut quote_depth = 0;
        let resolved = resolve_content(&atoms, &StubNode, &counters, &mut quote_depth);
        assert_eq!(resolved.text_only(), "#3 (bar)");
    }

    #[test]
    fn splits_text_around_url_atoms() {
        let counters = CounterStore::new();
        let atoms = vec![
            ContentAtom::Literal("before".to_string()),
            ContentAtom::Url("icon.png".to_string()),
            ContentAtom::Literal("after".to_string()),
        ];
        let mut quote_depth = 0;
        let resolved = resolve_content(&atoms, &StubNode, &counters, &mut quote_depth);
        assert_eq!(resolved.pre_image, "before");
        assert_eq!(resolved.images, vec!["icon.png".to_string()]);
        assert_eq!(resolved.post_image, "after");
    }

    #[test]
    fn decimal_marker_uses_counter_value() {
        let mut counters = CounterStore::new();
        counters.reset("list-item", 2);
        let style = StubStyle;
        assert_eq!(
            list_marker_text(&style, &counters, "list-item").as_deref(),
            Some("2.")
        );
    }
}
