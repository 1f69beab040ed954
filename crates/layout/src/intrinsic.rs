//! The intrinsic sizer (`spec.md` §4.3): a pure function from a subtree
//! and its styles to `{min_content, max_content, preferred}`, used by
//! shrink-to-fit sizing, table column sizing and flex basis resolution.
//! It never mutates engine state and never calls into the float context
//! or box arena — callers that need a number for layout call this first
//! and then proceed with ordinary layout using the result.

use crate::{
    dom::ElementNode,
    oracle::{image_size_or_placeholder, ImageOracle, MeasureTextOracle},
    pixels::CSSPixels,
    style::{LengthPercentage, StyleView},
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IntrinsicSizes {
    pub min_content: CSSPixels,
    pub max_content: CSSPixels,
    /// `Some` when the node has an explicit (non-auto) width that pins
    /// both bounds to the same value.
    pub preferred: Option<CSSPixels>,
}

impl IntrinsicSizes {
    #[must_use]
    fn fixed(width: CSSPixels) -> Self {
        Self {
            min_content: width,
            max_content: width,
            preferred: Some(width),
        }
    }

    fn add_edges(mut self, edges: CSSPixels) -> Self {
        self.min_content += edges;
        self.max_content += edges;
        if let Some(p) = &mut self.preferred {
            *p += edges;
        }
        self
    }
}

/// An accumulator for the "walk children, flush inline runs at block
/// boundaries" rule block and inline-block containers use.
#[derive(Default)]
struct RunAccumulator {
    min_content: CSSPixels,
    max_content: CSSPixels,
    run_min: CSSPixels,
    run_max: CSSPixels,
}

impl RunAccumulator {
    fn push_inline(&mut self, child: IntrinsicSizes) {
        // An inline run's min-content is the widest single unbreakable
        // child within it (mirrors the inline-element rule); its
        // max-content is the sum of every child's max-content, since
        // nothing in the run forces a break.
        self.run_min = self.run_min.max(child.min_content);
        self.run_max += child.max_content;
    }

    fn flush_run(&mut self) {
        self.min_content = self.min_content.max(self.run_min);
        self.max_content = self.max_content.max(self.run_max);
        self.run_min = CSSPixels::ZERO;
        self.run_max = CSSPixels::ZERO;
    }

    fn push_block(&mut self, child: IntrinsicSizes) {
        self.flush_run();
        self.min_content = self.min_content.max(child.min_content);
        self.max_content = self.max_content.max(child.max_content);
    }

    fn finish(mut self) -> (CSSPixels, CSSPixels) {
        self.flush_run();
        (self.min_content, self.max_content)
    }
}

pub fn compute_intrinsic_sizes<N: ElementNode>(
    node: &N,
    text_oracle: &dyn MeasureTextOracle,
    image_oracle: Option<&dyn ImageOracle>,
) -> IntrinsicSizes {
    use crate::dom::NodeKind;

    if node.is_text() {
        let text = node.text_content().unwrap_or("");
        return intrinsic_text(text, CSSPixels(16.0), false, text_oracle);
    }

    let style = node.style();
    if style.display().is_none() {
        return IntrinsicSizes::default();
    }

    let font_size = style.font_size();
    let bold = style.font_bold();

    let edges = style.padding_left().resolve_against(CSSPixels::ZERO)
        + style.padding_right().resolve_against(CSSPixels::ZERO)
        + style.border_left_width()
        + style.border_right_width();

    if let Some(src) = node.replaced_image_source() {
        let sizes = match style.width() {
            crate::pixels::AutoOr::NotAuto(LengthPercentage::Length(w)) => IntrinsicSizes::fixed(w),
            _ => {
                let (w, _h) = image_oracle
                    .map(|o| image_size_or_placeholder(o, src))
                    .unwrap_or((CSSPixels(100.0), CSSPixels(100.0)));
                IntrinsicSizes::fixed(w)
            },
        };
        return sizes.add_edges(edges);
    }

    if matches!(node.kind(), NodeKind::Text) {
        unreachable!("text nodes handled above");
    }

    if let crate::pixels::AutoOr::NotAuto(LengthPercentage::Length(w)) = style.width() {
        return IntrinsicSizes::fixed(w).add_edges(edges);
    }

    let children = node.children();
    if style.display().is_inline_level() || style.display() == crate::style::Display::Inline {
        // Inline element: children laid out horizontally.
        let mut min_content = CSSPixels::ZERO;
        let mut max_content = CSSPixels::ZERO;
        for child in &children {
            if child.is_element() && child.style().display().is_none() {
                continue;
            }
            let child_sizes = compute_intrinsic_sizes_with_font(child, text_oracle, image_oracle, font_size, bold);
            min_content = min_content.max(child_sizes.min_content);
            max_content += child_sizes.max_content;
        }
        return IntrinsicSizes {
            min_content,
            max_content,
            preferred: None,
        }
        .add_edges(edges);
    }

    // Block / inline-block with auto width: walk children, flushing the
    // inline run at each block-level boundary.
    let mut acc = RunAccumulator::default();
    for child in &children {
        if child.is_element() && child.style().display().is_none() {
            continue;
        }
        let child_sizes = compute_intrinsic_sizes_with_font(child, text_oracle, image_oracle, font_size, bold);
        let child_is_inline = child.is_text() || child.style().display().is_inline_level();
        if child_is_inline {
            acc.push_inline(child_sizes);
        } else {
            acc.push_block(child_sizes);
        }
    }
    let (min_content, max_content) = acc.finish();

    IntrinsicSizes {
        min_content,
        max_content,
        preferred: None,
    }
    .add_edges(edges)
}

/// Text nodes don't carry their own font size; they inherit the
/// containing element's. This threads it through without re-deriving
/// the parent's style for every text child.
fn compute_intrinsic_sizes_with_font<N: ElementNode>(
    node: &N,
    text_oracle: &dyn MeasureTextOracle,
    image_oracle: Option<&dyn ImageOracle>,
    inherited_font_size: CSSPixels,
    inherited_bold: bool,
) -> IntrinsicSizes {
    if node.is_text() {
        let text = node.text_content().unwrap_or("");
        return intrinsic_text(text, inherited_font_size, inherited_bold, text_oracle);
    }
    compute_intrinsic_sizes(node, text_oracle, image_oracle)
}

fn intrinsic_text(
    text: &str,
    font_size: CSSPixels,
    bold: bool,
    oracle: &dyn MeasureTextOracle,
) -> IntrinsicSizes {
    if text.trim().is_empty() {
        return IntrinsicSizes::default();
    }
    let (max_content, _) = oracle.measure_text(text, font_size, bold);
    let min_content = text
        .split_whitespace()
        .map(|word| oracle.measure_text(word, font_size, bold).0)
        .fold(CSSPixels::ZERO, CSSPixels::max);
    IntrinsicSizes {
        min_content,
        max_content,
        preferred: None,
    }
}
