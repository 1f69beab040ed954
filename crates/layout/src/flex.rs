//! Flex layout (`spec.md` §4.11): single-pass main-axis sizing
//! (flex-basis plus grow/shrink distribution) followed by a
//! cross-axis alignment pass once each line's cross size is known.
//!
//! The container's own main size is only pinned in advance for
//! `flex-direction: row` (it's the caller's `width`); for `column` the
//! container is always auto-height (`block.rs` never clamps a flex
//! container to an explicit height), so the main size *is* the sum of
//! the items' hypothetical sizes by construction and free space is
//! always zero — grow/shrink distribution degenerates to a no-op there
//! rather than needing a separate code path.

use crate::{
    block,
    context::LayoutContext,
    dom::ElementNode,
    fragment::BoxId,
    intrinsic::compute_intrinsic_sizes,
    pixels::{AutoOr, CSSPixels},
    style::{AlignItems, AlignSelf, FlexWrap, JustifyContent, StyleView},
};

struct ItemCalc<N> {
    node: N,
    basis: CSSPixels,
    grow: f32,
    shrink: f32,
    align_self: AlignSelf,
}

fn flex_basis_for<N: ElementNode>(ctx: &LayoutContext, item: &N, style: &N::Style, is_row: bool, container_main: CSSPixels) -> CSSPixels {
    if let Some(basis) = style.flex_basis() {
        return basis.resolve_against(container_main);
    }
    let main_style = if is_row { style.width() } else { style.height() };
    if let AutoOr::NotAuto(lp) = main_style {
        return lp.resolve_against(container_main);
    }
    compute_intrinsic_sizes(item, ctx.text_oracle, ctx.image_oracle).max_content
}

/// Lay out `node`'s flex items rooted at `(content_x, content_y)` within
/// `width`, and return the container's content height.
pub fn layout_flex_container<N: ElementNode>(
    ctx: &mut LayoutContext,
    node: &N,
    box_id: BoxId,
    content_x: CSSPixels,
    content_y: CSSPixels,
    width: CSSPixels,
) -> CSSPixels {
    let container_style = node.style();
    let direction = container_style.flex_direction();
    let wrap = container_style.flex_wrap();
    let is_row = direction.is_row();
    let wrap_reverse = wrap == FlexWrap::WrapReverse;
    let can_wrap = wrap != FlexWrap::NoWrap;

    let items: Vec<N> = node
        .children()
        .into_iter()
        .filter(|c| c.is_element() && !c.style().display().is_none())
        .collect();
    if items.is_empty() {
        return CSSPixels::ZERO;
    }

    let mut sorted = items;
    sorted.sort_by_key(|c| c.style().order());
    if direction.is_reversed() {
        sorted.reverse();
    }

    let calcs: Vec<ItemCalc<N>> = sorted
        .into_iter()
        .map(|n| {
            let style = n.style();
            let basis = flex_basis_for(ctx, &n, &style, is_row, width);
            let grow = style.flex_grow();
            let shrink = style.flex_shrink();
            let align_self = style.align_self();
            ItemCalc { node: n, basis, grow, shrink, align_self }
        })
        .collect();

    let mut lines: Vec<Vec<usize>> = Vec::new();
    if is_row && can_wrap {
        let mut current = Vec::new();
        let mut current_sum = CSSPixels::ZERO;
        for (i, c) in calcs.iter().enumerate() {
            if !current.is_empty() && current_sum + c.basis > width {
                lines.push(std::mem::take(&mut current));
                current_sum = CSSPixels::ZERO;
            }
            current.push(i);
            current_sum += c.basis;
        }
        if !current.is_empty() {
            lines.push(current);
        }
    } else {
        lines.push((0..calcs.len()).collect());
    }

    if wrap_reverse {
        lines.reverse();
    }

    let container_align_items = container_style.align_items();
    let mut cursor_cross = if is_row { content_y } else { content_x };
    let mut total_cross = CSSPixels::ZERO;

    for line in &lines {
        let sum_basis: CSSPixels = line.iter().map(|&i| calcs[i].basis).sum();
        let container_main = if is_row { width } else { sum_basis };
        let free = container_main - sum_basis;

        let mut final_main: Vec<CSSPixels> = line.iter().map(|&i| calcs[i].basis).collect();
        if free > CSSPixels::ZERO {
            let sum_grow: f32 = line.iter().map(|&i| calcs[i].grow).sum();
            if sum_grow > 0.0 {
                for (k, &i) in line.iter().enumerate() {
                    final_main[k] += free * (calcs[i].grow / sum_grow);
                }
            }
        } else if free < CSSPixels::ZERO {
            let weighted: f32 = line.iter().map(|&i| calcs[i].shrink * calcs[i].basis.0).sum();
            if weighted > 0.0 {
                for (k, &i) in line.iter().enumerate() {
                    let w = calcs[i].shrink * calcs[i].basis.0;
                    final_main[k] = (final_main[k] + free * (w / weighted)).clamp_non_negative();
                }
            }
        }

        let content_main_sum: CSSPixels = final_main.iter().copied().sum();
        let free_main = (container_main - content_main_sum).clamp_non_negative();
        let n = line.len();
        let (mut cursor_main, gap) = match container_style.justify_content() {
            JustifyContent::FlexStart => (if is_row { content_x } else { cursor_cross }, CSSPixels::ZERO),
            JustifyContent::FlexEnd => (if is_row { content_x + free_main } else { cursor_cross + free_main }, CSSPixels::ZERO),
            JustifyContent::Center => (
                if is_row { content_x + free_main / 2.0 } else { cursor_cross + free_main / 2.0 },
                CSSPixels::ZERO,
            ),
            JustifyContent::SpaceBetween => (
                if is_row { content_x } else { cursor_cross },
                if n > 1 { free_main / (n - 1) as f32 } else { CSSPixels::ZERO },
            ),
            JustifyContent::SpaceAround => {
                let g = if n > 0 { free_main / n as f32 } else { CSSPixels::ZERO };
                (if is_row { content_x + g / 2.0 } else { cursor_cross + g / 2.0 }, g)
            },
            JustifyContent::SpaceEvenly => {
                let g = free_main / (n + 1) as f32;
                (if is_row { content_x + g } else { cursor_cross + g }, g)
            },
        };

        let mut line_cross = CSSPixels::ZERO;
        let mut placed: Vec<(BoxId, CSSPixels)> = Vec::new();

        for (k, &i) in line.iter().enumerate() {
            let item_main = final_main[k];
            let (item_x, item_y, avail_w) = if is_row {
                (cursor_main, cursor_cross, item_main)
            } else {
                (cursor_cross, cursor_main, width)
            };

            if let Some(item_box) = block::layout_node(ctx, &calcs[i].node, item_x, item_y, avail_w, Some(box_id)) {
                {
                    let b = ctx.arena.get_mut(item_box);
                    if is_row {
                        b.width = item_main;
                    } else {
                        b.height = item_main;
                    }
                }
                let cross_size = {
                    let b = ctx.arena.get(item_box);
                    if is_row { b.outer_height() } else { b.outer_width() }
                };
                line_cross = line_cross.max(cross_size);
                placed.push((item_box, cross_size));
            }

            cursor_main += item_main + gap;
        }

        for (k, &i) in line.iter().enumerate() {
            let Some(&(item_box, cross_size)) = placed.get(k) else { continue };
            let align = match calcs[i].align_self {
                AlignSelf::Auto => container_align_items,
                AlignSelf::Stretch => AlignItems::Stretch,
                AlignSelf::FlexStart => AlignItems::FlexStart,
                AlignSelf::FlexEnd => AlignItems::FlexEnd,
                AlignSelf::Center => AlignItems::Center,
                AlignSelf::Baseline => AlignItems::Baseline,
            };
            let cross_is_auto = {
                let s = calcs[i].node.style();
                if is_row { s.height().is_auto() } else { s.width().is_auto() }
            };

            let offset = match align {
                AlignItems::Stretch => {
                    if cross_is_auto {
                        let b = ctx.arena.get_mut(item_box);
                        if is_row {
                            b.height = (line_cross - b.border.vertical_sum() - b.padding.vertical_sum()).clamp_non_negative();
                        } else {
                            b.width = (line_cross - b.border.horizontal_sum() - b.padding.horizontal_sum()).clamp_non_negative();
                        }
                    }
                    CSSPixels::ZERO
                },
                AlignItems::FlexEnd => line_cross - cross_size,
                AlignItems::Center => (line_cross - cross_size) / 2.0,
                AlignItems::FlexStart | AlignItems::Baseline => CSSPixels::ZERO,
            };

            if !offset.is_zero() {
                if is_row {
                    ctx.arena.shift_subtree(item_box, CSSPixels::ZERO, offset);
                } else {
                    ctx.arena.shift_subtree(item_box, offset, CSSPixels::ZERO);
                }
            }
        }

        cursor_cross += line_cross;
        total_cross += line_cross;
    }

    total_cross
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dom::NodeKind,
        fragment::LayoutBox,
        oracle::MonospaceOracle,
        pixels::Size,
        style::{Clear, Display, Float, FlexDirection, LengthPercentage, LengthPercentageAuto, Overflow, Position},
    };

    /// One style for both the container and its items — only the fields
    /// a given test cares about are set away from their defaults.
    #[derive(Clone, Default)]
    struct FlexStyle {
        display: Display,
        width: LengthPercentageAuto,
        grow: f32,
        shrink: f32,
        direction: FlexDirection,
        justify: JustifyContent,
    }

    impl StyleView for FlexStyle {
        fn display(&self) -> Display {
            self.display
        }
        fn position(&self) -> Position {
            Position::Static
        }
        fn float(&self) -> Float {
            Float::None
        }
        fn clear(&self) -> Clear {
            Clear::None
        }
        fn overflow(&self) -> Overflow {
            Overflow::Visible
        }
        fn margin_top(&self) -> LengthPercentageAuto {
            AutoOr::NotAuto(LengthPercentage::Length(CSSPixels::ZERO))
        }
        fn margin_right(&self) -> LengthPercentageAuto {
            AutoOr::NotAuto(LengthPercentage::Length(CSSPixels::ZERO))
        }
        fn margin_bottom(&self) -> LengthPercentageAuto {
            AutoOr::NotAuto(LengthPercentage::Length(CSSPixels::ZERO))
        }
        fn margin_left(&self) -> LengthPercentageAuto {
            AutoOr::NotAuto(LengthPercentage::Length(CSSPixels::ZERO))
        }
        fn padding_top(&self) -> LengthPercentage {
            LengthPercentage::Length(CSSPixels::ZERO)
        }
        fn padding_right(&self) -> LengthPercentage {
            LengthPercentage::Length(CSSPixels::ZERO)
        }
        fn padding_bottom(&self) -> LengthPercentage {
            LengthPercentage::Length(CSSPixels::ZERO)
        }
        fn padding_left(&self) -> LengthPercentage {
            LengthPercentage::Length(CSSPixels::ZERO)
        }
        fn border_top_width(&self) -> CSSPixels {
            CSSPixels::ZERO
        }
        fn border_right_width(&self) -> CSSPixels {
            CSSPixels::ZERO
        }
        fn border_bottom_width(&self) -> CSSPixels {
            CSSPixels::ZERO
        }
        fn border_left_width(&self) -> CSSPixels {
            CSSPixels::ZERO
        }
        fn width(&self) -> LengthPercentageAuto {
            self.width
        }
        fn height(&self) -> LengthPercentageAuto {
            AutoOr::Auto
        }
        fn font_size(&self) -> CSSPixels {
            CSSPixels(16.0)
        }
        fn flex_grow(&self) -> f32 {
            self.grow
        }
        fn flex_shrink(&self) -> f32 {
            self.shrink
        }
        fn flex_direction(&self) -> FlexDirection {
            self.direction
        }
        fn justify_content(&self) -> JustifyContent {
            self.justify
        }
    }

    #[derive(Clone)]
    enum FlexTestNode {
        Container(Vec<FlexTestNode>),
        Item(FlexStyle),
    }

    impl ElementNode for FlexTestNode {
        type Style = FlexStyle;
        fn kind(&self) -> NodeKind {
            NodeKind::Element
        }
        fn tag_name(&self) -> &str {
            "div"
        }
        fn attribute(&self, _name: &str) -> Option<&str> {
            None
        }
        fn text_content(&self) -> Option<&str> {
            None
        }
        fn children(&self) -> Vec<Self> {
            match self {
                Self::Container(items) => items.clone(),
                Self::Item(_) => Vec::new(),
            }
        }
        fn style(&self) -> Self::Style {
            match self {
                Self::Container(_) => FlexStyle { display: Display::Flex, ..Default::default() },
                Self::Item(s) => s.clone(),
            }
        }
    }

    fn item(width: f32, grow: f32, shrink: f32) -> FlexTestNode {
        FlexTestNode::Item(FlexStyle {
            display: Display::Block,
            width: AutoOr::NotAuto(LengthPercentage::Length(CSSPixels(width))),
            grow,
            shrink,
            ..Default::default()
        })
    }

    #[test]
    fn grow_distributes_leftover_width_by_factor() {
        let oracle = MonospaceOracle;
        let mut ctx = LayoutContext::new(&oracle, None, Size::new(CSSPixels(800.0), CSSPixels(600.0)), CSSPixels::ZERO);
        let container_box = ctx.arena.alloc(LayoutBox::new("div"));

        let container = FlexTestNode::Container(vec![item(50.0, 1.0, 1.0), item(50.0, 3.0, 1.0)]);

        layout_flex_container(&mut ctx, &container, container_box, CSSPixels::ZERO, CSSPixels::ZERO, CSSPixels(300.0));

        let children = ctx.arena.get(container_box).children.clone();
        assert_eq!(children.len(), 2);
        // Free space = 300 - 100 = 200, split 1:3 -> +50 and +150.
        assert_eq!(ctx.arena.get(children[0]).width, CSSPixels(100.0));
        assert_eq!(ctx.arena.get(children[1]).width, CSSPixels(200.0));
    }

    #[test]
    fn shrink_is_weighted_by_basis() {
        let oracle = MonospaceOracle;
        let mut ctx = LayoutContext::new(&oracle, None, Size::new(CSSPixels(800.0), CSSPixels(600.0)), CSSPixels::ZERO);
        let container_box = ctx.arena.alloc(LayoutBox::new("div"));

        // Total basis 300 into a 200-wide container: 100 to shed, split
        // proportionally to (shrink * basis): 100 and 200.
        let container = FlexTestNode::Container(vec![item(100.0, 0.0, 1.0), item(200.0, 0.0, 1.0)]);

        layout_flex_container(&mut ctx, &container, container_box, CSSPixels::ZERO, CSSPixels::ZERO, CSSPixels(200.0));

        let children = ctx.arena.get(container_box).children.clone();
        let w0 = ctx.arena.get(children[0]).width;
        let w1 = ctx.arena.get(children[1]).width;
        assert!((w0.0 - 66.667).abs() < 0.1);
        assert!((w1.0 - 133.333).abs() < 0.1);
    }

    #[test]
    fn empty_container_has_zero_height() {
        let oracle = MonospaceOracle;
        let mut ctx = LayoutContext::new(&oracle, None, Size::new(CSSPixels(800.0), CSSPixels(600.0)), CSSPixels::ZERO);
        let container_box = ctx.arena.alloc(LayoutBox::new("div"));
        let container = FlexTestNode::Container(Vec::new());
        let height = layout_flex_container(&mut ctx, &container, container_box, CSSPixels::ZERO, CSSPixels::ZERO, CSSPixels(300.0));
        assert_eq!(height, CSSPixels::ZERO);
    }
}
