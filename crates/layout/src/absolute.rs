//! Absolute and fixed positioning (`spec.md` §4.6). Boxes with
//! `position: absolute` or `position: fixed` are sized and laid out
//! like any other box during the main recursive pass (so their own
//! `width`/`height` are known), but their *final* `(x, y)` can only be
//! computed once the containing block's geometry is settled — which,
//! for an ancestor still partway through sizing its own auto-height
//! content, means waiting until the whole document has been built.
//! `layout_node` therefore records a [`PendingAbsolute`] instead of
//! positioning the box immediately, and [`resolve_pending_absolutes`]
//! walks the finished tree once at the end of `Engine::layout`.

use crate::{
    context::LayoutContext,
    fragment::BoxId,
    pixels::{AutoOr, CSSPixels, MaybeAuto},
};

#[derive(Clone, Copy, Debug)]
pub struct PendingAbsolute {
    pub box_id: BoxId,
    pub is_fixed: bool,
    pub left: Option<CSSPixels>,
    pub right: Option<CSSPixels>,
    pub top: Option<CSSPixels>,
    pub bottom: Option<CSSPixels>,
    pub margin_left: MaybeAuto,
    pub margin_right: MaybeAuto,
    pub margin_top: MaybeAuto,
    pub margin_bottom: MaybeAuto,
}

/// One axis of the `left`/`right`/`margin-left`/`margin-right`
/// resolution (and, by the spec's stated symmetry, the vertical axis
/// too).
fn resolve_axis(
    start: Option<CSSPixels>,
    end: Option<CSSPixels>,
    margin_start: MaybeAuto,
    margin_end: MaybeAuto,
    used_size: CSSPixels,
    cb_start: CSSPixels,
    cb_size: CSSPixels,
) -> (CSSPixels, CSSPixels, CSSPixels) {
    match (start, end, margin_start.is_auto(), margin_end.is_auto()) {
        (Some(start), Some(end), true, true) => {
            let residue = (cb_size - start - end - used_size).clamp_non_negative();
            let half = residue / 2.0;
            (cb_start + start + half, half, half)
        },
        (Some(start), _, _, _) => {
            let margin_start = margin_start.unwrap_or_default();
            let margin_end = margin_end.unwrap_or_default();
            (cb_start + start + margin_start, margin_start, margin_end)
        },
        (None, Some(end), _, _) => {
            let margin_start = margin_start.unwrap_or_default();
            let margin_end = margin_end.unwrap_or_default();
            let x = cb_start + cb_size - end - margin_end - used_size;
            (x, margin_start, margin_end)
        },
        (None, None, _, _) => {
            let margin_start = margin_start.unwrap_or_default();
            let margin_end = margin_end.unwrap_or_default();
            (cb_start + margin_start, margin_start, margin_end)
        },
    }
}

/// Resolve every absolutely/fixed positioned box registered during the
/// main layout pass, now that the box tree (and therefore every
/// ancestor's final geometry) is complete.
pub fn resolve_pending_absolutes(ctx: &mut LayoutContext) {
    let pending = std::mem::take(&mut ctx.pending_absolute);
    for p in pending {
        let (cb_x, cb_y, cb_width, cb_height) = containing_block_rect(ctx, p.box_id, p.is_fixed);

        let b = ctx.arena.get(p.box_id);
        // `spec.md` §4.6's offset/auto-margin formulas are stated in
        // terms of the border box, but `LayoutBox::width`/`height` are
        // content-box only (`spec.md` §3); add border+padding back in.
        let used_width = b.width + b.border.horizontal_sum() + b.padding.horizontal_sum();
        let used_height = b.height + b.border.vertical_sum() + b.padding.vertical_sum();

        let (x, margin_l, margin_r) = resolve_axis(
            p.left,
            p.right,
            p.margin_left,
            p.margin_right,
            used_width,
            cb_x,
            cb_width,
        );
        let (y, margin_t, margin_b) = resolve_axis(
            p.top,
            p.bottom,
            p.margin_top,
            p.margin_bottom,
            used_height,
            cb_y,
            cb_height,
        );

        let b = ctx.arena.get(p.box_id);
        let dx = x - b.x;
        let dy = y - b.y;

        ctx.arena.shift_subtree(p.box_id, dx, dy);
        let b = ctx.arena.get_mut(p.box_id);
        b.margin.left = margin_l;
        b.margin.right = margin_r;
        b.margin.top = margin_t;
        b.margin.bottom = margin_b;
    }
}

/// The containing block for `box_id`: the nearest positioned ancestor's
/// padding box for `position: absolute`, or the viewport (shifted by the
/// scroll offset, so the box stays put on screen as the document
/// scrolls) for `position: fixed`.
fn containing_block_rect(
    ctx: &LayoutContext,
    box_id: BoxId,
    is_fixed: bool,
) -> (CSSPixels, CSSPixels, CSSPixels, CSSPixels) {
    if is_fixed {
        return (CSSPixels::ZERO, ctx.scroll_y, ctx.viewport.width, ctx.viewport.height);
    }

    let mut current = ctx.arena.get(box_id).parent;
    while let Some(id) = current {
        let ancestor = ctx.arena.get(id);
        if ancestor.position.is_positioned() {
            let padding_x = ancestor.x + ancestor.border.left;
            let padding_y = ancestor.y + ancestor.border.top;
            let padding_width = ancestor.padding.horizontal_sum() + ancestor.width;
            let padding_height = ancestor.padding.vertical_sum() + ancestor.height;
            return (padding_x, padding_y, padding_width, padding_height);
        }
        current = ancestor.parent;
    }

    // No positioned ancestor: fall back to the initial containing block.
    (CSSPixels::ZERO, CSSPixels::ZERO, ctx.viewport.width, ctx.viewport.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fragment::LayoutBox,
        oracle::MonospaceOracle,
        pixels::{Sides, Size},
        style::Position,
    };

    #[test]
    fn centers_when_offsets_and_margins_are_auto() {
        let oracle = MonospaceOracle;
        let mut ctx = LayoutContext::new(&oracle, None, Size::new(CSSPixels(600.0), CSSPixels(400.0)), CSSPixels::ZERO);
        let mut b = LayoutBox::new("div");
        b.width = CSSPixels(200.0);
        b.position = Position::Absolute;
        let id = ctx.arena.alloc(b);

        ctx.pending_absolute.push(PendingAbsolute {
            box_id: id,
            is_fixed: false,
            left: Some(CSSPixels::ZERO),
            right: Some(CSSPixels::ZERO),
            top: None,
            bottom: None,
            margin_left: AutoOr::Auto,
            margin_right: AutoOr::Auto,
            margin_top: AutoOr::Auto,
            margin_bottom: AutoOr::Auto,
        });

        resolve_pending_absolutes(&mut ctx);

        let b = ctx.arena.get(id);
        assert_eq!(b.x, CSSPixels(200.0));
        assert_eq!(b.margin.left, CSSPixels(200.0));
        assert_eq!(b.margin.right, CSSPixels(200.0));
    }

    #[test]
    fn centering_accounts_for_border_and_padding_in_used_width() {
        let oracle = MonospaceOracle;
        let mut ctx = LayoutContext::new(&oracle, None, Size::new(CSSPixels(600.0), CSSPixels(400.0)), CSSPixels::ZERO);
        let mut b = LayoutBox::new("div");
        b.width = CSSPixels(200.0);
        b.border = Sides::all(CSSPixels(5.0));
        b.padding = Sides::all(CSSPixels(10.0));
        b.position = Position::Absolute;
        let id = ctx.arena.alloc(b);

        ctx.pending_absolute.push(PendingAbsolute {
            box_id: id,
            is_fixed: false,
            left: Some(CSSPixels::ZERO),
            right: Some(CSSPixels::ZERO),
            top: None,
            bottom: None,
            margin_left: AutoOr::Auto,
            margin_right: AutoOr::Auto,
            margin_top: AutoOr::Auto,
            margin_bottom: AutoOr::Auto,
        });

        resolve_pending_absolutes(&mut ctx);

        // used_width = 200 (content) + 10 (border) + 20 (padding) = 230;
        // residue = 600 - 0 - 0 - 230 = 370, split evenly either side.
        let b = ctx.arena.get(id);
        assert_eq!(b.margin.left, CSSPixels(185.0));
        assert_eq!(b.margin.right, CSSPixels(185.0));
        assert_eq!(b.x, CSSPixels(185.0));
    }

    #[test]
    fn shifting_an_absolute_box_moves_its_descendants_by_the_same_delta() {
        let oracle = MonospaceOracle;
        let mut ctx = LayoutContext::new(&oracle, None, Size::new(CSSPixels(600.0), CSSPixels(400.0)), CSSPixels::ZERO);
        let mut parent = LayoutBox::new("div");
        parent.position = Position::Absolute;
        parent.x = CSSPixels(10.0);
        parent.y = CSSPixels(10.0);
        let parent_id = ctx.arena.alloc(parent);
        let mut child = LayoutBox::new("span");
        child.x = CSSPixels(20.0);
        child.y = CSSPixels(20.0);
        let child_id = ctx.arena.alloc(child);
        ctx.arena.add_child(parent_id, child_id);

        ctx.pending_absolute.push(PendingAbsolute {
            box_id: parent_id,
            is_fixed: false,
            left: Some(CSSPixels(50.0)),
            right: None,
            top: Some(CSSPixels(30.0)),
            bottom: None,
            margin_left: AutoOr::NotAuto(CSSPixels::ZERO),
            margin_right: AutoOr::NotAuto(CSSPixels::ZERO),
            margin_top: AutoOr::NotAuto(CSSPixels::ZERO),
            margin_bottom: AutoOr::NotAuto(CSSPixels::ZERO),
        });

        resolve_pending_absolutes(&mut ctx);

        let parent = ctx.arena.get(parent_id);
        assert_eq!(parent.x, CSSPixels(50.0));
        assert_eq!(parent.y, CSSPixels(30.0));
        let child = ctx.arena.get(child_id);
        // Delta was (40, 20); child started at (20, 20).
        assert_eq!(child.x, CSSPixels(60.0));
        assert_eq!(child.y, CSSPixels(40.0));
    }
}
