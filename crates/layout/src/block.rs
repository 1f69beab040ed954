//! The block formatter: `layout_node`, the recursive entry point every
//! other formatter (inline, table, flex) eventually calls back into for
//! its block-level and atomic-inline-level children (`spec.md` §4.1).

use crate::{
    absolute::PendingAbsolute,
    context::LayoutContext,
    dom::ElementNode,
    flex,
    float_ctx::FloatRecord,
    fragment::{BoxId, LayoutBox},
    intrinsic::{compute_intrinsic_sizes, IntrinsicSizes},
    margin::{self, PendingMargins},
    oracle::image_size_or_placeholder,
    pixels::{AutoOr, CSSPixels, MaybeAuto, Sides},
    pseudo,
    style::{BoxSizing, Display, LengthPercentage, StyleView},
    table,
};

/// The public recursive entry point. Lays out `node` as a box rooted at
/// `(x, y)` with `available_width` to work with, attaches it to `parent`
/// in the arena if given, and returns the new box's id (or `None` for
/// `display: none` and for text nodes, which the inline formatter
/// handles directly).
pub fn layout_node<N: ElementNode>(
    ctx: &mut LayoutContext,
    node: &N,
    x: CSSPixels,
    y: CSSPixels,
    available_width: CSSPixels,
    parent: Option<BoxId>,
) -> Option<BoxId> {
    if node.is_text() {
        return None;
    }

    let style = node.style();
    let mut display = style.display();
    if display.is_none() {
        log::trace!("skipping display:none element <{}>", node.tag_name());
        return None;
    }

    let is_floated = style.float() != crate::style::Float::None;
    let is_abs = style.position().is_absolutely_positioned();
    if is_floated || is_abs {
        display = display.blockify();
    }
    let replaced_src = node.replaced_image_source();
    if replaced_src.is_some() && display == Display::Block {
        display = Display::InlineBlock;
    }
    display = display.blockify();
    if display.is_table_part() && display != Display::Table {
        display = Display::Block;
    }

    let is_body = node.tag_name() == "body";

    let border = crate::style::used_border_widths(&style);
    let padding = Sides {
        top: style.padding_top().resolve_against(available_width),
        right: style.padding_right().resolve_against(available_width),
        bottom: style.padding_bottom().resolve_against(available_width),
        left: style.padding_left().resolve_against(available_width),
    };
    let margin_raw: Sides<MaybeAuto> = Sides {
        top: style.margin_top().map(|lp| lp.resolve_against(available_width)),
        right: style.margin_right().map(|lp| lp.resolve_against(available_width)),
        bottom: style.margin_bottom().map(|lp| lp.resolve_against(available_width)),
        left: style.margin_left().map(|lp| lp.resolve_against(available_width)),
    };

    let edges_h = border.horizontal_sum() + padding.horizontal_sum();

    let mut label = node.tag_name().to_string();
    if label.is_empty() {
        label = "anonymous".to_string();
    }
    let mut b = LayoutBox::new(label);
    b.border = border;
    b.padding = padding;
    b.position = style.position();
    b.z_index = style.z_index().value();
    b.visible = matches!(style.visibility(), crate::style::Visibility::Visible);
    b.opacity = style.opacity();
    b.has_transform = style.has_transform();

    let box_id = ctx.arena.alloc(b);
    if let Some(parent_id) = parent {
        ctx.arena.add_child(parent_id, box_id);
    }

    if let Some(src) = replaced_src {
        let (intrinsic_w, intrinsic_h) = ctx
            .image_oracle
            .map(|o| image_size_or_placeholder(o, src))
            .unwrap_or((CSSPixels(100.0), CSSPixels(100.0)));
        let width = match style.width() {
            AutoOr::NotAuto(LengthPercentage::Length(w)) => w,
            AutoOr::NotAuto(LengthPercentage::Percentage(p)) => available_width * p,
            AutoOr::Auto => intrinsic_w,
        };
        let height = match style.height() {
            AutoOr::NotAuto(LengthPercentage::Length(h)) => h,
            AutoOr::NotAuto(LengthPercentage::Percentage(p)) => intrinsic_h * p,
            AutoOr::Auto => intrinsic_h,
        };
        let (margin_l, margin_r) = (margin_raw.left.unwrap_or_default(), margin_raw.right.unwrap_or_default());
        let bx = ctx.arena.get_mut(box_id);
        bx.width = width.clamp_non_negative();
        bx.height = height.clamp_non_negative();
        bx.x = x + margin_l + border.left + padding.left;
        bx.y = y + margin_raw.top.unwrap_or_default() + border.top + padding.top;
        bx.margin = Sides {
            top: margin_raw.top.unwrap_or_default(),
            right: margin_r,
            bottom: margin_raw.bottom.unwrap_or_default(),
            left: margin_l,
        };
        bx.image_src = Some(src.to_string());
        finalize_positioned(ctx, box_id, &style, is_floated, is_abs, x, y, available_width);
        return Some(box_id);
    }

    if display.is_flex() {
        let (width, margin_l, margin_r) =
            resolve_block_width_and_margins(&style, style.width(), margin_raw.left, margin_raw.right, edges_h, available_width);
        {
            let bx = ctx.arena.get_mut(box_id);
            bx.width = width;
            bx.x = x + margin_l + border.left + padding.left;
            bx.y = y + margin_raw.top.unwrap_or_default() + border.top + padding.top;
            bx.margin.left = margin_l;
            bx.margin.right = margin_r;
            bx.margin.top = margin_raw.top.unwrap_or_default();
            bx.margin.bottom = margin_raw.bottom.unwrap_or_default();
        }
        let content_x = ctx.arena.get(box_id).content_x();
        let content_y = ctx.arena.get(box_id).content_y();
        let height = flex::layout_flex_container(ctx, node, box_id, content_x, content_y, width);
        let min_h = style
            .min_height()
            .map(|lp| lp.resolve_against(CSSPixels::ZERO))
            .unwrap_or(CSSPixels::ZERO);
        ctx.arena.get_mut(box_id).height = height.max(min_h);
        finalize_positioned(ctx, box_id, &style, is_floated, is_abs, x, y, available_width);
        return Some(box_id);
    }

    if display == Display::Table {
        let (width, margin_l, margin_r) =
            resolve_block_width_and_margins(&style, style.width(), margin_raw.left, margin_raw.right, edges_h, available_width);
        {
            let bx = ctx.arena.get_mut(box_id);
            bx.width = width;
            bx.x = x + margin_l + border.left + padding.left;
            bx.y = y + margin_raw.top.unwrap_or_default() + border.top + padding.top;
            bx.margin.left = margin_l;
            bx.margin.right = margin_r;
            bx.margin.top = margin_raw.top.unwrap_or_default();
            bx.margin.bottom = margin_raw.bottom.unwrap_or_default();
        }
        let content_x = ctx.arena.get(box_id).content_x();
        let content_y = ctx.arena.get(box_id).content_y();
        let height = table::layout_table(ctx, node, box_id, content_x, content_y, width);
        ctx.arena.get_mut(box_id).height = height;
        finalize_positioned(ctx, box_id, &style, is_floated, is_abs, x, y, available_width);
        return Some(box_id);
    }

    // Ordinary block / inline-block / list-item container.
    let is_shrink_to_fit = is_floated || is_abs || display == Display::InlineBlock;
    let intrinsic = if is_shrink_to_fit && style.width().is_auto() {
        Some(compute_intrinsic_sizes(node, ctx.text_oracle, ctx.image_oracle))
    } else {
        None
    };

    let width = if let Some(sizes) = &intrinsic {
        shrink_to_fit_width(sizes, available_width - edges_h).clamp_non_negative()
    } else {
        let (w, _, _) =
            resolve_block_width_and_margins(&style, style.width(), margin_raw.left, margin_raw.right, edges_h, available_width);
        w
    };
    let (margin_l, margin_r) = if intrinsic.is_some() {
        (margin_raw.left.unwrap_or_default(), margin_raw.right.unwrap_or_default())
    } else {
        let (_, ml, mr) =
            resolve_block_width_and_margins(&style, style.width(), margin_raw.left, margin_raw.right, edges_h, available_width);
        (ml, mr)
    };

    let width = clamp_width(&style, width, available_width, edges_h);

    {
        let bx = ctx.arena.get_mut(box_id);
        bx.width = width;
        bx.x = x + margin_l + border.left + padding.left;
        bx.y = y + margin_raw.top.unwrap_or_default() + border.top + padding.top;
        bx.margin = Sides {
            top: margin_raw.top.unwrap_or_default(),
            right: margin_r,
            bottom: margin_raw.bottom.unwrap_or_default(),
            left: margin_l,
        };
    }

    // `spec.md` §4.1 step 18 / §4.5 "Parent-child collapse (top)": a
    // participating box with no top border/padding absorbs its first
    // in-flow block child's top margin into its own. The child is then
    // laid out flush with the content edge (its margin no longer opens a
    // gap below it) while this box's own border-box top edge moves down
    // by the amount the combined margin exceeds this box's own.
    // `absorb_first_top_margin` is threaded through to
    // `layout_children_in_flow` so the child's own margin isn't *also*
    // applied when it lays out — otherwise the gap would count twice.
    let mut absorb_first_top_margin = false;
    if margin::parent_absorbs_child_top_margin(&style, is_body) {
        if let Some(child_style) = first_in_flow_block_child(node) {
            if margin::participates_in_collapsing(&child_style, false) && child_style.clear() == crate::style::Clear::None {
                let own_margin_top = margin_raw.top.unwrap_or_default();
                let child_margin_top = child_style
                    .margin_top()
                    .map(|lp| lp.resolve_against(width))
                    .unwrap_or_default();
                let combined = margin::combine_two(own_margin_top, child_margin_top);
                let delta = combined - own_margin_top;
                let bx = ctx.arena.get_mut(box_id);
                bx.y += delta;
                bx.margin.top = combined;
                absorb_first_top_margin = true;
            }
        }
    }

    let counter_pops = apply_counters(ctx, &style);

    // `display:list-item` implicitly increments the `list-item` counter
    // once per box, independent of any author `counter-increment` —
    // this is UA-stylesheet behavior, not something a cascade upstream
    // of this crate can express via the `counter-increment` property
    // itself (`spec.md` §4.1 step 13).
    if display == Display::ListItem {
        ctx.counters.increment("list-item", 1);
    }

    let content_x = ctx.arena.get(box_id).content_x();
    let content_width = width;
    let mut cursor_y = ctx.arena.get(box_id).content_y();

    let before_content = node
        .before_style()
        .and_then(|s| s.content().map(|atoms| (s, atoms)));
    if let Some((before_style, atoms)) = before_content {
        let pseudo_pops = apply_counters(ctx, &before_style);
        let generated = pseudo::resolve_content(&atoms, node, &ctx.counters, &mut 0);
        cursor_y = layout_generated_run(ctx, box_id, &before_style, &generated, content_x, cursor_y, content_width);
        for name in &pseudo_pops {
            ctx.counters.pop_scope(name);
        }
    }

    if display == Display::ListItem {
        if let Some(marker) = pseudo::list_marker_text(&style, &ctx.counters, "list-item") {
            let (mw, mh) = ctx.text_oracle.measure_text(&marker, style.font_size(), false);
            let mut marker_box = LayoutBox::new("::marker");
            marker_box.width = mw;
            marker_box.height = mh;
            marker_box.x = content_x;
            marker_box.y = cursor_y;
            marker_box.pseudo_text = Some(marker);
            let marker_id = ctx.arena.alloc(marker_box);
            ctx.arena.add_child(box_id, marker_id);
        }
    }

    let (children_bottom, mut trailing_margin) = layout_children_in_flow(
        ctx,
        node,
        box_id,
        content_x,
        cursor_y,
        content_width,
        is_body,
        absorb_first_top_margin,
    );
    cursor_y = children_bottom;

    let after_content = node.after_style().and_then(|s| s.content().map(|atoms| (s, atoms)));
    if let Some((after_style, atoms)) = after_content {
        // The `::after` pseudo-element follows the last in-flow child, so
        // any margin that was still waiting to escape through this box's
        // own bottom edge instead becomes real space in front of it.
        cursor_y += trailing_margin;
        trailing_margin = CSSPixels::ZERO;
        let pseudo_pops = apply_counters(ctx, &after_style);
        let generated = pseudo::resolve_content(&atoms, node, &ctx.counters, &mut 0);
        cursor_y = layout_generated_run(ctx, box_id, &after_style, &generated, content_x, cursor_y, content_width);
        for name in &pseudo_pops {
            ctx.counters.pop_scope(name);
        }
    }

    for name in &counter_pops {
        ctx.counters.pop_scope(name);
    }

    // `spec.md` §4.1 step 19 / §4.5 "Parent-child collapse (bottom)": a
    // participating, auto-height box with no bottom border/padding
    // absorbs its last in-flow child's bottom margin into its own,
    // excluding it from the auto-height calculation.
    let bottom_eligible =
        margin::parent_absorbs_child_bottom_margin(&style, is_body, matches!(style.height(), AutoOr::Auto));

    let content_top = ctx.arena.get(box_id).content_y();
    let auto_height = if bottom_eligible {
        (cursor_y - content_top).clamp_non_negative()
    } else {
        (cursor_y + trailing_margin - content_top).clamp_non_negative()
    };
    let height = match style.height() {
        AutoOr::NotAuto(LengthPercentage::Length(h)) => h,
        AutoOr::NotAuto(LengthPercentage::Percentage(p)) => available_width * p,
        AutoOr::Auto => auto_height,
    };
    let edges_v = border.vertical_sum() + padding.vertical_sum();
    let height = clamp_height(&style, height, edges_v);
    ctx.arena.get_mut(box_id).height = height;

    if bottom_eligible {
        let bx = ctx.arena.get_mut(box_id);
        bx.margin.bottom = margin::combine_two(bx.margin.bottom, trailing_margin);
    }

    finalize_positioned(ctx, box_id, &style, is_floated, is_abs, x, y, available_width);

    Some(box_id)
}

/// Supplemented feature #3 (`box-sizing: border-box`, `SPEC_FULL.md`):
/// `max-width`/`min-width`/explicit `width` are resolved against the
/// border box under `border-box`, so the content-box value this engine
/// otherwise works in is that resolved length minus the horizontal
/// border+padding. `content-box` (the CSS initial value) is the identity.
fn border_box_to_content_width(style: &impl StyleView, resolved: CSSPixels, edges_h: CSSPixels) -> CSSPixels {
    if style.box_sizing() == BoxSizing::BorderBox {
        (resolved - edges_h).clamp_non_negative()
    } else {
        resolved
    }
}

/// Vertical counterpart of [`border_box_to_content_width`] for
/// `height`/`max-height`/`min-height`.
fn border_box_to_content_height(style: &impl StyleView, resolved: CSSPixels, edges_v: CSSPixels) -> CSSPixels {
    if style.box_sizing() == BoxSizing::BorderBox {
        (resolved - edges_v).clamp_non_negative()
    } else {
        resolved
    }
}

fn clamp_width(style: &impl StyleView, width: CSSPixels, percent_base: CSSPixels, edges_h: CSSPixels) -> CSSPixels {
    let mut w = width;
    if let Some(max) = style.max_width() {
        w = w.min(border_box_to_content_width(style, max.resolve_against(percent_base), edges_h));
    }
    if let Some(min) = style.min_width() {
        w = w.max(border_box_to_content_width(style, min.resolve_against(percent_base), edges_h));
    }
    w.clamp_non_negative()
}

fn clamp_height(style: &impl StyleView, height: CSSPixels, edges_v: CSSPixels) -> CSSPixels {
    let mut h = height;
    if let Some(max) = style.max_height() {
        h = h.min(border_box_to_content_height(style, max.resolve_against(CSSPixels::ZERO), edges_v));
    }
    if let Some(min) = style.min_height() {
        h = h.max(border_box_to_content_height(style, min.resolve_against(CSSPixels::ZERO), edges_v));
    }
    h.clamp_non_negative()
}

/// The classic CSS 2.1 §10.3.3 block-width resolution: exactly the
/// under-determined component (`width`, or an auto margin) absorbs the
/// slack; centering falls out when both margins are auto. `box_sizing`
/// (supplemented feature #3) converts an explicit `width` from border-box
/// to the content-box value the rest of this resolution works in before
/// the margin math runs; `width:auto` is unaffected since an auto width
/// already resolves directly to the content box.
fn resolve_block_width_and_margins(
    style: &impl StyleView,
    width: crate::style::LengthPercentageAuto,
    margin_left: MaybeAuto,
    margin_right: MaybeAuto,
    edges_h: CSSPixels,
    available_width: CSSPixels,
) -> (CSSPixels, CSSPixels, CSSPixels) {
    match width {
        AutoOr::Auto => {
            let ml = margin_left.unwrap_or_default();
            let mr = margin_right.unwrap_or_default();
            let w = (available_width - edges_h - ml - mr).clamp_non_negative();
            (w, ml, mr)
        },
        AutoOr::NotAuto(lp) => {
            let resolved = lp.resolve_against(available_width).clamp_non_negative();
            let w = border_box_to_content_width(style, resolved, edges_h);
            match (margin_left, margin_right) {
                (AutoOr::Auto, AutoOr::Auto) => {
                    let remainder = (available_width - edges_h - w).clamp_non_negative();
                    let half = remainder / 2.0;
                    (w, half, half)
                },
                (AutoOr::Auto, AutoOr::NotAuto(mr)) => {
                    let ml = (available_width - edges_h - w - mr).clamp_non_negative();
                    (w, ml, mr)
                },
                (AutoOr::NotAuto(ml), _) => {
                    // Also covers the over-constrained "all three given"
                    // case: margin-right is always recomputed from the
                    // other three (ltr default, CSS 2.1 §10.3.3).
                    let mr = (available_width - edges_h - w - ml).clamp_non_negative();
                    (w, ml, mr)
                },
            }
        },
    }
}

fn shrink_to_fit_width(sizes: &IntrinsicSizes, available: CSSPixels) -> CSSPixels {
    available.clamp_non_negative().min(sizes.max_content).max(sizes.min_content)
}

/// The first in-flow child style eligible to collapse with the parent's
/// own top margin (`spec.md` §4.5 "Parent-child collapse (top)"): skips
/// `display:none` and out-of-flow (floated, absolutely positioned)
/// children, which are transparent to adjoining-margin checks, but stops
/// (no collapse) at the first text node or inline-level/`<br>` child,
/// since a line box there would separate the parent's top edge from any
/// block descendant's margin.
fn first_in_flow_block_child<N: ElementNode>(node: &N) -> Option<N::Style> {
    for child in node.children() {
        if child.is_text() {
            return None;
        }
        let child_style = child.style();
        if child_style.display().is_none() {
            continue;
        }
        if child_style.position().is_absolutely_positioned() || child_style.float() != crate::style::Float::None {
            continue;
        }
        if child_style.display().is_inline_level() || child.is_line_break() {
            return None;
        }
        return Some(child_style);
    }
    None
}

fn apply_counters(ctx: &mut LayoutContext, style: &impl StyleView) -> Vec<String> {
    let mut reset_names = Vec::new();
    for (name, value) in style.counter_reset() {
        ctx.counters.reset(&name, value);
        reset_names.push(name);
    }
    for (name, delta) in style.counter_increment() {
        ctx.counters.increment(&name, delta);
    }
    reset_names
}

fn layout_generated_run<N: ElementNode>(
    ctx: &mut LayoutContext,
    parent_box: BoxId,
    pseudo_style: &N::Style,
    generated: &pseudo::GeneratedContent,
    x: CSSPixels,
    y: CSSPixels,
    available_width: CSSPixels,
) -> CSSPixels {
    let font_size = pseudo_style.font_size();
    let bold = pseudo_style.font_bold();
    let mut cursor_x = x;
    let mut max_height = CSSPixels::ZERO;

    if !generated.pre_image.is_empty() {
        let (w, h) = ctx.text_oracle.measure_text(&generated.pre_image, font_size, bold);
        let mut text_box = LayoutBox::new("::before-text");
        text_box.width = w;
        text_box.height = h;
        text_box.x = cursor_x;
        text_box.y = y;
        text_box.pseudo_text = Some(generated.pre_image.clone());
        let id = ctx.arena.alloc(text_box);
        ctx.arena.add_child(parent_box, id);
        cursor_x += w;
        max_height = max_height.max(h);
    }

    for src in &generated.images {
        let (w, h) = ctx
            .image_oracle
            .map(|o| image_size_or_placeholder(o, src))
            .unwrap_or((CSSPixels(100.0), CSSPixels(100.0)));
        let mut image_box = LayoutBox::new("::before-image");
        image_box.width = w;
        image_box.height = h;
        image_box.x = cursor_x;
        image_box.y = y;
        image_box.image_src = Some(src.clone());
        let id = ctx.arena.alloc(image_box);
        ctx.arena.add_child(parent_box, id);
        cursor_x += w;
        max_height = max_height.max(h);
    }

    if !generated.post_image.is_empty() {
        let (w, h) = ctx.text_oracle.measure_text(&generated.post_image, font_size, bold);
        let mut text_box = LayoutBox::new("::after-text");
        text_box.width = w;
        text_box.height = h;
        text_box.x = cursor_x;
        text_box.y = y;
        text_box.pseudo_text = Some(generated.post_image.clone());
        let id = ctx.arena.alloc(text_box);
        ctx.arena.add_child(parent_box, id);
        max_height = max_height.max(h);
    }

    let _ = available_width;
    y + max_height
}

/// Walk `node`'s in-flow children, dispatching runs of inline content to
/// `inline.rs` and block-level children back to `layout_node`, combining
/// margins between successive participating block siblings per
/// `spec.md` §4.5. `parent_absorbs_first_top_margin` is set by the
/// caller when it already folded the first in-flow child's top margin
/// into its own (§4.5 "Parent-child collapse (top)"); when set, that
/// child's own top margin is treated as zero here instead of also
/// opening a gap below the parent's content edge.
///
/// Returns `(content_bottom, trailing_margin)`: `content_bottom` is the
/// bottom edge of in-flow content excluding any margin that might still
/// escape through the parent's own bottom edge (§4.5 "Parent-child
/// collapse (bottom)"); `trailing_margin` is that escapable amount (zero
/// if the last in-flow child doesn't participate in collapsing, or there
/// was no in-flow child at all). The caller decides whether to fold
/// `trailing_margin` into its own `margin.bottom` (and leave it out of
/// auto-height) or add it to `content_bottom` as ordinary content space.
fn layout_children_in_flow<N: ElementNode>(
    ctx: &mut LayoutContext,
    node: &N,
    parent_box: BoxId,
    content_x: CSSPixels,
    start_y: CSSPixels,
    content_width: CSSPixels,
    is_body: bool,
    mut parent_absorbs_first_top_margin: bool,
) -> (CSSPixels, CSSPixels) {
    let _ = is_body;
    let inherited_font_size = node.style().font_size();
    let inherited_bold = node.style().font_bold();
    let inherited_white_space = node.style().white_space();
    let text_align = node.style().text_align();

    // `flow_y` tracks the border-box bottom edge of the previous
    // in-flow sibling (margin not yet applied); `prev_bottom_margin` is
    // that sibling's own bottom margin, still waiting to be combined
    // with the next sibling's top margin (or, if it turns out to be the
    // last in-flow child, to possibly escape through the parent's own
    // bottom edge — see `prev_participates` below). Parent-top
    // collapsing is handled by the caller before this function even
    // runs, by adjusting the parent box's own `y`/`margin.top` and
    // starting the whole traversal already flush with the parent's
    // content edge.
    let children = node.children();
    let mut flow_y = start_y;
    let mut pending = PendingMargins::new();
    let mut prev_bottom_margin: Option<CSSPixels> = None;
    // Whether the sibling `prev_bottom_margin` came from participates in
    // collapsing at all; a non-participating box's margin is real space
    // that must count toward auto-height, never something that can
    // escape through the parent's bottom edge.
    let mut prev_participates = false;

    let mut i = 0;
    while i < children.len() {
        let child = &children[i];

        if child.is_element() {
            let child_style = child.style();
            if child_style.display().is_none() {
                i += 1;
                continue;
            }
            if child_style.position().is_absolutely_positioned() {
                layout_absolute_child(ctx, child, parent_box);
                i += 1;
                continue;
            }
            if child_style.float() != crate::style::Float::None {
                layout_float_child(ctx, child, parent_box, content_x, flow_y, content_width);
                i += 1;
                continue;
            }

            let is_inline_run_start = child_style.display().is_inline_level() || child.is_line_break();
            if is_inline_run_start {
                let (run, consumed) = collect_inline_run(&children[i..]);
                let run_height = crate::inline::layout_inline_run(
                    ctx,
                    &run,
                    parent_box,
                    content_x,
                    flow_y,
                    content_width,
                    inherited_font_size,
                    inherited_bold,
                    inherited_white_space,
                    i == 0,
                    i + consumed == children.len(),
                    text_align,
                    if i == 0 { node.first_letter_style() } else { None },
                );
                flow_y += run_height;
                prev_bottom_margin = None;
                prev_participates = false;
                i += consumed;
                continue;
            }

            // Block-level child: clear floats if requested, then combine
            // margins with whatever is pending from the preceding
            // sibling (a plain bottom margin, a collapse-through run, or
            // neither for the very first child).
            let clear = child_style.clear();
            if clear != crate::style::Clear::None {
                flow_y = ctx.floats.clear_y(clear, flow_y);
            }

            let child_margin_top = child_style
                .margin_top()
                .map(|lp| lp.resolve_against(content_width))
                .unwrap_or_default();
            let child_margin_bottom = child_style
                .margin_bottom()
                .map(|lp| lp.resolve_against(content_width))
                .unwrap_or_default();

            let child_participates = margin::participates_in_collapsing(&child_style, false);
            let collapses_with_prev = child_participates && clear == crate::style::Clear::None;

            // If the parent already absorbed this (necessarily first,
            // necessarily eligible — see `first_in_flow_block_child`)
            // child's top margin into its own margin above its border
            // box, the margin must not *also* open a gap here, or it
            // would count twice.
            let top_margin_absorbed_by_parent = parent_absorbs_first_top_margin;
            let top_margin_for_flow = if top_margin_absorbed_by_parent {
                CSSPixels::ZERO
            } else {
                child_margin_top
            };
            parent_absorbs_first_top_margin = false;

            let margin_box_top = flow_y;
            let border_box_top = if let Some(prev_b) = prev_bottom_margin.take() {
                if collapses_with_prev {
                    margin_box_top + margin::combine_two(prev_b, top_margin_for_flow)
                } else {
                    margin_box_top + prev_b + top_margin_for_flow
                }
            } else if !pending.is_empty() {
                if collapses_with_prev {
                    margin_box_top + pending.resolve_with(top_margin_for_flow)
                } else {
                    let folded = pending.resolve_with(CSSPixels::ZERO);
                    margin_box_top + folded + top_margin_for_flow
                }
            } else {
                margin_box_top + top_margin_for_flow
            };

            let child_box = layout_node(
                ctx,
                child,
                content_x,
                border_box_top - child_margin_top,
                content_width,
                Some(parent_box),
            );

            if let Some(child_id) = child_box {
                let is_collapse_through = child_participates
                    && margin::has_zero_self_extent(&child_style)
                    && ctx.arena.get(child_id).height.is_zero()
                    && ctx.arena.get(child_id).children.is_empty();

                if is_collapse_through {
                    pending.push(top_margin_for_flow);
                    pending.push(child_margin_bottom);
                    flow_y = ctx.arena.get(child_id).y;
                } else {
                    let b = ctx.arena.get(child_id);
                    flow_y = b.y + b.height + b.border.vertical_sum() + b.padding.vertical_sum();
                    prev_bottom_margin = Some(child_margin_bottom);
                    prev_participates = child_participates;
                }
            }

            i += 1;
        } else {
            // A bare text node directly among block-level siblings forms
            // its own anonymous inline run.
            let (run, consumed) = collect_inline_run(&children[i..]);
            let run_height = crate::inline::layout_inline_run(
                ctx,
                &run,
                parent_box,
                content_x,
                flow_y,
                content_width,
                inherited_font_size,
                inherited_bold,
                inherited_white_space,
                i == 0,
                i + consumed == children.len(),
                text_align,
                if i == 0 { node.first_letter_style() } else { None },
            );
            flow_y += run_height;
            prev_bottom_margin = None;
            prev_participates = false;
            i += consumed;
        }
    }

    let trailing = if let Some(last_bottom) = prev_bottom_margin {
        if prev_participates {
            last_bottom
        } else {
            flow_y += last_bottom;
            CSSPixels::ZERO
        }
    } else if !pending.is_empty() {
        pending.resolve_with(CSSPixels::ZERO)
    } else {
        CSSPixels::ZERO
    };

    (flow_y, trailing)
}

/// Collect a maximal run of consecutive inline-level siblings (text
/// nodes, inline elements, `<br>`) starting at `items[0]`, per
/// `spec.md` §4.2 phase 1: "block descendants terminate collection".
fn collect_inline_run<N: ElementNode>(items: &[N]) -> (Vec<N>, usize) {
    let mut run = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let item = &items[i];
        if item.is_text() {
            run.push(item.clone());
            i += 1;
            continue;
        }
        let style = item.style();
        if style.display().is_none() {
            i += 1;
            continue;
        }
        if style.position().is_absolutely_positioned() {
            break;
        }
        if style.display().is_inline_level() || item.is_line_break() || style.float() != crate::style::Float::None {
            run.push(item.clone());
            i += 1;
            continue;
        }
        break;
    }
    (run, i.max(1))
}

pub(crate) fn layout_absolute_child<N: ElementNode>(ctx: &mut LayoutContext, child: &N, parent_box: BoxId) {
    let style = child.style();
    let is_fixed = style.position() == crate::style::Position::Fixed;

    // Size the subtree first (its own width/height must be known before
    // the final position is resolved), using the viewport as a
    // conservative available-width fallback for shrink-to-fit sizing.
    let fallback_width = ctx.viewport.width;
    let box_id = match layout_node(ctx, child, CSSPixels::ZERO, CSSPixels::ZERO, fallback_width, Some(parent_box)) {
        Some(id) => id,
        None => return,
    };

    ctx.pending_absolute.push(PendingAbsolute {
        box_id,
        is_fixed,
        left: style.left().map(|lp| lp.resolve_against(fallback_width)),
        right: style.right().map(|lp| lp.resolve_against(fallback_width)),
        top: style.top().map(|lp| lp.resolve_against(fallback_width)),
        bottom: style.bottom().map(|lp| lp.resolve_against(fallback_width)),
        margin_left: style.margin_left().map(|lp| lp.resolve_against(fallback_width)),
        margin_right: style.margin_right().map(|lp| lp.resolve_against(fallback_width)),
        margin_top: style.margin_top().map(|lp| lp.resolve_against(fallback_width)),
        margin_bottom: style.margin_bottom().map(|lp| lp.resolve_against(fallback_width)),
    });
}

pub(crate) fn layout_float_child<N: ElementNode>(
    ctx: &mut LayoutContext,
    child: &N,
    parent_box: BoxId,
    content_x: CSSPixels,
    current_y: CSSPixels,
    available_width: CSSPixels,
) {
    let style = child.style();
    let side = style.float().side().expect("checked by caller");

    let bfc_base = ctx.floats.push_bfc();
    let box_id = layout_node(ctx, child, CSSPixels::ZERO, CSSPixels::ZERO, available_width, Some(parent_box));
    let nested_floats = ctx.floats.pop_bfc();
    let _ = bfc_base;

    let Some(box_id) = box_id else { return };

    let outer_width = ctx.arena.get(box_id).outer_width();
    let drop_y = ctx.floats.drop_y(outer_width, current_y, available_width);
    let (left_offset, right_offset) = ctx.floats.offsets_at(drop_y);

    let new_x = match side {
        crate::style::FloatSide::Left => content_x + left_offset,
        crate::style::FloatSide::Right => content_x + available_width - right_offset - outer_width,
    };

    let b = ctx.arena.get(box_id);
    let dx = new_x - b.x;
    let dy = drop_y - b.y;
    ctx.arena.shift_subtree(box_id, dx, dy);

    let outer_height = ctx.arena.get(box_id).outer_height();
    ctx.floats.register(FloatRecord {
        side,
        left: if matches!(side, crate::style::FloatSide::Left) {
            new_x + outer_width - content_x
        } else {
            CSSPixels::ZERO
        },
        right: if matches!(side, crate::style::FloatSide::Right) {
            content_x + available_width - new_x
        } else {
            CSSPixels::ZERO
        },
        top: drop_y,
        bottom: drop_y + outer_height,
    });

    for mut nested in nested_floats {
        nested.top += dy;
        nested.bottom += dy;
        ctx.floats.register(nested);
    }
}

/// `spec.md` §4.1 step 8: "relative offsets adjust (x, y) immediately."
/// Floats and absolutely positioned boxes are already handled by their
/// respective call sites (`layout_float_child` repositions after the
/// fact; `layout_absolute_child` defers to `absolute::resolve_pending_absolutes`);
/// this hook is where `position: relative`'s offset is applied, once the
/// element's whole subtree has been laid out at its static position, by
/// shifting the already-built subtree as a unit (CSS 2.1 §9.4.3: the
/// descendants are positioned as if the box had not been repositioned,
/// then the box and its descendants move together).
fn finalize_positioned<S: StyleView>(
    ctx: &mut LayoutContext,
    box_id: BoxId,
    style: &S,
    _is_floated: bool,
    _is_abs: bool,
    _x: CSSPixels,
    _y: CSSPixels,
    available_width: CSSPixels,
) {
    if style.position() != crate::style::Position::Relative {
        return;
    }

    let dx = match (style.left(), style.right()) {
        (Some(left), _) => left.resolve_against(available_width),
        (None, Some(right)) => -right.resolve_against(available_width),
        (None, None) => CSSPixels::ZERO,
    };
    // The vertical containing block is commonly auto-height at this
    // point in the recursion, so a percentage top/bottom resolves
    // against zero (CSS 2.1 §10.5's rule for an indeterminate
    // containing-block height); plain lengths are unaffected.
    let dy = match (style.top(), style.bottom()) {
        (Some(top), _) => top.resolve_against(CSSPixels::ZERO),
        (None, Some(bottom)) => -bottom.resolve_against(CSSPixels::ZERO),
        (None, None) => CSSPixels::ZERO,
    };

    if dx != CSSPixels::ZERO || dy != CSSPixels::ZERO {
        ctx.arena.shift_subtree(box_id, dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::LayoutContext,
        dom::NodeKind,
        oracle::MonospaceOracle,
        pixels::Size,
        style::{Clear, ContentAtom, Direction, Display, Float, LengthPercentageAuto, Overflow, Position, VerticalAlign},
    };

    #[derive(Clone, Default)]
    struct DivStyle {
        margin_top: MaybeAuto,
        margin_bottom: MaybeAuto,
        height: LengthPercentageAuto,
        counter_increment: Vec<(String, i32)>,
        content: Option<Vec<ContentAtom>>,
    }

    impl StyleView for DivStyle {
        fn display(&self) -> Display {
            Display::Block
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
            self.margin_top.map(LengthPercentage::Length)
        }
        fn margin_right(&self) -> LengthPercentageAuto {
            AutoOr::NotAuto(LengthPercentage::Length(CSSPixels::ZERO))
        }
        fn margin_bottom(&self) -> LengthPercentageAuto {
            self.margin_bottom.map(LengthPercentage::Length)
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
            AutoOr::Auto
        }
        fn height(&self) -> LengthPercentageAuto {
            self.height
        }
        fn font_size(&self) -> CSSPixels {
            CSSPixels(16.0)
        }
        fn direction(&self) -> Direction {
            Direction::Ltr
        }
        fn vertical_align(&self) -> VerticalAlign {
            VerticalAlign::Baseline
        }
        fn counter_increment(&self) -> Vec<(String, i32)> {
            self.counter_increment.clone()
        }
        fn content(&self) -> Option<Vec<ContentAtom>> {
            self.content.clone()
        }
    }

    #[derive(Clone, Default)]
    struct DivNode {
        style: DivStyle,
        children: Vec<DivNode>,
        before: Option<Box<DivStyle>>,
    }

    impl ElementNode for DivNode {
        type Style = DivStyle;
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
            self.children.clone()
        }
        fn style(&self) -> Self::Style {
            self.style.clone()
        }
        fn before_style(&self) -> Option<Self::Style> {
            self.before.as_deref().cloned()
        }
    }

    fn leaf(height: f32, margin_top: f32, margin_bottom: f32) -> DivNode {
        DivNode {
            style: DivStyle {
                margin_top: AutoOr::NotAuto(CSSPixels(margin_top)),
                margin_bottom: AutoOr::NotAuto(CSSPixels(margin_bottom)),
                height: AutoOr::NotAuto(LengthPercentage::Length(CSSPixels(height))),
                ..Default::default()
            },
            children: vec![],
            before: None,
        }
    }

    #[test]
    fn sibling_margin_collapse_takes_the_max() {
        let oracle = MonospaceOracle;
        let mut ctx = LayoutContext::new(&oracle, None, Size::new(CSSPixels(800.0), CSSPixels(600.0)), CSSPixels::ZERO);
        let root = DivNode {
            style: DivStyle::default(),
            children: vec![leaf(50.0, 0.0, 20.0), leaf(50.0, 30.0, 0.0)],
            before: None,
        };

        let root_id = layout_node(&mut ctx, &root, CSSPixels::ZERO, CSSPixels::ZERO, CSSPixels(800.0), None).unwrap();
        let children = ctx.arena.get(root_id).children.clone();
        assert_eq!(children.len(), 2);
        let first = ctx.arena.get(children[0]);
        let second = ctx.arena.get(children[1]);
        assert_eq!(first.y, CSSPixels::ZERO);
        assert_eq!(first.height, CSSPixels(50.0));
        // max(20, 30) = 30, so second starts at 50 + 30 = 80, not 100.
        assert_eq!(second.y, CSSPixels(80.0));
    }

    #[test]
    fn before_pseudo_elements_own_counter_increment_is_applied() {
        let oracle = MonospaceOracle;
        let mut ctx = LayoutContext::new(&oracle, None, Size::new(CSSPixels(800.0), CSSPixels(600.0)), CSSPixels::ZERO);
        let before = DivStyle {
            counter_increment: vec![("item".to_string(), 1)],
            content: Some(vec![ContentAtom::Counter("item".to_string())]),
            ..Default::default()
        };
        let root = DivNode {
            style: DivStyle::default(),
            children: vec![],
            before: Some(Box::new(before)),
        };

        let root_id = layout_node(&mut ctx, &root, CSSPixels::ZERO, CSSPixels::ZERO, CSSPixels(800.0), None).unwrap();
        let marker = ctx
            .arena
            .get(root_id)
            .children
            .iter()
            .map(|&id| ctx.arena.get(id))
            .find_map(|b| b.pseudo_text.clone());
        // The increment is declared on the `::before` rule itself, not on
        // the host element, so it must be read from `before_style()` and
        // not silently dropped.
        assert_eq!(marker.as_deref(), Some("1"));
    }
}
