//! The inline formatter (`spec.md` §4.2): collect → break → construct.
//! `block.rs` hands this a maximal run of consecutive inline-level
//! siblings; this module flattens it (recursing into nested inline
//! elements), breaks it into lines against the float context, and
//! builds the resulting boxes.
//!
//! Phase 2 (break) and phase 3 (construct) are merged into one
//! line-building pass: a line is turned into boxes as soon as it is
//! broken, rather than keeping a separate pass over a fully-broken line
//! list. A float encountered mid-run narrows every subsequent line
//! immediately (`line_left`/`line_right_edge` are recomputed the
//! instant the float registers), which is a bounded, one-directional
//! approximation of the spec's float-narrowing retry: content already
//! placed before the float never reflows, only content after it.

use crate::{
    block,
    context::LayoutContext,
    dom::ElementNode,
    fragment::{BoxId, Fragment, LayoutBox},
    pixels::{CSSPixels, Sides},
    style::{Clear, Display, FloatSide, TextAlign, WhiteSpace},
    text,
};

enum InlineItem<N: ElementNode> {
    Text {
        text: String,
        font_size: CSSPixels,
        bold: bool,
        white_space: WhiteSpace,
    },
    /// The detached first character of a block's content, styled per
    /// `::first-letter` (`spec.md` §4.7). Built as its own small inline
    /// box rather than folded into `Text` so it can carry its own
    /// border/padding/margin the way a real `::first-letter` box can.
    FirstLetter {
        text: String,
        style: N::Style,
    },
    Open {
        node: N,
    },
    Close,
    Atomic(N),
    Float(N),
    Absolute(N),
    Control,
}

/// `parent_is_block` is true only for the outermost call (the run
/// `block.rs` hands us is always a maximal run of a block container's
/// own children); nested inline elements' text preserves surrounding
/// whitespace regardless of position (`spec.md` §4.7). `run_is_first`/
/// `run_is_last` additionally gate whether the very first/last text
/// item of that outermost call is allowed to trim, since the run may
/// only be a slice of the block parent's full child list.
///
/// `first_letter_style`, when `Some`, is consumed at most once: on the
/// very first text item of the outermost call (`spec.md` §4.7). Nested
/// recursive calls always pass `None` — a `::first-letter` only ever
/// detaches from the block container's own first line, never from a
/// descendant inline element's text, which covers the common case of a
/// plain leading text node or a single leading inline wrapper (e.g.
/// `<p><span>Hello</span> world</p>`) reaching the character by virtue
/// of being `idx == 0` of the outermost run, but not one nested two or
/// more inline elements deep.
#[allow(clippy::too_many_arguments)]
fn flatten<N: ElementNode>(
    items: &[N],
    out: &mut Vec<InlineItem<N>>,
    inherited_font_size: CSSPixels,
    inherited_bold: bool,
    inherited_white_space: WhiteSpace,
    parent_is_block: bool,
    run_is_first: bool,
    run_is_last: bool,
    mut first_letter_style: Option<N::Style>,
) {
    let last_idx = items.len().saturating_sub(1);
    for (idx, item) in items.iter().enumerate() {
        if item.is_text() {
            let raw = item.text_content().unwrap_or("");
            if raw.is_empty() {
                continue;
            }
            let is_first_child = parent_is_block && run_is_first && idx == 0;
            let is_last_child = parent_is_block && run_is_last && idx == last_idx;
            let processed = if inherited_white_space.collapses_whitespace() {
                text::trim_for_position(raw, is_first_child, is_last_child, parent_is_block)
            } else {
                raw.to_string()
            };
            if processed.is_empty() {
                continue;
            }
            if idx == 0 {
                if let Some(fl_style) = first_letter_style.take() {
                    if let Some((letter, rest)) = text::split_first_letter(&processed) {
                        out.push(InlineItem::FirstLetter { text: letter.to_string(), style: fl_style });
                        if !rest.is_empty() {
                            out.push(InlineItem::Text {
                                text: rest.to_string(),
                                font_size: inherited_font_size,
                                bold: inherited_bold,
                                white_space: inherited_white_space,
                            });
                        }
                        continue;
                    }
                }
            }
            out.push(InlineItem::Text {
                text: processed,
                font_size: inherited_font_size,
                bold: inherited_bold,
                white_space: inherited_white_space,
            });
            continue;
        }

        let style = item.style();
        if style.display().is_none() {
            continue;
        }
        if item.is_line_break() {
            out.push(InlineItem::Control);
            continue;
        }
        if style.position().is_absolutely_positioned() {
            out.push(InlineItem::Absolute(item.clone()));
            continue;
        }
        if style.float() != crate::style::Float::None {
            out.push(InlineItem::Float(item.clone()));
            continue;
        }

        let is_atomic = item.replaced_image_source().is_some() || style.display() == Display::InlineBlock;
        if is_atomic {
            out.push(InlineItem::Atomic(item.clone()));
            continue;
        }

        if style.display().is_inline_level() {
            let fl_for_children = if idx == 0 { first_letter_style.take() } else { None };
            out.push(InlineItem::Open { node: item.clone() });
            flatten(
                &item.children(),
                out,
                style.font_size(),
                style.font_bold(),
                style.white_space(),
                false,
                false,
                false,
                fl_for_children,
            );
            out.push(InlineItem::Close);
            continue;
        }

        // A block-level descendant inside inline content: laid out at
        // full content width right where it occurs, splitting whatever
        // inline wrapper boxes are currently open around it
        // (`spec.md` §4.9).
        out.push(InlineItem::Atomic(item.clone()));
    }
}

/// Lay out one maximal run of inline-level siblings starting at
/// `(x, y)` with `available_width` to work with. `inherited_font_size`/
/// `inherited_bold` come from the containing block's own style (text
/// nodes that are direct children of the run inherit from it, not from
/// any of the run's own inline elements). `text_align` is the
/// containing block's own `text-align` (`spec.md` §4.1 step 17 applies
/// it to the container's inline children, never to an inline element's
/// own declaration). `first_letter_style` is the containing block's own
/// `::first-letter` style, if any rule matches it; only meaningful when
/// `run_is_first`, since `::first-letter` only ever detaches from a
/// block's very first line (`spec.md` §4.7). Returns the total height
/// the run consumed.
#[allow(clippy::too_many_arguments)]
pub fn layout_inline_run<N: ElementNode>(
    ctx: &mut LayoutContext,
    run: &[N],
    parent_box: BoxId,
    x: CSSPixels,
    y: CSSPixels,
    available_width: CSSPixels,
    inherited_font_size: CSSPixels,
    inherited_bold: bool,
    inherited_white_space: WhiteSpace,
    run_is_first: bool,
    run_is_last: bool,
    text_align: TextAlign,
    first_letter_style: Option<N::Style>,
) -> CSSPixels {
    let mut items = Vec::new();
    let first_letter_style = if run_is_first { first_letter_style } else { None };
    flatten(
        run,
        &mut items,
        inherited_font_size,
        inherited_bold,
        inherited_white_space,
        true,
        run_is_first,
        run_is_last,
        first_letter_style,
    );
    build_lines(ctx, &items, parent_box, x, y, available_width, inherited_white_space, text_align)
}

struct OpenInline {
    box_id: BoxId,
    fragment_start_x: CSSPixels,
    fragment_start_y: CSSPixels,
    border: Sides<CSSPixels>,
    padding: Sides<CSSPixels>,
    margin_right: CSSPixels,
}

const DEFAULT_LINE_HEIGHT: CSSPixels = CSSPixels(19.2); // 16px * 1.2 strut, used only before any text/box sets a real one.

#[allow(clippy::too_many_arguments)]
fn build_lines<N: ElementNode>(
    ctx: &mut LayoutContext,
    items: &[InlineItem<N>],
    parent_box: BoxId,
    x: CSSPixels,
    y: CSSPixels,
    available_width: CSSPixels,
    container_white_space: WhiteSpace,
    text_align: TextAlign,
) -> CSSPixels {
    let mut cursor_y = y;
    let mut line_height = CSSPixels::ZERO;
    let mut open_stack: Vec<OpenInline> = Vec::new();
    let mut line_has_content = false;
    // Index into `parent_box`'s (flat) children list where the line
    // currently being built started; `spec.md` §4.1 step 17's alignment
    // pass shifts every box in `[line_start_child_idx, children.len())`
    // once the line is known to be finished.
    let mut line_start_child_idx = ctx.arena.get(parent_box).children.len();

    // Floats registered by earlier siblings in the same parent are
    // already in `ctx.floats` by the time this run starts, so even the
    // very first line must start from the float-adjusted edge, not from
    // the container's raw content edge.
    let (left0, right0) = ctx.floats.offsets_at(cursor_y);
    let mut line_left = x + left0;
    let mut line_right_edge = x + available_width - right0;
    let mut cursor_x = line_left;

    for item in items {
        match item {
            InlineItem::Control => {
                new_line(
                    ctx,
                    &mut open_stack,
                    &mut cursor_x,
                    &mut cursor_y,
                    &mut line_height,
                    &mut line_left,
                    &mut line_right_edge,
                    &mut line_has_content,
                    x,
                    available_width,
                    parent_box,
                    &mut line_start_child_idx,
                    text_align,
                );
            },
            InlineItem::FirstLetter { text, style } => {
                let border = crate::style::used_border_widths(style);
                let padding = Sides {
                    top: style.padding_top().resolve_against(available_width),
                    right: style.padding_right().resolve_against(available_width),
                    bottom: style.padding_bottom().resolve_against(available_width),
                    left: style.padding_left().resolve_against(available_width),
                };
                let margin_left = style.margin_left().map(|lp| lp.resolve_against(available_width)).unwrap_or_default();
                let margin_right = style.margin_right().map(|lp| lp.resolve_against(available_width)).unwrap_or_default();
                cursor_x += margin_left + border.left + padding.left;

                let mut wrapper = LayoutBox::new("::first-letter");
                wrapper.border = border;
                wrapper.padding = padding;
                wrapper.position = style.position();
                let wrapper_id = ctx.arena.alloc(wrapper);
                ctx.arena.add_child(parent_box, wrapper_id);

                let font_size = style.font_size();
                let bold = style.font_bold();
                let (w, _) = ctx.text_oracle.measure_text(text, font_size, bold);
                let natural_height = ctx.text_oracle.natural_line_height(font_size);
                let content_start_x = cursor_x;
                let mut text_box = LayoutBox::new("#text");
                text_box.width = w;
                text_box.height = natural_height;
                text_box.x = cursor_x;
                text_box.y = cursor_y;
                text_box.pseudo_text = Some(text.clone());
                let text_id = ctx.arena.alloc(text_box);
                ctx.arena.add_child(parent_box, text_id);
                cursor_x += w;
                line_height = line_height.max(natural_height);
                line_has_content = true;

                let open = OpenInline {
                    box_id: wrapper_id,
                    fragment_start_x: content_start_x,
                    fragment_start_y: cursor_y,
                    border,
                    padding,
                    margin_right,
                };
                let h = if line_height.is_zero() { DEFAULT_LINE_HEIGHT } else { line_height };
                close_inline(ctx, &open, cursor_x, cursor_y, h, true);
                cursor_x += padding.right + border.right + margin_right;
            },
            InlineItem::Text { text, font_size, bold, white_space } => {
                if !white_space.wraps() {
                    // `white-space: nowrap` / `pre` (spec.md §4.7 [FULL-ADD]):
                    // line-breaking is suppressed, so the whole run measures
                    // as a single (possibly overflowing) line.
                    let (w, _) = ctx.text_oracle.measure_text(text, *font_size, *bold);
                    if !text.is_empty() {
                        let natural_height = ctx.text_oracle.natural_line_height(*font_size);
                        let mut text_box = LayoutBox::new("#text");
                        text_box.width = w;
                        text_box.height = natural_height;
                        text_box.x = cursor_x;
                        text_box.y = cursor_y;
                        text_box.pseudo_text = Some(text.clone());
                        let id = ctx.arena.alloc(text_box);
                        ctx.arena.add_child(parent_box, id);
                        cursor_x += w;
                        line_height = line_height.max(natural_height);
                        line_has_content = true;
                    }
                    continue;
                }

                // `spec.md` §4.2 phase 2: "for each candidate line, compute
                // (left_offset, right_offset) from floats at the *current*
                // Y". Breaking the whole run in one `break_text` call (as
                // opposed to one call per produced line) would commit every
                // line after the first to the width available at the run's
                // starting Y, which is wrong once a float bottoms out
                // partway through a long run.
                let mut remaining = text.clone();
                while !remaining.is_empty() {
                    let avail = (line_right_edge - cursor_x).clamp_non_negative();
                    let full_avail = (line_right_edge - line_left).clamp_non_negative();
                    let (broken, cleared_y) =
                        text::break_text_with_clearing(&remaining, *font_size, *bold, avail, full_avail, ctx.text_oracle, &ctx.floats, cursor_y);

                    if cleared_y > cursor_y {
                        cursor_y = cleared_y;
                        let (left, right) = ctx.floats.offsets_at(cursor_y);
                        line_left = x + left;
                        line_right_edge = x + available_width - right;
                        cursor_x = line_left;
                        continue;
                    }

                    let Some(line) = broken.into_iter().next() else { break };
                    let consumed_words = line.text.split_whitespace().count();
                    let rest: String = remaining.split_whitespace().skip(consumed_words).collect::<Vec<_>>().join(" ");

                    if !line.text.is_empty() {
                        let natural_height = ctx.text_oracle.natural_line_height(*font_size);
                        let mut text_box = LayoutBox::new("#text");
                        text_box.width = line.width;
                        text_box.height = natural_height;
                        text_box.x = cursor_x;
                        text_box.y = cursor_y;
                        text_box.pseudo_text = Some(line.text);
                        let id = ctx.arena.alloc(text_box);
                        ctx.arena.add_child(parent_box, id);
                        cursor_x += line.width;
                        line_height = line_height.max(natural_height);
                        line_has_content = true;
                    }

                    remaining = rest;
                    if remaining.is_empty() {
                        break;
                    }
                    new_line(
                        ctx,
                        &mut open_stack,
                        &mut cursor_x,
                        &mut cursor_y,
                        &mut line_height,
                        &mut line_left,
                        &mut line_right_edge,
                        &mut line_has_content,
                        x,
                        available_width,
                        parent_box,
                        &mut line_start_child_idx,
                        text_align,
                    );
                }
            },
            InlineItem::Open { node } => {
                let style = node.style();
                let border = crate::style::used_border_widths(&style);
                let padding = Sides {
                    top: style.padding_top().resolve_against(available_width),
                    right: style.padding_right().resolve_against(available_width),
                    bottom: style.padding_bottom().resolve_against(available_width),
                    left: style.padding_left().resolve_against(available_width),
                };
                let margin_left = style.margin_left().map(|lp| lp.resolve_against(available_width)).unwrap_or_default();
                let margin_right = style.margin_right().map(|lp| lp.resolve_against(available_width)).unwrap_or_default();
                cursor_x += margin_left + border.left + padding.left;

                let label = if node.tag_name().is_empty() { "span" } else { node.tag_name() };
                let mut b = LayoutBox::new(label);
                b.border = border;
                b.padding = padding;
                b.position = style.position();
                b.z_index = style.z_index().value();
                let id = ctx.arena.alloc(b);
                ctx.arena.add_child(parent_box, id);

                open_stack.push(OpenInline {
                    box_id: id,
                    fragment_start_x: cursor_x,
                    fragment_start_y: cursor_y,
                    border,
                    padding,
                    margin_right,
                });
            },
            InlineItem::Close => {
                if let Some(open) = open_stack.pop() {
                    let h = if line_height.is_zero() { DEFAULT_LINE_HEIGHT } else { line_height };
                    close_inline(ctx, &open, cursor_x, cursor_y, h, true);
                    cursor_x += open.padding.right + open.border.right + open.margin_right;
                }
            },
            InlineItem::Absolute(node) => {
                block::layout_absolute_child(ctx, node, parent_box);
            },
            InlineItem::Float(node) => {
                let side = node.style().float().side().unwrap_or(FloatSide::Left);
                block::layout_float_child(ctx, node, parent_box, x, cursor_y, available_width);
                let (left, right) = ctx.floats.offsets_at(cursor_y);
                let new_line_left = x + left;
                let new_line_right = x + available_width - right;
                if matches!(side, FloatSide::Left) {
                    cursor_x = cursor_x.max(new_line_left);
                }
                line_left = new_line_left;
                line_right_edge = new_line_right;
            },
            InlineItem::Atomic(node) => {
                let style = node.style();
                let is_actual_block = !(node.replaced_image_source().is_some() || style.display() == Display::InlineBlock);

                if is_actual_block {
                    // Block-in-inline (`spec.md` §4.9): close every open
                    // inline's current fragment, drop below the current
                    // line, lay the block out at full content width,
                    // then resume with fresh fragments for whatever
                    // inline boxes are still open.
                    let h = if line_height.is_zero() { DEFAULT_LINE_HEIGHT } else { line_height };
                    for open in &open_stack {
                        close_inline(ctx, open, cursor_x, cursor_y, h, false);
                    }
                    if line_has_content {
                        cursor_y += h;
                    }
                    let clear = style.clear();
                    if clear != Clear::None {
                        cursor_y = ctx.floats.clear_y(clear, cursor_y);
                    }
                    if let Some(block_id) = block::layout_node(ctx, node, x, cursor_y, available_width, Some(parent_box)) {
                        let b = ctx.arena.get(block_id);
                        cursor_y = b.y + b.outer_height() - b.margin.top;
                    }
                    cursor_x = x;
                    line_height = CSSPixels::ZERO;
                    line_has_content = false;
                    let (left, right) = ctx.floats.offsets_at(cursor_y);
                    line_left = x + left;
                    line_right_edge = x + available_width - right;
                    for open in &mut open_stack {
                        open.fragment_start_x = cursor_x;
                        open.fragment_start_y = cursor_y;
                    }
                    continue;
                }

                let available_for_atomic = (line_right_edge - cursor_x).clamp_non_negative();
                if let Some(id) = block::layout_node(ctx, node, cursor_x, cursor_y, available_for_atomic, Some(parent_box)) {
                    let outer_w = ctx.arena.get(id).outer_width();
                    if container_white_space.wraps() && cursor_x + outer_w > line_right_edge && cursor_x > line_left {
                        new_line(
                            ctx,
                            &mut open_stack,
                            &mut cursor_x,
                            &mut cursor_y,
                            &mut line_height,
                            &mut line_left,
                            &mut line_right_edge,
                            &mut line_has_content,
                            x,
                            available_width,
                            parent_box,
                            &mut line_start_child_idx,
                            text_align,
                        );
                        let b = ctx.arena.get(id);
                        let (dx, dy) = (cursor_x - b.x, cursor_y - b.y);
                        ctx.arena.shift_subtree(id, dx, dy);
                    }
                    let outer_h = ctx.arena.get(id).outer_height();
                    cursor_x += ctx.arena.get(id).outer_width();
                    line_height = line_height.max(outer_h);
                    line_has_content = true;
                }
            },
        }
    }

    let final_height = if line_height.is_zero() { DEFAULT_LINE_HEIGHT } else { line_height };
    for open in open_stack.into_iter().rev() {
        close_inline(ctx, &open, cursor_x, cursor_y, final_height, true);
    }
    align_line(ctx, parent_box, line_start_child_idx, line_right_edge, cursor_x, text_align);

    if line_has_content {
        cursor_y += final_height;
    }

    (cursor_y - y).clamp_non_negative()
}

/// `spec.md` §4.1 step 17: shift every box built for this line by the
/// offset its `text_align` requires. The line's boxes are a contiguous
/// run of `parent_box`'s (flat) children — text, atomic, and inline
/// wrapper boxes are all direct children of the block container, never
/// nested under each other — so shifting `[line_start_child_idx,
/// children.len())` moves exactly this line and nothing else.
///
/// `Justify` is treated like `Left` here: distributing the slack as
/// inter-word spacing would require re-breaking an already-built line's
/// text boxes word by word, which this line builder does not keep
/// around once a line is broken.
fn align_line(
    ctx: &mut LayoutContext,
    parent_box: BoxId,
    line_start_child_idx: usize,
    line_right_edge: CSSPixels,
    content_end_x: CSSPixels,
    text_align: TextAlign,
) {
    let slack = (line_right_edge - content_end_x).clamp_non_negative();
    let dx = match text_align {
        TextAlign::Right => slack,
        TextAlign::Center => slack / 2.0,
        TextAlign::Left | TextAlign::Justify => CSSPixels::ZERO,
    };
    if dx.is_zero() {
        return;
    }
    let end = ctx.arena.get(parent_box).children.len();
    if line_start_child_idx >= end {
        return;
    }
    let ids: Vec<BoxId> = ctx.arena.get(parent_box).children[line_start_child_idx..end].to_vec();
    for id in ids {
        ctx.arena.shift_subtree(id, dx, CSSPixels::ZERO);
    }
}

#[allow(clippy::too_many_arguments)]
fn new_line(
    ctx: &mut LayoutContext,
    open_stack: &mut [OpenInline],
    cursor_x: &mut CSSPixels,
    cursor_y: &mut CSSPixels,
    line_height: &mut CSSPixels,
    line_left: &mut CSSPixels,
    line_right_edge: &mut CSSPixels,
    line_has_content: &mut bool,
    x: CSSPixels,
    available_width: CSSPixels,
    parent_box: BoxId,
    line_start_child_idx: &mut usize,
    text_align: TextAlign,
) {
    let h = if line_height.is_zero() { DEFAULT_LINE_HEIGHT } else { *line_height };
    for open in open_stack.iter() {
        close_inline(ctx, open, *cursor_x, *cursor_y, h, false);
    }
    align_line(ctx, parent_box, *line_start_child_idx, *line_right_edge, *cursor_x, text_align);
    *cursor_y += h;
    *line_height = CSSPixels::ZERO;
    *line_has_content = false;
    let (left, right) = ctx.floats.offsets_at(*cursor_y);
    *line_left = x + left;
    *line_right_edge = x + available_width - right;
    *cursor_x = *line_left;
    *line_start_child_idx = ctx.arena.get(parent_box).children.len();
    for open in open_stack.iter_mut() {
        open.fragment_start_x = *cursor_x;
        open.fragment_start_y = *cursor_y;
    }
}

/// Finalize one fragment rectangle for an open inline box, covering
/// from where its current fragment started to `end_x`. `is_last` tells
/// us whether this fragment keeps the box's right border; a fragment
/// keeps its left border iff it is the box's first (`spec.md` §4.9).
fn close_inline(ctx: &mut LayoutContext, open: &OpenInline, end_x: CSSPixels, end_y: CSSPixels, height: CSSPixels, is_last: bool) {
    let b = ctx.arena.get_mut(open.box_id);
    let has_prior_fragments = !b.fragments.is_empty();
    let fragment = Fragment {
        x: open.fragment_start_x - open.border.left - open.padding.left,
        y: open.fragment_start_y,
        width: (end_x - open.fragment_start_x).clamp_non_negative() + open.border.left + open.padding.left,
        height,
        border_edges: Sides {
            top: true,
            bottom: true,
            left: !has_prior_fragments,
            right: is_last,
        },
    };
    b.fragments.push(fragment);
    b.is_first_fragment = !has_prior_fragments;
    b.is_last_fragment = is_last;
    if !has_prior_fragments {
        b.x = fragment.x;
        b.y = fragment.y;
    }
    b.width = fragment.width;
    b.height = fragment.height;
    let _ = end_y;
}
