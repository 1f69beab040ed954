//! Table layout (`spec.md` §4.10): a two-pass algorithm over an
//! explicit cell grid, the way CSS 2.1 §17 describes it — structure
//! first (so rowspan/colspan produce one coherent grid regardless of
//! which row a spanning cell's tag appears in), then sizing.

use crate::{
    context::LayoutContext,
    dom::ElementNode,
    fragment::BoxId,
    intrinsic::compute_intrinsic_sizes,
    pixels::{AutoOr, CSSPixels},
    style::{Display, LengthPercentage},
};

struct GridCell<N> {
    node: N,
    row_span: usize,
    col_span: usize,
    origin_row: usize,
    origin_col: usize,
}

/// Pass 1 (Structure): flatten rows/row-groups/stray cells into an
/// explicit `grid[row][col] -> cell index` map, synthesizing anonymous
/// rows and cells for stray content per CSS 2.1 §17.2.1.
fn build_grid<N: ElementNode>(node: &N) -> (Vec<GridCell<N>>, Vec<Vec<Option<usize>>>) {
    let mut cells: Vec<GridCell<N>> = Vec::new();
    let mut grid: Vec<Vec<Option<usize>>> = Vec::new();
    let mut next_row = 0usize;

    let mut row_nodes: Vec<N> = Vec::new();
    collect_rows(node, &mut row_nodes);

    for row in &row_nodes {
        place_row(row, next_row, &mut cells, &mut grid);
        next_row += 1;
    }

    (cells, grid)
}

/// Walk `table`'s children, expanding row groups and synthesizing a
/// one-row wrapper for any stray cell or other content that lands
/// directly inside the table.
fn collect_rows<N: ElementNode>(table: &N, out: &mut Vec<N>) {
    for child in table.children() {
        if !child.is_element() {
            continue;
        }
        let style = child.style();
        if style.display().is_none() {
            continue;
        }
        match style.display() {
            Display::TableRow => out.push(child),
            Display::TableRowGroup | Display::TableHeaderGroup | Display::TableFooterGroup => {
                for grandchild in child.children() {
                    if grandchild.is_element() && grandchild.style().display() == Display::TableRow {
                        out.push(grandchild);
                    }
                }
            },
            Display::TableColumn | Display::TableColumnGroup | Display::TableCaption => {
                // Column hints and captions don't contribute to the grid
                // directly (`spec.md` §4.10 scopes sizing to content-based
                // column widths; caption placement is left to the embedder).
            },
            _ => {
                // A stray cell, or arbitrary content, lands directly
                // inside the table: synthesize a one-row wrapper for it.
                out.push(child);
            },
        }
    }
}

/// Place one row's cells into the grid starting at `row`, skipping any
/// slot already occupied by a rowspan from an earlier row.
fn place_row<N: ElementNode>(row: &N, row_index: usize, cells: &mut Vec<GridCell<N>>, grid: &mut Vec<Vec<Option<usize>>>) {
    ensure_row(grid, row_index);
    let mut col = 0usize;

    let row_children: Vec<N> = if row.is_element() && row.style().display() == Display::TableRow {
        row.children()
    } else {
        vec![row.clone()]
    };

    for child in row_children {
        if !child.is_element() {
            continue;
        }
        let style = child.style();
        if style.display().is_none() {
            continue;
        }

        while slot_taken(grid, row_index, col) {
            col += 1;
        }

        let row_span = style.row_span().max(1) as usize;
        let col_span = style.col_span().max(1) as usize;
        let cell_index = cells.len();
        cells.push(GridCell {
            node: child,
            row_span,
            col_span,
            origin_row: row_index,
            origin_col: col,
        });

        for r in row_index..row_index + row_span {
            ensure_row(grid, r);
            for c in col..col + col_span {
                ensure_col(grid, r, c);
                grid[r][c] = Some(cell_index);
            }
        }

        col += col_span;
    }
}

fn ensure_row(grid: &mut Vec<Vec<Option<usize>>>, row: usize) {
    while grid.len() <= row {
        grid.push(Vec::new());
    }
}

fn ensure_col(grid: &mut [Vec<Option<usize>>], row: usize, col: usize) {
    while grid[row].len() <= col {
        grid[row].push(None);
    }
}

fn slot_taken(grid: &[Vec<Option<usize>>], row: usize, col: usize) -> bool {
    grid.get(row).and_then(|r| r.get(col)).copied().flatten().is_some()
}

/// Pass 2 (Sizing) plus placement: resolve column widths and row
/// heights, then lay out each cell's content at its final rectangle.
/// Returns the table's total content height.
pub fn layout_table<N: ElementNode>(
    ctx: &mut LayoutContext,
    node: &N,
    box_id: BoxId,
    content_x: CSSPixels,
    content_y: CSSPixels,
    width: CSSPixels,
) -> CSSPixels {
    let (cells, grid) = build_grid(node);
    if grid.is_empty() {
        return CSSPixels::ZERO;
    }

    let num_cols = grid.iter().map(Vec::len).max().unwrap_or(0);
    if num_cols == 0 {
        return CSSPixels::ZERO;
    }
    let num_rows = grid.len();

    let (spacing_h, spacing_v) = node.style().border_spacing();

    let mut col_content: Vec<CSSPixels> = vec![CSSPixels::ZERO; num_cols];
    for cell in &cells {
        if cell.col_span != 1 {
            continue;
        }
        let w = cell_preferred_width(ctx, cell, width);
        col_content[cell.origin_col] = col_content[cell.origin_col].max(w);
    }
    // Colspan>1 cells: only widen the columns they span if their own
    // requirement exceeds what those columns already provide.
    let mut spanning: Vec<&GridCell<N>> = cells.iter().filter(|c| c.col_span > 1).collect();
    spanning.sort_by_key(|c| c.col_span);
    for cell in spanning {
        let span = cell.origin_col..(cell.origin_col + cell.col_span).min(num_cols);
        let needed = cell_preferred_width(ctx, cell, width);
        let current: CSSPixels = col_content[span.clone()].iter().copied().sum::<CSSPixels>() + spacing_h * (span.len().saturating_sub(1) as f32);
        if needed > current {
            let extra = needed - current;
            let share = extra / span.len().max(1) as f32;
            for c in span {
                col_content[c] += share;
            }
        }
    }

    let content_total: CSSPixels = col_content.iter().copied().sum();
    let spacing_total = spacing_h * (num_cols + 1) as f32;
    let available_for_columns = (width - spacing_total).clamp_non_negative();

    let col_widths: Vec<CSSPixels> = if content_total.is_zero() {
        vec![available_for_columns / num_cols.max(1) as f32; num_cols]
    } else {
        let diff = available_for_columns - content_total;
        col_content
            .iter()
            .map(|&c| (c + diff * (c.0 / content_total.0)).clamp_non_negative())
            .collect()
    };

    let mut col_x = vec![CSSPixels::ZERO; num_cols];
    let mut cursor = content_x + spacing_h;
    for (i, w) in col_widths.iter().enumerate() {
        col_x[i] = cursor;
        cursor += *w + spacing_h;
    }

    // Row heights can't be resolved row-by-row in a single pass once
    // rowspans are involved: a cell spanning rows 0-1 needs both rows'
    // final heights decided before it knows how tall *it* ends up, but
    // row 1's own height may in turn depend on cells that only exist in
    // row 1. So: lay every origin cell out once at a placeholder y (box
    // height never depends on y, only on the already-known column
    // width) to learn its natural height, spread that height evenly
    // across every row it spans (CSS 2.1 §17.5.3's equal-distribution
    // rule, same one `spec.md` §4.10 names), *then* fix final row_y
    // positions, then stretch every spanning cell's box to cover the
    // full height of the rows it spans plus the border-spacing between
    // them (`spec.md` §8 scenario 6).
    let mut row_heights = vec![CSSPixels::ZERO; num_rows];
    let mut cell_boxes: Vec<Option<BoxId>> = vec![None; cells.len()];

    for r in 0..num_rows {
        for c in 0..grid[r].len() {
            let Some(cell_index) = grid[r][c] else { continue };
            let cell = &cells[cell_index];
            if cell.origin_row != r || cell.origin_col != c {
                continue;
            }

            let span_end = (c + cell.col_span).min(num_cols);
            let cell_width =
                col_widths[c..span_end].iter().copied().sum::<CSSPixels>() + spacing_h * (span_end - c).saturating_sub(1) as f32;

            if let Some(cell_box) = crate::block::layout_node(ctx, &cell.node, col_x[c], CSSPixels::ZERO, cell_width, Some(box_id)) {
                let outer_h = ctx.arena.get(cell_box).outer_height();
                let row_span = cell.row_span.max(1);
                let contribution = outer_h / row_span as f32;
                let row_end = (r + row_span).min(num_rows);
                for row_height in &mut row_heights[r..row_end] {
                    *row_height = row_height.max(contribution);
                }
                cell_boxes[cell_index] = Some(cell_box);
            }
        }
    }

    let mut row_y = vec![CSSPixels::ZERO; num_rows];
    let mut cursor_y = content_y + spacing_v;
    for r in 0..num_rows {
        row_y[r] = cursor_y;
        cursor_y += row_heights[r] + spacing_v;
    }

    for (cell, cell_box) in cells.iter().zip(cell_boxes.iter()) {
        let Some(cell_box) = cell_box else { continue };
        let row_end = (cell.origin_row + cell.row_span.max(1)).min(num_rows);
        let span_height = row_heights[cell.origin_row..row_end].iter().copied().sum::<CSSPixels>()
            + spacing_v * (row_end - cell.origin_row).saturating_sub(1) as f32;

        let b = ctx.arena.get(*cell_box);
        let dx = col_x[cell.origin_col] - b.x;
        let dy = row_y[cell.origin_row] - b.y;
        ctx.arena.shift_subtree(*cell_box, dx, dy);

        if cell.row_span > 1 {
            let b = ctx.arena.get_mut(*cell_box);
            b.height = (span_height - b.border.vertical_sum() - b.padding.vertical_sum()).clamp_non_negative();
        }
    }

    let total_height = cursor_y - content_y;
    total_height.clamp_non_negative()
}

fn cell_preferred_width<N: ElementNode>(ctx: &LayoutContext, cell: &GridCell<N>, table_width: CSSPixels) -> CSSPixels {
    let style = cell.node.style();
    match style.width() {
        AutoOr::NotAuto(LengthPercentage::Length(w)) => w,
        AutoOr::NotAuto(LengthPercentage::Percentage(p)) => table_width * p,
        AutoOr::Auto => compute_intrinsic_sizes(&cell.node, ctx.text_oracle, ctx.image_oracle).max_content,
    }
}
