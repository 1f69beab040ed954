//! The stacking context builder (`spec.md` §4.12), run once after the
//! box tree is complete.

use crate::{context::LayoutContext, fragment::BoxId};

#[derive(Clone, Debug, Default)]
pub struct StackingContext {
    pub box_id: Option<BoxId>,
    pub z_index: i32,
    pub negative: Vec<StackingContext>,
    pub zero: Vec<StackingContext>,
    pub positive: Vec<StackingContext>,
}

/// Whether `box_id` creates its own stacking context: positioned with an
/// explicit `z-index`, non-fully-opaque, or transformed.
fn creates_stacking_context(ctx: &LayoutContext, box_id: BoxId, z_index: Option<i32>, opacity: f32, has_transform: bool) -> bool {
    let b = ctx.arena.get(box_id);
    (b.position.is_positioned() && z_index.is_some()) || opacity < 1.0 || has_transform
}

/// Per-box metadata the box arena itself doesn't carry (opacity,
/// transform, explicit vs. auto z-index) — the caller supplies it
/// alongside the box id since those properties live on the style view,
/// not on [`crate::fragment::LayoutBox`].
#[derive(Clone, Copy, Debug)]
pub struct StackingInput {
    pub box_id: BoxId,
    pub z_index: Option<i32>,
    pub opacity: f32,
    pub has_transform: bool,
    pub children: usize,
}

/// Build the stacking tree from a flat, parent-ordered description of
/// which boxes create contexts. `nodes` must be in the same depth-first,
/// parent-before-children order the box arena was built in; `child_of`
/// maps each node's index in `nodes` to its nearest stacking-context-
/// creating ancestor's index (or `None` for the root).
pub fn build_stacking_tree(ctx: &LayoutContext, nodes: &[StackingInput], parent_of: &[Option<usize>]) -> StackingContext {
    let mut contexts: Vec<StackingContext> = nodes
        .iter()
        .map(|n| StackingContext {
            box_id: Some(n.box_id),
            z_index: n.z_index.unwrap_or(0),
            negative: Vec::new(),
            zero: Vec::new(),
            positive: Vec::new(),
        })
        .collect();

    let mut root = StackingContext::default();

    // Group children under their parent context, preserving document
    // order within each bucket before the final sort.
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut root_children: Vec<usize> = Vec::new();
    for (i, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(p) => children_of[*p].push(i),
            None => root_children.push(i),
        }
    }

    // Process children before parents so a parent's buckets are
    // populated with fully-built subtrees.
    for i in (0..nodes.len()).rev() {
        let mut negative = Vec::new();
        let mut zero = Vec::new();
        let mut positive = Vec::new();
        for &child_idx in &children_of[i] {
            let child = std::mem::take(&mut contexts[child_idx]);
            bucket(child, &mut negative, &mut zero, &mut positive);
        }
        sort_by_z_index(&mut negative);
        sort_by_z_index(&mut positive);
        contexts[i].negative = negative;
        contexts[i].zero = zero;
        contexts[i].positive = positive;
    }

    let mut negative = Vec::new();
    let mut zero = Vec::new();
    let mut positive = Vec::new();
    for &root_idx in &root_children {
        let child = std::mem::take(&mut contexts[root_idx]);
        bucket(child, &mut negative, &mut zero, &mut positive);
    }
    sort_by_z_index(&mut negative);
    sort_by_z_index(&mut positive);
    root.negative = negative;
    root.zero = zero;
    root.positive = positive;

    let _ = ctx;
    root
}

fn bucket(context: StackingContext, negative: &mut Vec<StackingContext>, zero: &mut Vec<StackingContext>, positive: &mut Vec<StackingContext>) {
    if context.z_index < 0 {
        negative.push(context);
    } else if context.z_index > 0 {
        positive.push(context);
    } else {
        zero.push(context);
    }
}

fn sort_by_z_index(bucket: &mut [StackingContext]) {
    bucket.sort_by_key(|c| c.z_index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fragment::LayoutBox, oracle::MonospaceOracle, pixels::{CSSPixels, Size}};

    #[test]
    fn buckets_and_sorts_by_z_index() {
        let oracle = MonospaceOracle;
        let mut ctx = LayoutContext::new(&oracle, None, Size::new(CSSPixels(800.0), CSSPixels(600.0)), CSSPixels::ZERO);
        let root = ctx.arena.alloc(LayoutBox::new("div"));
        let a = ctx.arena.alloc(LayoutBox::new("div"));
        let b = ctx.arena.alloc(LayoutBox::new("div"));
        let c = ctx.arena.alloc(LayoutBox::new("div"));

        let nodes = vec![
            StackingInput { box_id: a, z_index: Some(5), opacity: 1.0, has_transform: false, children: 0 },
            StackingInput { box_id: b, z_index: Some(-3), opacity: 1.0, has_transform: false, children: 0 },
            StackingInput { box_id: c, z_index: Some(1), opacity: 1.0, has_transform: false, children: 0 },
        ];
        let parent_of = vec![None, None, None];
        let _ = root;
        let tree = build_stacking_tree(&ctx, &nodes, &parent_of);

        assert_eq!(tree.negative.len(), 1);
        assert_eq!(tree.negative[0].z_index, -3);
        assert_eq!(tree.positive.iter().map(|c| c.z_index).collect::<Vec<_>>(), vec![1, 5]);
    }
}
