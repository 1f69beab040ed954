//! A visual formatting engine: the subsystem that turns a styled
//! document tree into a tree of positioned, sized boxes obeying the
//! CSS 2.1 visual formatting model plus flex and basic table
//! extensions (`spec.md` §1).
//!
//! [`Engine`] is the crate's single public entry point. Everything else
//! — the block/inline formatters, the float context, the intrinsic
//! sizer, table and flex layout, absolute positioning and stacking
//! context construction — is an internal collaborator `Engine::layout`
//! drives in the order `spec.md` §2 describes. Document parsing, CSS
//! cascade, font shaping, image decoding and painting all live outside
//! this crate; this crate consumes them only through the oracles in
//! [`oracle`] and the read-only views in [`dom`] and [`style`].

pub mod absolute;
pub mod block;
pub mod context;
pub mod counters;
pub mod dom;
pub mod flex;
pub mod float_ctx;
pub mod fragment;
pub mod inline;
pub mod intrinsic;
pub mod margin;
pub mod oracle;
pub mod pixels;
pub mod pseudo;
pub mod stacking;
pub mod style;
pub mod table;
pub mod text;

pub use context::LayoutContext;
pub use dom::{ElementNode, NodeKind};
pub use fragment::{BoxArena, BoxId, Fragment, LayoutBox};
pub use intrinsic::{compute_intrinsic_sizes, IntrinsicSizes};
pub use oracle::{ImageLoadError, ImageOracle, MeasureTextOracle};
pub use pixels::{CSSPixels, Size};
pub use stacking::StackingContext;

use pixels::AutoOr;

/// The result of one `Engine::layout` call: the box arena, the ids of
/// the top-level boxes `layout` produced (one per in-flow top-level
/// child, `spec.md` §2's "invokes the block formatter on each
/// top-level in-flow child"), and the paint-order tree `spec.md` §4.12
/// builds from it.
#[derive(Debug)]
pub struct LayoutResult {
    pub arena: BoxArena,
    pub roots: Vec<BoxId>,
    pub stacking: StackingContext,
}

/// The engine surface `spec.md` §6 specifies. Owns the viewport, the
/// scroll offset `position: fixed` resolves against, and the two
/// external oracles; everything else (`LayoutContext`'s float stack,
/// counter store, box arena) is scoped to a single `layout` call rather
/// than living on `Engine` itself, per the Design Notes' §9 preference
/// for an explicit, scoped context over mutable engine-global state.
pub struct Engine<'a> {
    viewport: Size<CSSPixels>,
    scroll_y: CSSPixels,
    text_oracle: Option<&'a dyn MeasureTextOracle>,
    image_oracle: Option<&'a dyn ImageOracle>,
}

impl<'a> Engine<'a> {
    #[must_use]
    pub fn new(viewport_w: f64, viewport_h: f64) -> Self {
        Self {
            viewport: Size::new(CSSPixels(viewport_w as f32), CSSPixels(viewport_h as f32)),
            scroll_y: CSSPixels::ZERO,
            text_oracle: None,
            image_oracle: None,
        }
    }

    pub fn set_scroll_y(&mut self, y: f64) {
        self.scroll_y = CSSPixels(y as f32);
    }

    #[must_use]
    pub fn get_scroll_y(&self) -> f64 {
        self.scroll_y.0 as f64
    }

    /// The text-measurement oracle every text box, the intrinsic sizer
    /// and the inline formatter consult. Must be set before `layout` is
    /// called; `layout` panics otherwise, since there is no sensible
    /// fallback for "the engine cannot measure any text at all" (unlike
    /// the per-call fallbacks `spec.md` §7 describes, which only cover
    /// one oracle call failing, not the oracle being entirely absent).
    pub fn set_text_oracle(&mut self, oracle: &'a dyn MeasureTextOracle) {
        self.text_oracle = Some(oracle);
    }

    /// `spec.md` §6's `set_image_fetcher`. Optional — if never set,
    /// every replaced element falls back to the placeholder size §7
    /// mandates for a failed image load.
    pub fn set_image_fetcher(&mut self, oracle: &'a dyn ImageOracle) {
        self.image_oracle = Some(oracle);
    }

    /// Lay out `document`'s in-flow top-level children against the
    /// engine's viewport, in one synchronous pass (`spec.md` §5: no
    /// suspension point, not cancelable, not safe to call concurrently
    /// on the same `Engine`).
    #[must_use]
    pub fn layout<N: ElementNode>(&self, document: &N) -> LayoutResult {
        let text_oracle = self
            .text_oracle
            .expect("Engine::set_text_oracle must be called before Engine::layout");

        let mut ctx = LayoutContext::new(text_oracle, self.image_oracle, self.viewport, self.scroll_y);

        let mut roots = Vec::new();
        let mut y = CSSPixels::ZERO;
        for child in document.children() {
            if child.is_element() && child.style().display().is_none() {
                continue;
            }
            if let Some(id) = block::layout_node(&mut ctx, &child, CSSPixels::ZERO, y, self.viewport.width, None) {
                let b = ctx.arena.get(id);
                y = b.y + b.outer_height() - b.margin.top;
                roots.push(id);
            }
        }

        // §4.6: absolute/fixed boxes are positioned only once every
        // containing block in the document has finished sizing.
        absolute::resolve_pending_absolutes(&mut ctx);

        let stacking = build_stacking_tree(&ctx, &roots);

        LayoutResult {
            arena: ctx.arena,
            roots,
            stacking,
        }
    }
}

/// Walk the finished box tree in parent-before-children order, building
/// the flat `(StackingInput, parent_index)` description
/// [`stacking::build_stacking_tree`] wants. Every box carries its own
/// stacking-relevant style bits (`z_index`, `opacity`, `has_transform`)
/// directly (`fragment::LayoutBox` fields) rather than the tree holding
/// a back-reference into the input document, so this needs no access to
/// the original element tree at all.
fn build_stacking_tree(ctx: &LayoutContext, roots: &[BoxId]) -> StackingContext {
    let mut nodes = Vec::new();
    let mut parent_of = Vec::new();

    // `stack` holds `(box_id, nearest_stacking_ancestor_index)` pairs;
    // a box becomes its descendants' `nearest_stacking_ancestor_index`
    // only once it is pushed into `nodes` itself (i.e. only when it
    // creates a context), matching `spec.md` §4.12's "non-creating
    // boxes' descendants belong to the nearest creating ancestor".
    let mut stack: Vec<(BoxId, Option<usize>)> = roots.iter().rev().map(|&id| (id, None)).collect();

    while let Some((box_id, ancestor)) = stack.pop() {
        let b = ctx.arena.get(box_id);
        let z_index = b.z_index;
        let creates = (b.position.is_positioned() && z_index.is_some()) || b.opacity < 1.0 || b.has_transform;

        let this_index = if creates {
            nodes.push(stacking::StackingInput {
                box_id,
                z_index,
                opacity: b.opacity,
                has_transform: b.has_transform,
                children: b.children.len(),
            });
            parent_of.push(ancestor);
            Some(nodes.len() - 1)
        } else {
            ancestor
        };

        for &child in b.children.iter().rev() {
            stack.push((child, this_index));
        }
    }

    stacking::build_stacking_tree(ctx, &nodes, &parent_of)
}
