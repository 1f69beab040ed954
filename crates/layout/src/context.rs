//! The mutable state threaded through one `Engine::layout` pass: the box
//! arena being built, the float context, the counter store and the two
//! external oracles. Grouping them here keeps every formatter's
//! signature manageable instead of growing a new parameter each time a
//! module needs one more piece of shared state.

use crate::{
    counters::CounterStore,
    float_ctx::FloatContext,
    fragment::BoxArena,
    oracle::{ImageOracle, MeasureTextOracle},
    pixels::{CSSPixels, Size},
};

pub struct LayoutContext<'a> {
    pub arena: BoxArena,
    pub floats: FloatContext,
    pub counters: CounterStore,
    pub text_oracle: &'a dyn MeasureTextOracle,
    pub image_oracle: Option<&'a dyn ImageOracle>,
    pub viewport: Size<CSSPixels>,
    pub scroll_y: CSSPixels,
    /// Boxes awaiting absolute/fixed placement, collected while the main
    /// recursive pass builds the box tree (`spec.md` §4.6: resolved only
    /// once the element's own subtree is fully sized).
    pub pending_absolute: Vec<crate::absolute::PendingAbsolute>,
}

impl<'a> LayoutContext<'a> {
    #[must_use]
    pub fn new(
        text_oracle: &'a dyn MeasureTextOracle,
        image_oracle: Option<&'a dyn ImageOracle>,
        viewport: Size<CSSPixels>,
        scroll_y: CSSPixels,
    ) -> Self {
        Self {
            arena: BoxArena::new(),
            floats: FloatContext::new(),
            counters: CounterStore::new(),
            text_oracle,
            image_oracle,
            viewport,
            scroll_y,
            pending_absolute: Vec::new(),
        }
    }
}
