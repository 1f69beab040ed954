//! Margin collapsing primitives (`spec.md` §4.5). The block formatter
//! owns the traversal — deciding which boxes participate, which runs of
//! siblings collapse through, when a parent absorbs its first/last
//! child's margin — and calls into these pure helpers to do the actual
//! arithmetic.

use crate::{
    pixels::CSSPixels,
    style::{Display, Float, Overflow, StyleView},
};

/// Combine an arbitrary set of adjoining margins: the maximum of the
/// positive ones plus the minimum (most negative) of the negative ones.
/// For exactly two margins this reduces to the three cases `spec.md`
/// spells out (`max` when both non-negative, `min` when both negative,
/// plain sum when mixed-sign), but stated this way it generalizes
/// directly to collapse-through runs of arbitrary length.
#[must_use]
pub fn combine_margins(margins: &[CSSPixels]) -> CSSPixels {
    let max_positive = margins
        .iter()
        .copied()
        .filter(|m| m.0 >= 0.0)
        .fold(CSSPixels::ZERO, CSSPixels::max);
    let min_negative = margins
        .iter()
        .copied()
        .filter(|m| m.0 < 0.0)
        .fold(CSSPixels::ZERO, CSSPixels::min);
    max_positive + min_negative
}

#[must_use]
pub fn combine_two(a: CSSPixels, b: CSSPixels) -> CSSPixels {
    combine_margins(&[a, b])
}

/// Whether a box with this style participates in margin collapsing at
/// all. `is_body` lets the caller apply the reference's extra rule that
/// excludes the document's `<body>` element, which this crate has no
/// other way to recognize since tag matching is the caller's concern.
#[must_use]
pub fn participates_in_collapsing(style: &dyn StyleView, is_body: bool) -> bool {
    !is_body
        && style.float() == Float::None
        && !style.position().is_absolutely_positioned()
        && !style.display().is_inline_level()
        && !style.display().is_flex()
        && style.overflow().is_visible()
}

/// A box is "collapse-through" when it contributes nothing of its own
/// between its top and bottom margins: zero height, no top/bottom
/// border or padding, and (transitively) only collapse-through in-flow
/// children. The block formatter determines the last condition by
/// recursing; this just checks the box's own contribution.
#[must_use]
pub fn has_zero_self_extent(style: &dyn StyleView) -> bool {
    style.border_top_width().is_zero()
        && style.border_bottom_width().is_zero()
        && style.padding_top().resolve_against(CSSPixels::ZERO).is_zero()
        && style.padding_bottom().resolve_against(CSSPixels::ZERO).is_zero()
}

/// Accumulates the pending margins of a run of collapse-through
/// siblings, to be folded into the next non-collapse-through
/// neighbor's combination.
#[derive(Clone, Debug, Default)]
pub struct PendingMargins {
    values: Vec<CSSPixels>,
}

impl PendingMargins {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, margin: CSSPixels) {
        self.values.push(margin);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Combine every pending margin together with `with`, clearing the
    /// pending run.
    pub fn resolve_with(&mut self, with: CSSPixels) -> CSSPixels {
        self.values.push(with);
        let result = combine_margins(&self.values);
        self.values.clear();
        result
    }
}

/// Whether the parent absorbs its first in-flow child's top margin
/// (`spec.md` §4.5 "Parent-child collapse (top)").
#[must_use]
pub fn parent_absorbs_child_top_margin(parent_style: &dyn StyleView, parent_is_body: bool) -> bool {
    participates_in_collapsing(parent_style, parent_is_body)
        && parent_style.border_top_width().is_zero()
        && parent_style.padding_top().resolve_against(CSSPixels::ZERO).is_zero()
}

/// Whether the parent absorbs its last in-flow child's bottom margin
/// (`spec.md` §4.5 "Parent-child collapse (bottom)").
#[must_use]
pub fn parent_absorbs_child_bottom_margin(
    parent_style: &dyn StyleView,
    parent_is_body: bool,
    parent_height_is_auto: bool,
) -> bool {
    participates_in_collapsing(parent_style, parent_is_body)
        && parent_height_is_auto
        && parent_style.border_bottom_width().is_zero()
        && parent_style.padding_bottom().resolve_against(CSSPixels::ZERO).is_zero()
        && !parent_style.position().is_absolutely_positioned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_two_nonnegative_margins_takes_max() {
        assert_eq!(combine_two(CSSPixels(20.0), CSSPixels(30.0)), CSSPixels(30.0));
    }

    #[test]
    fn combine_two_negative_margins_takes_min() {
        assert_eq!(combine_two(CSSPixels(-10.0), CSSPixels(-5.0)), CSSPixels(-10.0));
    }

    #[test]
    fn combine_mixed_sign_sums() {
        assert_eq!(combine_two(CSSPixels(20.0), CSSPixels(-5.0)), CSSPixels(15.0));
    }

    #[test]
    fn collapse_through_run_folds_into_next_margin() {
        let mut pending = PendingMargins::new();
        pending.push(CSSPixels(10.0));
        pending.push(CSSPixels(-3.0));
        let resolved = pending.resolve_with(CSSPixels(20.0));
        // positives: 10, 20 -> max 20; negatives: -3 -> min -3; 20 + -3 = 17
        assert_eq!(resolved, CSSPixels(17.0));
        assert!(pending.is_empty());
    }
}
