//! The float context (`spec.md` §4.4): a stack of BFC boundaries over a
//! flat list of float records. Each block formatting context pushes its
//! own `float_base` on entry and queries are restricted to
//! `floats[float_base..]` so floats established inside a nested BFC
//! (e.g. a child with `overflow: hidden`) never leak into an ancestor's
//! line breaking — they are registered into the *parent* BFC only after
//! their own BFC has been popped, per the spec's explicit rule.

use crate::{pixels::CSSPixels, style::FloatSide};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatRecord {
    pub side: FloatSide,
    /// Outer-box horizontal extent, already including margins.
    pub left: CSSPixels,
    pub right: CSSPixels,
    /// Outer-box vertical extent: `[top, bottom)`.
    pub top: CSSPixels,
    pub bottom: CSSPixels,
}

impl FloatRecord {
    #[must_use]
    fn covers_y(&self, y: CSSPixels) -> bool {
        y >= self.top && y < self.bottom
    }
}

/// Guard against `drop_y` spinning forever on pathological float stacks
/// (`spec.md` §4.4, §5).
const MAX_DROP_STEPS: usize = 100;

#[derive(Clone, Debug, Default)]
pub struct FloatContext {
    floats: Vec<FloatRecord>,
    bfc_bases: Vec<usize>,
}

impl FloatContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new block formatting context; returns a token that must
    /// be passed to [`Self::pop_bfc`] when the BFC's content is done
    /// laying out.
    pub fn push_bfc(&mut self) -> usize {
        let base = self.floats.len();
        self.bfc_bases.push(base);
        base
    }

    /// Leave the current BFC, returning the floats it registered so the
    /// caller can re-register them (shifted into the parent's
    /// coordinate space) in the parent BFC, per `spec.md` §4.4: "Floats
    /// register themselves in the parent BFC after their own BFC is
    /// popped."
    pub fn pop_bfc(&mut self) -> Vec<FloatRecord> {
        let base = self.bfc_bases.pop().unwrap_or(0);
        self.floats.split_off(base)
    }

    fn current_base(&self) -> usize {
        self.bfc_bases.last().copied().unwrap_or(0)
    }

    fn active_floats(&self) -> &[FloatRecord] {
        &self.floats[self.current_base()..]
    }

    /// `offsets_at(Y)`: combined left/right intrusion from every float
    /// in the current BFC whose vertical span covers `Y`.
    #[must_use]
    pub fn offsets_at(&self, y: CSSPixels) -> (CSSPixels, CSSPixels) {
        let mut left = CSSPixels::ZERO;
        let mut right = CSSPixels::ZERO;
        for float in self.active_floats() {
            if float.covers_y(y) {
                match float.side {
                    FloatSide::Left => left = left.max(float.left),
                    FloatSide::Right => right = right.max(float.right),
                }
            }
        }
        (left, right)
    }

    /// `clear_y(side, Y)`: the first Y at or after `y` below every
    /// applicable float's margin-bottom edge.
    #[must_use]
    pub fn clear_y(&self, side: crate::style::Clear, y: CSSPixels) -> CSSPixels {
        let applies = |float_side: FloatSide| match side {
            crate::style::Clear::None => false,
            crate::style::Clear::Both => true,
            crate::style::Clear::Left => matches!(float_side, FloatSide::Left),
            crate::style::Clear::Right => matches!(float_side, FloatSide::Right),
        };
        let mut result = y;
        for float in self.active_floats() {
            if applies(float.side) {
                result = result.max(float.bottom);
            }
        }
        result
    }

    /// `drop_y(width, Y, available)`: advance `y` until `width` fits
    /// beside the active floats, or until it has moved past every
    /// active float's bottom edge. Bounded at [`MAX_DROP_STEPS`] to
    /// guarantee termination on pathological input (`spec.md` §5, §7).
    #[must_use]
    pub fn drop_y(&self, width: CSSPixels, y: CSSPixels, available: CSSPixels) -> CSSPixels {
        let mut candidate = y;
        for _ in 0..MAX_DROP_STEPS {
            let (left, right) = self.offsets_at(candidate);
            if width <= available - left - right {
                return candidate;
            }
            let next = self
                .active_floats()
                .iter()
                .filter(|f| f.covers_y(candidate))
                .map(|f| f.bottom)
                .fold(None, |acc: Option<CSSPixels>, b| Some(acc.map_or(b, |a| a.min(b))));
            match next {
                Some(next_y) if next_y > candidate => candidate = next_y,
                _ => break,
            }
        }
        log::warn!("float drop_y reached its iteration ceiling; using best-effort Y");
        candidate
    }

    /// Register a float's final geometry in the *current* BFC. Must be
    /// called after the float's own subtree layout so its dimensions
    /// are final (`spec.md` §4.4).
    pub fn register(&mut self, record: FloatRecord) {
        self.floats.push(record);
    }
}
