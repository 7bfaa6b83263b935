//! # Overflow Decisions
//!
//! What happens when an item doesn't fit the remaining height of the
//! current column. The decision is pure: the flow controller gathers the
//! facts (remaining space, whether the column is fresh, whether some
//! enclosing block has a spare column, the overflow policy) and acts on the
//! answer.

use crate::style::OverflowAction;

/// Slack for floating-point comparisons against remaining space.
pub const FIT_EPSILON: f64 = 1e-6;

/// What to do with an item of a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// It fits, or nothing has been placed in this column yet.
    Place,
    /// Continue in the next column of the innermost multi-column block.
    NextColumn,
    /// Finish the page and continue on a new one.
    NewPage,
    /// Place it anyway, extending past the bottom edge.
    Clip,
    /// Drop it and everything after it in the same block.
    Drop,
}

/// Facts about the current column gathered by the flow controller.
#[derive(Debug, Clone, Copy)]
pub struct BreakContext {
    pub remaining: f64,
    /// Nothing has been placed at any level of the open-block chain since
    /// the current column started.
    pub fresh: bool,
    pub has_spare_column: bool,
    /// False inside headers, footers and other detached layouts.
    pub can_paginate: bool,
    pub action: OverflowAction,
}

/// Decide how to place an item of `height`.
///
/// A fresh column always accepts the item, however tall: moving it would
/// only reproduce the same situation one column or page later.
pub fn decide_break(height: f64, ctx: &BreakContext) -> BreakDecision {
    if height <= ctx.remaining + FIT_EPSILON || ctx.fresh {
        return BreakDecision::Place;
    }

    if ctx.has_spare_column {
        return BreakDecision::NextColumn;
    }

    match ctx.action {
        OverflowAction::NewPage if ctx.can_paginate => BreakDecision::NewPage,
        OverflowAction::NewPage | OverflowAction::Clip => BreakDecision::Clip,
        OverflowAction::None => BreakDecision::Drop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(remaining: f64, action: OverflowAction) -> BreakContext {
        BreakContext {
            remaining,
            fresh: false,
            has_spare_column: false,
            can_paginate: true,
            action,
        }
    }

    #[test]
    fn everything_fits() {
        let decision = decide_break(40.0, &ctx(100.0, OverflowAction::NewPage));
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn exact_fit_places() {
        let decision = decide_break(100.0, &ctx(100.0, OverflowAction::None));
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn fresh_column_accepts_oversized_items() {
        let mut c = ctx(100.0, OverflowAction::NewPage);
        c.fresh = true;
        assert_eq!(decide_break(500.0, &c), BreakDecision::Place);
    }

    #[test]
    fn spare_column_comes_before_new_page() {
        let mut c = ctx(10.0, OverflowAction::NewPage);
        c.has_spare_column = true;
        assert_eq!(decide_break(20.0, &c), BreakDecision::NextColumn);
    }

    #[test]
    fn new_page_when_paginating() {
        let decision = decide_break(20.0, &ctx(10.0, OverflowAction::NewPage));
        assert_eq!(decision, BreakDecision::NewPage);
    }

    #[test]
    fn new_page_clips_in_detached_layout() {
        let mut c = ctx(10.0, OverflowAction::NewPage);
        c.can_paginate = false;
        assert_eq!(decide_break(20.0, &c), BreakDecision::Clip);
    }

    #[test]
    fn clip_and_drop_policies() {
        assert_eq!(
            decide_break(20.0, &ctx(10.0, OverflowAction::Clip)),
            BreakDecision::Clip
        );
        assert_eq!(
            decide_break(20.0, &ctx(10.0, OverflowAction::None)),
            BreakDecision::Drop
        );
    }
}
