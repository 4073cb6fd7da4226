//! Share fallback chain
//!
//! Sharing never fails from the user's point of view: each step that is
//! unavailable or rejected hands over to the next one.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShareStep {
    /// `navigator.share`
    Native,
    /// `navigator.clipboard.writeText`
    Clipboard,
    /// Show the link so the user can copy it by hand
    ShowLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShareOutcome {
    Shared,
    Copied,
    LinkShown,
}

impl ShareStep {
    pub fn outcome(self) -> ShareOutcome {
        match self {
            ShareStep::Native => ShareOutcome::Shared,
            ShareStep::Clipboard => ShareOutcome::Copied,
            ShareStep::ShowLink => ShareOutcome::LinkShown,
        }
    }
}

/// Ordered steps to try, given what the browser exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePlan {
    steps: Vec<ShareStep>,
}

impl SharePlan {
    pub fn new(has_native_share: bool, has_clipboard: bool) -> Self {
        let mut steps = Vec::with_capacity(3);
        if has_native_share {
            steps.push(ShareStep::Native);
        }
        if has_clipboard {
            steps.push(ShareStep::Clipboard);
        }
        steps.push(ShareStep::ShowLink);
        Self { steps }
    }

    pub fn steps(&self) -> &[ShareStep] {
        &self.steps
    }

    /// Status text to flash after a step succeeds
    pub fn toast(outcome: ShareOutcome) -> Option<&'static str> {
        match outcome {
            ShareOutcome::Copied => Some("Link copied to clipboard."),
            ShareOutcome::Shared | ShareOutcome::LinkShown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_chain() {
        let plan = SharePlan::new(true, true);
        assert_eq!(
            plan.steps(),
            &[ShareStep::Native, ShareStep::Clipboard, ShareStep::ShowLink]
        );
    }

    #[test]
    fn test_link_always_last_resort() {
        assert_eq!(SharePlan::new(false, false).steps(), &[ShareStep::ShowLink]);
        assert_eq!(
            SharePlan::new(false, true).steps(),
            &[ShareStep::Clipboard, ShareStep::ShowLink]
        );
    }

    #[test]
    fn test_toast_only_for_clipboard() {
        assert_eq!(
            SharePlan::toast(ShareStep::Clipboard.outcome()),
            Some("Link copied to clipboard.")
        );
        assert_eq!(SharePlan::toast(ShareOutcome::Shared), None);
    }
}
