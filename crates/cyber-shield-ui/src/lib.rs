#![warn(missing_docs)]
//! # cyber-shield-ui
//!
//! ## Purpose
//! Defines the UI-facing state of the scam risk checker form.
//!
//! ## Responsibilities
//! - Gate submissions on input validation so invalid text never reaches the
//!   provider.
//! - Track the pending state while an analysis is outstanding.
//! - Collapse every failure kind into one user-visible notice.
//!
//! ## Data flow
//! Submit event -> [`CheckerState::begin_submission`] -> (caller runs the
//! analysis) -> [`CheckerState::finish_with_result`] or
//! [`CheckerState::finish_with_failure`].
//!
//! ## Ownership and lifetimes
//! `CheckerState` owns its text and presentation so event reducers never
//! borrow from the analysis pipeline.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. Out-of-order
//! events are ignored rather than panicking.
//!
//! ## Security and privacy notes
//! The submitted text stays in the form state only; it is never rendered into
//! notices or logs.

use cyber_shield_analysis_contract::{RiskPresentation, present_risk};
use cyber_shield_core::{RiskAnalysisRequest, RiskAnalysisResult};

/// Title of the failure notice.
pub const FAILURE_TITLE: &str = "Analysis Failed";

/// Body of the failure notice.
pub const FAILURE_DESCRIPTION: &str =
    "There was an error processing your request. Please try again later.";

/// Destructive toast shown when an analysis fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    /// Short title.
    pub title: &'static str,
    /// Explanation shown to the user.
    pub description: &'static str,
}

impl FailureNotice {
    /// The single generic failure notice.
    pub fn generic() -> Self {
        Self {
            title: FAILURE_TITLE,
            description: FAILURE_DESCRIPTION,
        }
    }
}

/// Checker lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckerStatus {
    /// Nothing submitted yet, or the last submission failed validation.
    Idle,
    /// Analysis in flight.
    Analyzing,
    /// Last analysis succeeded.
    Completed(RiskPresentation),
    /// Last analysis failed.
    Failed(FailureNotice),
}

/// Aggregate checker form state.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckerState {
    /// Current text area contents.
    pub text: String,
    /// Field-level validation message, if any.
    pub field_error: Option<&'static str>,
    /// Lifecycle status.
    pub status: CheckerStatus,
}

impl CheckerState {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self {
            text: String::new(),
            field_error: None,
            status: CheckerStatus::Idle,
        }
    }

    /// Replaces the text area contents.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Returns `true` when the submit button is enabled.
    pub fn is_submit_enabled(&self) -> bool {
        !self.is_loading()
    }

    /// Returns `true` while an analysis is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self.status, CheckerStatus::Analyzing)
    }

    /// Validates the current text and, on success, enters `Analyzing`.
    ///
    /// Returns the request to analyze, or `None` when validation failed or an
    /// analysis is already running. On failure the field message is set and
    /// the previous status is kept.
    pub fn begin_submission(&mut self) -> Option<RiskAnalysisRequest> {
        if self.is_loading() {
            return None;
        }

        match RiskAnalysisRequest::new(self.text.clone()) {
            Ok(request) => {
                self.field_error = None;
                self.status = CheckerStatus::Analyzing;
                Some(request)
            }
            Err(error) => {
                self.field_error = error.field_message();
                None
            }
        }
    }

    /// Records a successful analysis.
    pub fn finish_with_result(&mut self, result: &RiskAnalysisResult) {
        if self.is_loading() {
            self.status = CheckerStatus::Completed(present_risk(result));
        }
    }

    /// Records a failed analysis.
    pub fn finish_with_failure(&mut self) {
        if self.is_loading() {
            self.status = CheckerStatus::Failed(FailureNotice::generic());
        }
    }

    /// Returns the displayed result, if any.
    pub fn presentation(&self) -> Option<&RiskPresentation> {
        match &self.status {
            CheckerStatus::Completed(presentation) => Some(presentation),
            _ => None,
        }
    }
}

impl Default for CheckerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for checker form gates.

    use super::*;
    use cyber_shield_analysis_contract::RiskBand;

    #[test]
    fn short_text_sets_field_error_without_submitting() {
        let mut state = CheckerState::new();
        state.set_text("too short");

        assert!(state.begin_submission().is_none());
        assert_eq!(
            state.field_error,
            Some("Please enter at least 50 characters to analyze.")
        );
        assert_eq!(state.status, CheckerStatus::Idle);
    }

    #[test]
    fn submission_clears_previous_result_and_blocks_resubmit() {
        let mut state = CheckerState::new();
        state.set_text("x".repeat(60));
        assert!(state.begin_submission().is_some());
        state.finish_with_result(
            &RiskAnalysisResult::from_model_output(30.0, "looks fine").expect("valid result"),
        );
        assert_eq!(state.presentation().map(|p| p.band), Some(RiskBand::Low));

        assert!(state.begin_submission().is_some());
        assert!(state.presentation().is_none());
        assert!(!state.is_submit_enabled());
        assert!(state.begin_submission().is_none());
    }

    #[test]
    fn failure_uses_generic_notice() {
        let mut state = CheckerState::new();
        state.set_text("y".repeat(60));
        state.begin_submission();
        state.finish_with_failure();

        assert_eq!(state.status, CheckerStatus::Failed(FailureNotice::generic()));
        assert!(state.is_submit_enabled());
    }
}
