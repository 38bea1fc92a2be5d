#![warn(missing_docs)]
//! # cyber-shield-core
//!
//! ## Purpose
//! Defines the transient data model of the scam risk checker.
//!
//! ## Responsibilities
//! - Validate raw checker input against the `[50, 5000]` character bound,
//!   counted in UTF-16 code units so limits agree with the browser form.
//! - Represent the validated request and the provider-derived result.
//! - Derive log-safe request fingerprints.
//!
//! ## Data flow
//! Form text -> [`RiskAnalysisRequest::new`] -> classifier ->
//! [`RiskAnalysisResult`] -> presentation mapping.
//!
//! ## Ownership and lifetimes
//! Requests and results own their strings. Both are constructed once per check
//! and never mutated afterwards.
//!
//! ## Error model
//! Bound violations and malformed model values return [`CoreError`]. Each
//! validation variant carries the field-level message shown next to the form.
//!
//! ## Security and privacy notes
//! Request text is user content and must never be logged. Use
//! [`request_fingerprint`] to correlate log lines instead.
//!
//! ## Example
//! ```rust
//! use cyber_shield_core::{RiskAnalysisRequest, validate_risk_text};
//!
//! assert!(validate_risk_text("too short").is_err());
//! let request = RiskAnalysisRequest::new("a".repeat(50)).expect("50 chars is enough");
//! assert_eq!(request.char_len(), 50);
//! // One emoji is two UTF-16 code units.
//! assert!(validate_risk_text(&"😀".repeat(25)).is_ok());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Minimum accepted checker input length, in UTF-16 code units.
pub const MIN_RISK_TEXT_CHARS: usize = 50;

/// Maximum accepted checker input length, in UTF-16 code units.
pub const MAX_RISK_TEXT_CHARS: usize = 5000;

/// Lowest risk score.
pub const MIN_RISK_SCORE: f64 = 0.0;

/// Highest risk score.
pub const MAX_RISK_SCORE: f64 = 100.0;

const FINGERPRINT_HEX_LEN: usize = 16;

/// Validated text submitted for scam risk analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAnalysisRequest {
    text: String,
}

impl RiskAnalysisRequest {
    /// Validates and wraps checker input.
    ///
    /// The text is kept byte-for-byte; it is not trimmed or truncated.
    ///
    /// # Errors
    /// Returns [`CoreError::TextTooShort`] or [`CoreError::TextTooLong`] when
    /// the character count falls outside `[50, 5000]`.
    pub fn new(text: impl Into<String>) -> Result<Self, CoreError> {
        let text = text.into();
        validate_risk_text(&text)?;
        Ok(Self { text })
    }

    /// Returns the submitted text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the text length as validated, in UTF-16 code units.
    pub fn char_len(&self) -> usize {
        utf16_len(&self.text)
    }

    /// Returns the log-safe fingerprint of this request.
    pub fn fingerprint(&self) -> String {
        request_fingerprint(&self.text)
    }

    /// Consumes the request and returns the owned text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Risk score and reasoning returned for one analyzed text.
///
/// Serializes with the wire field names `riskScore` and `summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysisResult {
    /// Score in `[0, 100]`; higher means more likely a scam.
    pub risk_score: f64,
    /// Free-text explanation of the score.
    pub summary: String,
}

impl RiskAnalysisResult {
    /// Builds a result from raw model output.
    ///
    /// Finite scores outside `[0, 100]` are clamped into range.
    ///
    /// # Errors
    /// Returns [`CoreError::NonFiniteScore`] for NaN or infinite scores and
    /// [`CoreError::EmptySummary`] when the summary is blank.
    pub fn from_model_output(risk_score: f64, summary: impl Into<String>) -> Result<Self, CoreError> {
        if !risk_score.is_finite() {
            return Err(CoreError::NonFiniteScore);
        }

        let summary = summary.into();
        if summary.trim().is_empty() {
            return Err(CoreError::EmptySummary);
        }

        Ok(Self {
            risk_score: clamp_risk_score(risk_score),
            summary,
        })
    }

    /// Returns the score rounded to the nearest whole number.
    pub fn rounded_score(&self) -> u8 {
        clamp_risk_score(self.risk_score).round() as u8
    }
}

/// Returns `true` when `score` lies inside `[0, 100]`.
pub fn is_score_in_range(score: f64) -> bool {
    (MIN_RISK_SCORE..=MAX_RISK_SCORE).contains(&score)
}

/// Clamps a finite score into `[0, 100]`.
pub fn clamp_risk_score(score: f64) -> f64 {
    score.clamp(MIN_RISK_SCORE, MAX_RISK_SCORE)
}

/// Counts `text` the way a browser `String.length` does.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Checks checker input length without taking ownership.
///
/// Characters outside the Basic Multilingual Plane count twice.
///
/// # Errors
/// Returns [`CoreError::TextTooShort`] below 50 code units and
/// [`CoreError::TextTooLong`] above 5000 code units.
pub fn validate_risk_text(text: &str) -> Result<(), CoreError> {
    let actual = utf16_len(text);
    if actual < MIN_RISK_TEXT_CHARS {
        return Err(CoreError::TextTooShort {
            min: MIN_RISK_TEXT_CHARS,
            actual,
        });
    }

    if actual > MAX_RISK_TEXT_CHARS {
        return Err(CoreError::TextTooLong {
            max: MAX_RISK_TEXT_CHARS,
            actual,
        });
    }

    Ok(())
}

/// Derives a short, stable SHA-256 hex fingerprint for log correlation.
pub fn request_fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_HEX_LEN);
    encoded
}

/// Error type for checker input validation and result construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Input text is shorter than the minimum.
    #[error("text has {actual} characters, at least {min} required")]
    TextTooShort {
        /// Minimum character count.
        min: usize,
        /// Submitted character count.
        actual: usize,
    },
    /// Input text is longer than the maximum.
    #[error("text has {actual} characters, at most {max} allowed")]
    TextTooLong {
        /// Maximum character count.
        max: usize,
        /// Submitted character count.
        actual: usize,
    },
    /// Model score was NaN or infinite.
    #[error("risk score is not a finite number")]
    NonFiniteScore,
    /// Model summary was blank.
    #[error("summary is empty")]
    EmptySummary,
}

impl CoreError {
    /// Returns the field-level message shown under the checker input.
    pub fn field_message(&self) -> Option<&'static str> {
        match self {
            Self::TextTooShort { .. } => Some("Please enter at least 50 characters to analyze."),
            Self::TextTooLong { .. } => Some("Text cannot be longer than 5000 characters."),
            Self::NonFiniteScore | Self::EmptySummary => None,
        }
    }

    /// Returns `true` for input-bound violations.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::TextTooShort { .. } | Self::TextTooLong { .. })
    }
}
