#![warn(missing_docs)]
//! # cyber-shield-analysis-contract
//!
//! ## Purpose
//! Defines the provider output schema for scam risk analysis and the
//! client-side mapping from scores to display bands.
//!
//! ## Responsibilities
//! - Publish the two-field output schema sent with every provider request.
//! - Parse and schema-validate raw provider output into a
//!   [`RiskAnalysisResult`].
//! - Map scores to [`RiskBand`] and project results into [`RiskPresentation`].
//!
//! ## Data flow
//! Raw completion text -> [`parse_risk_response`] -> [`RiskAnalysisResult`] ->
//! [`present_risk`] -> checker UI state.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned so they can outlive the transient network buffer.
//!
//! ## Error model
//! Non-JSON output, schema violations and unusable values return
//! [`ContractError`]. No partially populated result is ever produced.
//!
//! ## Security and privacy notes
//! Only model output is handled here. Summaries are treated as untrusted
//! display text and are never interpreted.

use std::sync::OnceLock;

use cyber_shield_core::{CoreError, RiskAnalysisResult, is_score_in_range};
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Name under which the output schema is registered with the provider.
pub const RISK_RESPONSE_SCHEMA_NAME: &str = "scam_risk_analysis";

/// Scores strictly above this value are [`RiskBand::High`].
pub const HIGH_BAND_THRESHOLD: f64 = 75.0;

/// Scores strictly above this value (and not high) are [`RiskBand::Medium`].
pub const MEDIUM_BAND_THRESHOLD: f64 = 40.0;

/// Discrete severity bucket derived from a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    /// Score of 40 or less.
    Low,
    /// Score above 40 up to and including 75.
    Medium,
    /// Score above 75.
    High,
}

impl RiskBand {
    /// Maps a score to its band.
    ///
    /// Thresholds are exclusive on the upper band: exactly 75 is medium and
    /// exactly 40 is low.
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_BAND_THRESHOLD {
            Self::High
        } else if score > MEDIUM_BAND_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Progress bar tone for this band.
    pub fn tone(self) -> ProgressTone {
        match self {
            Self::Low => ProgressTone::Green,
            Self::Medium => ProgressTone::Yellow,
            Self::High => ProgressTone::Red,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress bar color used by the checker result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTone {
    /// Low risk.
    Green,
    /// Medium risk.
    Yellow,
    /// High risk.
    Red,
}

impl ProgressTone {
    /// Stylesheet class applied to the progress indicator.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Green => "bg-green-500",
            Self::Yellow => "bg-yellow-500",
            Self::Red => "bg-red-500",
        }
    }
}

/// Display-ready projection of one analysis result.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskPresentation {
    /// Score as returned, already clamped into range.
    pub score: f64,
    /// Severity band.
    pub band: RiskBand,
    /// Alert title, for example `Risk Score: 82 / 100`.
    pub title: String,
    /// Progress bar value in `[0, 100]`.
    pub progress: u8,
    /// Whether the alert uses the destructive style.
    pub destructive: bool,
    /// Progress bar tone.
    pub tone: ProgressTone,
    /// Model reasoning shown under the score.
    pub summary: String,
}

/// Projects a result into display fields.
pub fn present_risk(result: &RiskAnalysisResult) -> RiskPresentation {
    let band = RiskBand::from_score(result.risk_score);
    RiskPresentation {
        score: result.risk_score,
        band,
        title: format!("Risk Score: {} / 100", result.risk_score),
        progress: result.rounded_score(),
        destructive: band == RiskBand::High,
        tone: band.tone(),
        summary: result.summary.clone(),
    }
}

/// Returns the JSON schema of the provider output.
pub fn risk_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "riskScore": {
                "type": "number",
                "description": "The risk score of the text being a scam (0-100)."
            },
            "summary": {
                "type": "string",
                "minLength": 1,
                "description": "A summary explanation of why the text is potentially a scam."
            }
        },
        "required": ["riskScore", "summary"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RiskResponseWire {
    risk_score: f64,
    summary: String,
}

/// Parses raw provider output into a validated result.
///
/// A single surrounding markdown code fence is tolerated. Extra fields are
/// ignored. Finite out-of-range scores are clamped and logged.
///
/// # Errors
/// Returns [`ContractError::Decode`] for non-JSON output,
/// [`ContractError::SchemaViolation`] when the payload does not match
/// [`risk_response_schema`], and [`ContractError::InvalidContract`] for blank
/// summaries.
pub fn parse_risk_response(raw: &str) -> Result<RiskAnalysisResult, ContractError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body).map_err(ContractError::Decode)?;

    validate_against_schema(&value)?;

    let wire: RiskResponseWire = serde_json::from_value(value).map_err(ContractError::Decode)?;
    if !is_score_in_range(wire.risk_score) {
        tracing::warn!(
            risk_score = wire.risk_score,
            "provider returned out-of-range risk score, clamping"
        );
    }

    RiskAnalysisResult::from_model_output(wire.risk_score, wire.summary)
        .map_err(ContractError::InvalidContract)
}

/// Validates an already decoded payload against the output schema.
///
/// # Errors
/// Returns [`ContractError::SchemaViolation`] listing every violation.
pub fn validate_against_schema(value: &Value) -> Result<(), ContractError> {
    let validator = response_validator()?;
    validator.validate(value).map_err(|errors| {
        let details = errors
            .map(|error| format!("{}: {}", error.instance_path, error))
            .collect::<Vec<_>>()
            .join("; ");
        ContractError::SchemaViolation(details)
    })
}

fn response_validator() -> Result<&'static JSONSchema, ContractError> {
    static VALIDATOR: OnceLock<Result<JSONSchema, String>> = OnceLock::new();
    VALIDATOR
        .get_or_init(|| {
            let schema = risk_response_schema();
            JSONSchema::compile(&schema).map_err(|error| error.to_string())
        })
        .as_ref()
        .map_err(|error| ContractError::SchemaCompile(error.clone()))
}

/// Removes one surrounding markdown code fence, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // The opening fence line holds an info string (`json`), the payload, or both.
    let first_line_end = inner.find('\n').unwrap_or(inner.len());
    let body = match inner[..first_line_end].find(['{', '[']) {
        Some(payload_start) => &inner[payload_start..],
        None => &inner[first_line_end..],
    };
    body.trim()
}

/// Output contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Output was not valid JSON or did not decode into the wire shape.
    #[error("risk response decode failure: {0}")]
    Decode(#[source] serde_json::Error),
    /// Output violated the declared schema.
    #[error("risk response schema violation: {0}")]
    SchemaViolation(String),
    /// Output matched the schema but carried unusable values.
    #[error("risk response contract violation: {0}")]
    InvalidContract(#[source] CoreError),
    /// Embedded schema failed to compile.
    #[error("risk response schema failed to compile: {0}")]
    SchemaCompile(String),
}
