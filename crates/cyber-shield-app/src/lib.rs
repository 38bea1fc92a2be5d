#![warn(missing_docs)]
//! # cyber-shield-app
//!
//! ## Purpose
//! Orchestrates validation, classification, presentation, records and
//! sessions for `cyber-shield`.
//!
//! ## Responsibilities
//! - Run the scam risk check: validate first, then classify.
//! - Drive the checker UI state through one submission.
//! - Check report fields, then attach checker results to new scam reports.
//! - Honor the analysis kill switch and build provider-backed classifiers
//!   from configuration.
//!
//! ## Data flow
//! Form text -> [`analyze_scam_risk`] -> `RiskClassifier` -> result ->
//! `CheckerState` projection, optionally -> [`report_scam_with_assessment`].
//!
//! ## Ownership and lifetimes
//! The classifier and store are borrowed as trait objects for the duration of
//! one call; no request state outlives the call.
//!
//! ## Error model
//! Validation, provider and schema failures are wrapped in [`AnalysisError`].
//! Report form, record, session and configuration failures are wrapped in
//! [`AppError`].
//! Every failure is scoped to one request.
//!
//! ## Security and privacy notes
//! - Invalid text never reaches the provider.
//! - The kill-switch env var stops all provider traffic at runtime.
//! - Logs identify requests by fingerprint and redact secret markers.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use cyber_shield_analysis_contract::ContractError;
use cyber_shield_auth::AuthError;
use cyber_shield_classifier::{
    ClassifierError, HttpCompletionTransport, ProviderError, RiskAnalysisClient, RiskClassifier,
};
use cyber_shield_core::{CoreError, RiskAnalysisRequest, RiskAnalysisResult, validate_risk_text};
use cyber_shield_store::{NewScam, ReportError, Scam, ScamStore, StoreError};
use cyber_shield_ui::{CheckerState, FAILURE_DESCRIPTION};
use thiserror::Error;

pub mod config;
pub mod logging;

pub use cyber_shield_classifier::redact_sensitive;
pub use config::{AppConfig, ConfigError, LoggingConfig, ProviderConfig};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("CYBER_SHIELD_VERSION");

/// Env var that disables the checker when set to `0`, `false` or `off`.
pub const ANALYSIS_ENABLED_ENV: &str = "CYBER_SHIELD_ANALYSIS_ENABLED";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Current Unix time in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Checks the runtime kill-switch env var.
///
/// Semantics:
/// - Unset => analysis enabled.
/// - `0`, `false`, `off` (case-insensitive) => analysis disabled.
/// - Any other value => analysis enabled.
pub fn analysis_enabled_from_env() -> bool {
    match std::env::var(ANALYSIS_ENABLED_ENV) {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Validates `text` and classifies it.
///
/// Validation runs before the classifier is touched, so out-of-bound text
/// never produces a provider call.
///
/// # Errors
/// Returns [`AnalysisError::Validation`] for out-of-bound text,
/// [`AnalysisError::Disabled`] when the kill switch is off, and
/// [`AnalysisError::Provider`] or [`AnalysisError::Schema`] from the
/// classifier.
pub async fn analyze_scam_risk(
    classifier: &dyn RiskClassifier,
    text: &str,
) -> Result<RiskAnalysisResult, AnalysisError> {
    let request = RiskAnalysisRequest::new(text).map_err(AnalysisError::Validation)?;
    classify_request(classifier, &request).await
}

async fn classify_request(
    classifier: &dyn RiskClassifier,
    request: &RiskAnalysisRequest,
) -> Result<RiskAnalysisResult, AnalysisError> {
    if !analysis_enabled_from_env() {
        tracing::warn!(fingerprint = %request.fingerprint(), "risk analysis disabled by kill switch");
        return Err(AnalysisError::Disabled);
    }

    classifier
        .classify(request)
        .await
        .map_err(AnalysisError::from)
}

/// Runs one checker submission against `state`.
///
/// On validation failure the field message is set and nothing is sent. On
/// any other failure the state shows the generic failure notice.
///
/// # Errors
/// Returns the [`AnalysisError`] behind the failure so callers can log it.
pub async fn run_checker(
    state: &mut CheckerState,
    classifier: &dyn RiskClassifier,
) -> Result<RiskAnalysisResult, AnalysisError> {
    let Some(request) = state.begin_submission() else {
        return Err(match validate_risk_text(&state.text) {
            Err(error) => AnalysisError::Validation(error),
            Ok(()) => AnalysisError::InFlight,
        });
    };

    match classify_request(classifier, &request).await {
        Ok(result) => {
            state.finish_with_result(&result);
            Ok(result)
        }
        Err(error) => {
            tracing::error!(fingerprint = %request.fingerprint(), %error, "error analyzing scam risk");
            state.finish_with_failure();
            Err(error)
        }
    }
}

/// Stores a new scam report with an optional checker result attached.
///
/// Invalid reports are rejected before anything is written.
///
/// # Errors
/// Returns [`AppError::Report`] when a field is out of bounds and
/// [`AppError::Store`] when the store rejects the write.
pub fn report_scam_with_assessment(
    store: &dyn ScamStore,
    mut scam: NewScam,
    assessment: Option<RiskAnalysisResult>,
    now_ms: u64,
) -> Result<Scam, AppError> {
    scam.validate()?;
    scam.risk_assessment = assessment;
    store.add_scam(scam, now_ms).map_err(AppError::Store)
}

/// Builds the provider-backed classifier described by `config`.
///
/// # Errors
/// Returns [`AppError::Analysis`] when the endpoint fails policy or the
/// client settings are unusable.
pub fn build_classifier(
    config: &AppConfig,
    api_key: Option<String>,
) -> Result<RiskAnalysisClient, AppError> {
    let settings = config.client_settings();
    let transport = HttpCompletionTransport::new(&config.provider.base_url, api_key, settings.timeout)
        .map_err(|error| AppError::Analysis(AnalysisError::Provider(error)))?;

    tracing::debug!(endpoint = transport.endpoint(), model = %settings.model, "classifier configured");
    RiskAnalysisClient::new(settings, Arc::new(transport))
        .map_err(|error| AppError::Analysis(AnalysisError::from(error)))
}

/// Failures of one scam risk check.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input text outside the accepted bound.
    #[error("validation error: {0}")]
    Validation(#[source] CoreError),
    /// Provider call failed.
    #[error("provider error: {0}")]
    Provider(#[source] ProviderError),
    /// Provider output violated the output schema.
    #[error("schema validation error: {0}")]
    Schema(#[source] ContractError),
    /// Kill switch is off.
    #[error("risk analysis is disabled")]
    Disabled,
    /// A submission is already outstanding.
    #[error("an analysis is already in progress")]
    InFlight,
    /// Classifier settings are unusable.
    #[error("classifier misconfigured: {0}")]
    Settings(String),
}

impl AnalysisError {
    /// Message shown to the user.
    ///
    /// Validation failures keep their field message; everything else collapses
    /// into the generic failure notice.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(error) => error.field_message().unwrap_or(FAILURE_DESCRIPTION),
            _ => FAILURE_DESCRIPTION,
        }
    }
}

impl From<ClassifierError> for AnalysisError {
    fn from(error: ClassifierError) -> Self {
        match error {
            ClassifierError::Provider(error) => Self::Provider(error),
            ClassifierError::Schema(error) => Self::Schema(error),
            ClassifierError::Settings(message) => Self::Settings(message),
        }
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Scam risk check failed.
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    /// Report form field out of bounds.
    #[error("{0}")]
    Report(#[from] ReportError),
    /// Record store failure.
    #[error("store error: {0}")]
    Store(StoreError),
    /// Session boundary failure.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    /// Configuration failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
