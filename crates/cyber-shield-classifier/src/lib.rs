#![warn(missing_docs)]
//! # cyber-shield-classifier
//!
//! ## Purpose
//! Produces a risk score and summary for validated checker text by delegating
//! to an external language-model completion provider.
//!
//! ## Responsibilities
//! - Expose the [`RiskClassifier`] capability so callers and tests can swap in
//!   deterministic implementations.
//! - Build the fixed analysis prompt and attach the output schema.
//! - Bound each provider call with a timeout and apply [`RetryPolicy`].
//! - Classify provider failures as retriable or permanent.
//!
//! ## Data flow
//! [`RiskAnalysisRequest`] -> [`build_risk_prompt`] -> [`CompletionTransport`]
//! -> raw completion -> `parse_risk_response` -> [`RiskAnalysisResult`].
//!
//! ## Ownership and lifetimes
//! The client owns its transport behind `Arc<dyn CompletionTransport>` and
//! keeps no per-request state, so concurrent checks share nothing mutable.
//!
//! ## Error model
//! Transport failures surface as [`ClassifierError::Provider`]; unusable
//! output surfaces as [`ClassifierError::Schema`]. Schema failures are never
//! retried and never yield a partial result.
//!
//! ## Security and privacy notes
//! Request text is logged only by fingerprint. API keys stay inside the
//! transport and error bodies are passed through [`redact_sensitive`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cyber_shield_analysis_contract::{
    ContractError, RISK_RESPONSE_SCHEMA_NAME, parse_risk_response, risk_response_schema,
};
use cyber_shield_core::{RiskAnalysisRequest, RiskAnalysisResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use thiserror::Error;
use url::{Host, Url};

mod http;

pub use http::{HttpCompletionTransport, build_chat_request, chat_completions_url, extract_completion_text};

/// Default per-attempt provider timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const REDACTED: &str = "<redacted>";

/// Capability that scores text for scam risk.
#[async_trait]
pub trait RiskClassifier: Send + Sync {
    /// Classifies one validated request.
    async fn classify(
        &self,
        request: &RiskAnalysisRequest,
    ) -> Result<RiskAnalysisResult, ClassifierError>;
}

/// One structured-output completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Provider model identifier.
    pub model: String,
    /// Full instruction with the user text embedded.
    pub prompt: String,
    /// Name the output schema is registered under.
    pub schema_name: String,
    /// JSON schema the completion must satisfy.
    pub output_schema: Value,
}

impl CompletionRequest {
    /// Builds the analysis completion for `text`.
    pub fn for_text(model: impl Into<String>, text: &str) -> Self {
        Self {
            model: model.into(),
            prompt: build_risk_prompt(text),
            schema_name: RISK_RESPONSE_SCHEMA_NAME.to_string(),
            output_schema: risk_response_schema(),
        }
    }
}

/// Abstract transport to a completion provider.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Sends one completion request and returns the raw completion text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Builds the analysis instruction, embedding `text` verbatim.
pub fn build_risk_prompt(text: &str) -> String {
    format!(
        "You are an AI assistant specializing in identifying potential scams. \
         Analyze the following text and determine the risk of it being a scam. \
         Provide a risk score between 0 and 100, where 0 indicates very low risk \
         and 100 indicates very high risk. Also, provide a summary explaining your \
         reasoning for the risk score.\n\nText: {text}"
    )
}

/// Backoff policy for retriable provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero means single-shot.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Upper bound on the exponential delay.
    pub max_delay_ms: u64,
    /// Upper bound on random jitter added to each delay.
    pub jitter_ms: u64,
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn single_shot() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Exponential delay before retry number `retry` (1-based), without jitter.
    pub fn backoff_delay_ms(&self, retry: u32) -> u64 {
        let exponent = retry.saturating_sub(1).min(30);
        self.base_delay_ms
            .saturating_mul(1_u64 << exponent)
            .min(self.max_delay_ms)
    }

    /// Delay before retry number `retry`, with jitter seeded from `seed`.
    pub fn delay_for_retry(&self, retry: u32, seed: u64) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            let mut rng = StdRng::seed_from_u64(seed ^ u64::from(retry));
            rng.random_range(0..=self.jitter_ms)
        };
        Duration::from_millis(self.backoff_delay_ms(retry).saturating_add(jitter))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            jitter_ms: 250,
        }
    }
}

/// Whether a provider failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Transient; a later attempt may succeed.
    Retriable,
    /// Will fail again without operator action.
    Permanent,
}

/// Classifies a provider error.
pub fn classify_provider_error(error: &ProviderError) -> FailureClass {
    match error {
        ProviderError::Timeout
        | ProviderError::Network(_)
        | ProviderError::RateLimited
        | ProviderError::Server(_) => FailureClass::Retriable,
        ProviderError::Unauthorized(_)
        | ProviderError::Client(_)
        | ProviderError::InvalidEndpoint(_)
        | ProviderError::Envelope(_)
        | ProviderError::EmptyCompletion => FailureClass::Permanent,
    }
}

/// Maps a non-success HTTP status to a provider error.
pub fn error_for_status(status: u16) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Unauthorized(status),
        408 => ProviderError::Timeout,
        429 => ProviderError::RateLimited,
        500..=599 => ProviderError::Server(status),
        _ => ProviderError::Client(status),
    }
}

/// Validates a provider base URL.
///
/// HTTPS is required. Plain HTTP is accepted only for loopback hosts so local
/// model servers keep working.
///
/// # Errors
/// Returns [`ProviderError::InvalidEndpoint`] for unparsable URLs, other
/// schemes, or plain HTTP to a non-loopback host.
pub fn validate_provider_endpoint(endpoint: &str) -> Result<Url, ProviderError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| ProviderError::InvalidEndpoint(format!("invalid provider url: {error}")))?;

    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" if is_loopback(&parsed) => Ok(parsed),
        "http" => Err(ProviderError::InvalidEndpoint(
            "provider endpoint must use https unless it is a loopback address".to_string(),
        )),
        other => Err(ProviderError::InvalidEndpoint(format!(
            "unsupported provider scheme {other}"
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(address)) => address.is_loopback(),
        Some(Host::Ipv6(address)) => address.is_loopback(),
        None => false,
    }
}

/// Static settings for [`RiskAnalysisClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Provider model identifier.
    pub model: String,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retry policy for retriable failures.
    pub retry: RetryPolicy,
}

impl ClientSettings {
    /// Single-shot settings with the default timeout.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::single_shot(),
        }
    }
}

/// Outcome of one successful analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Validated result.
    pub result: RiskAnalysisResult,
    /// Provider attempts used, including the successful one.
    pub attempts: u32,
}

/// Provider-backed [`RiskClassifier`].
#[derive(Clone)]
pub struct RiskAnalysisClient {
    settings: ClientSettings,
    transport: Arc<dyn CompletionTransport>,
}

impl RiskAnalysisClient {
    /// Creates a client over `transport`.
    ///
    /// # Errors
    /// Returns [`ClassifierError::Settings`] for a blank model or zero timeout.
    pub fn new(
        settings: ClientSettings,
        transport: Arc<dyn CompletionTransport>,
    ) -> Result<Self, ClassifierError> {
        if settings.model.trim().is_empty() {
            return Err(ClassifierError::Settings("model must be non-empty".to_string()));
        }
        if settings.timeout.is_zero() {
            return Err(ClassifierError::Settings(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            settings,
            transport,
        })
    }

    /// Returns configured settings.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Runs one analysis, retrying retriable provider failures per policy.
    ///
    /// # Errors
    /// Returns [`ClassifierError::Provider`] once retries are exhausted or on
    /// a permanent failure, and [`ClassifierError::Schema`] when the provider
    /// answers with unusable output.
    pub async fn analyze(
        &self,
        request: &RiskAnalysisRequest,
    ) -> Result<AnalysisReport, ClassifierError> {
        let fingerprint = request.fingerprint();
        let seed = u64::from_str_radix(&fingerprint, 16).unwrap_or_default();
        let completion = CompletionRequest::for_text(&self.settings.model, request.text());
        let mut attempts = 0_u32;

        loop {
            attempts += 1;
            tracing::debug!(%fingerprint, attempts, model = %self.settings.model, "sending risk analysis");

            let outcome =
                match tokio::time::timeout(self.settings.timeout, self.transport.complete(&completion))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ProviderError::Timeout),
                };

            let error = match outcome {
                Ok(raw) => {
                    let result = parse_risk_response(&raw).map_err(|error| {
                        tracing::warn!(%fingerprint, %error, "provider output failed schema validation");
                        ClassifierError::Schema(error)
                    })?;
                    tracing::info!(
                        %fingerprint,
                        attempts,
                        risk_score = result.risk_score,
                        "risk analysis completed"
                    );
                    return Ok(AnalysisReport { result, attempts });
                }
                Err(error) => error,
            };

            let retries_used = attempts - 1;
            if classify_provider_error(&error) == FailureClass::Permanent
                || retries_used >= self.settings.retry.max_retries
            {
                tracing::warn!(%fingerprint, attempts, %error, "risk analysis failed");
                return Err(ClassifierError::Provider(error));
            }

            let delay = self.settings.retry.delay_for_retry(attempts, seed);
            tracing::warn!(
                %fingerprint,
                attempts,
                %error,
                delay_ms = delay.as_millis() as u64,
                "retrying risk analysis"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RiskClassifier for RiskAnalysisClient {
    async fn classify(
        &self,
        request: &RiskAnalysisRequest,
    ) -> Result<RiskAnalysisResult, ClassifierError> {
        self.analyze(request).await.map(|report| report.result)
    }
}

/// Redacts values that follow common secret markers.
///
/// `authorization=Bearer abc` becomes `authorization=<redacted> <redacted>`.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for key in ["bearer", "api_key", "apikey", "password", "token", "authorization"] {
        redacted = redact_values_after(&redacted, key);
    }
    redacted
}

fn redact_values_after(input: &str, key: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find(key) {
        let key_end = cursor + found + key.len();
        output.push_str(&input[cursor..key_end]);

        let rest = &input[key_end..];
        if !rest.starts_with(is_separator) {
            cursor = key_end;
            continue;
        }

        let value_start = key_end + rest.find(|c: char| !is_separator(c)).unwrap_or(rest.len());
        let separators = &input[key_end..value_start];
        output.push_str(separators);

        let tail = &input[value_start..];
        let value_len = match separators.chars().last() {
            Some(quote @ ('"' | '\'')) => quoted_value_len(tail, quote),
            _ => tail.find(is_value_end).unwrap_or(tail.len()),
        };
        let value_end = value_start + value_len;
        let value = &input[value_start..value_end];
        if value.is_empty() || value == REDACTED {
            output.push_str(value);
        } else {
            output.push_str(REDACTED);
        }
        cursor = value_end;
    }

    output.push_str(&input[cursor..]);
    output
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '=' | ':' | '"' | '\'')
}

/// Byte length of a quoted value up to its closing `quote`. Backslash escapes
/// are skipped. An unterminated value runs to the end of `tail`.
fn quoted_value_len(tail: &str, quote: char) -> usize {
    let mut escaped = false;
    for (index, c) in tail.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            _ if c == quote => return index,
            _ => {}
        }
    }
    tail.len()
}

fn is_value_end(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | ',' | '&' | ';' | '}')
}

/// Provider-side failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Attempt exceeded its time bound.
    #[error("provider request timed out")]
    Timeout,
    /// Connection-level failure.
    #[error("provider network failure: {0}")]
    Network(String),
    /// Credentials rejected.
    #[error("provider rejected credentials (status {0})")]
    Unauthorized(u16),
    /// Provider rate limit hit.
    #[error("provider rate limit exceeded")]
    RateLimited,
    /// Request rejected by provider.
    #[error("provider rejected request (status {0})")]
    Client(u16),
    /// Provider-side fault.
    #[error("provider server error (status {0})")]
    Server(u16),
    /// Endpoint violates policy.
    #[error("invalid provider endpoint: {0}")]
    InvalidEndpoint(String),
    /// Response envelope could not be decoded.
    #[error("malformed provider envelope: {0}")]
    Envelope(String),
    /// Provider answered without completion text.
    #[error("provider returned no completion")]
    EmptyCompletion,
}

/// Classifier failures.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Provider output violated the output contract.
    #[error(transparent)]
    Schema(#[from] ContractError),
    /// Client settings are unusable.
    #[error("invalid classifier settings: {0}")]
    Settings(String),
}
