//! Shared fixtures for app integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cyber_shield_analysis_contract::ContractError;
use cyber_shield_classifier::{
    ClassifierError, ClientSettings, CompletionRequest, CompletionTransport, ProviderError,
    RetryPolicy, RiskAnalysisClient, RiskClassifier,
};
use cyber_shield_core::{RiskAnalysisRequest, RiskAnalysisResult};

/// Phishing-style message of exactly 200 characters.
#[allow(dead_code)]
pub fn phishing_text() -> String {
    let base = "URGENT: Your bank account has been suspended due to unusual activity. \
                Verify your identity within 24 hours at http://secure-bank-verify.example \
                to avoid permanent closure. Reply with the OTP we just sent you. ";
    base.chars().cycle().take(200).collect()
}

/// Classifier returning a fixed score and counting calls.
#[allow(dead_code)]
pub struct StubClassifier {
    score: f64,
    summary: String,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubClassifier {
    pub fn scoring(score: f64) -> Self {
        Self {
            score,
            summary: "Urgency, credential request and a lookalike link.".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskClassifier for StubClassifier {
    async fn classify(
        &self,
        _request: &RiskAnalysisRequest,
    ) -> Result<RiskAnalysisResult, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        RiskAnalysisResult::from_model_output(self.score, self.summary.clone())
            .map_err(|error| ClassifierError::Schema(ContractError::InvalidContract(error)))
    }
}

/// Transport replaying scripted provider outcomes in order.
#[allow(dead_code)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(outcomes: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
            delay: None,
        })
    }

    pub fn replying(body: &str) -> Arc<Self> {
        Self::new(vec![Ok(body.to_string())])
    }

    pub fn stalled(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcomes
            .lock()
            .expect("outcome lock should work")
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyCompletion))
    }
}

/// Client over `transport` with the given retry policy.
#[allow(dead_code)]
pub fn client_with(transport: Arc<ScriptedTransport>, retry: RetryPolicy) -> RiskAnalysisClient {
    RiskAnalysisClient::new(
        ClientSettings {
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
            retry,
        },
        transport,
    )
    .expect("client should build")
}

/// Retry policy with tiny delays.
#[allow(dead_code)]
pub fn fast_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay_ms: 1,
        max_delay_ms: 5,
        jitter_ms: 0,
    }
}
