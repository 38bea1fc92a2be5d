//! OpenAI-compatible chat-completions transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    CompletionRequest, CompletionTransport, ProviderError, error_for_status, redact_sensitive,
    validate_provider_endpoint,
};

const MAX_LOGGED_BODY_CHARS: usize = 512;

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Returns the chat-completions URL under `base_url`.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn chat_body(request: &CompletionRequest) -> ChatCompletionsRequest<'_> {
    ChatCompletionsRequest {
        model: &request.model,
        messages: vec![ChatMessage {
            role: "user",
            content: &request.prompt,
        }],
        response_format: ResponseFormat {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: &request.schema_name,
                schema: &request.output_schema,
                strict: false,
            },
        },
    }
}

/// Builds the JSON body sent for one completion request.
///
/// # Errors
/// Returns the serializer error if the output schema cannot be encoded.
pub fn build_chat_request(request: &CompletionRequest) -> serde_json::Result<Value> {
    serde_json::to_value(chat_body(request))
}

/// Extracts the first choice's message content from a response body.
///
/// # Errors
/// Returns [`ProviderError::Envelope`] when the body is not a chat-completions
/// envelope and [`ProviderError::EmptyCompletion`] when no content is present.
pub fn extract_completion_text(body: &str) -> Result<String, ProviderError> {
    let envelope: ChatCompletionsResponse =
        serde_json::from_str(body).map_err(|error| ProviderError::Envelope(error.to_string()))?;

    envelope
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ProviderError::EmptyCompletion)
}

/// [`CompletionTransport`] over HTTP using `reqwest`.
#[derive(Clone)]
pub struct HttpCompletionTransport {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpCompletionTransport {
    /// Creates a transport for `base_url` (for example `https://api.openai.com/v1`).
    ///
    /// # Errors
    /// Returns [`ProviderError::InvalidEndpoint`] when the URL fails the
    /// endpoint policy, and [`ProviderError::Network`] when the HTTP client
    /// cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        validate_provider_endpoint(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ProviderError::Network(format!("failed to build http client: {error}")))?;

        Ok(Self {
            endpoint: chat_completions_url(base_url),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
        })
    }

    /// Returns the resolved chat-completions URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for HttpCompletionTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletionTransport")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl CompletionTransport for HttpCompletionTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .json(&chat_body(request));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|error| {
            if error.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Network(redact_sensitive(&error.to_string()))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            if error.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Network(redact_sensitive(&error.to_string()))
            }
        })?;

        if !status.is_success() {
            let excerpt: String = body.chars().take(MAX_LOGGED_BODY_CHARS).collect();
            tracing::warn!(
                status = status.as_u16(),
                body = %redact_sensitive(&excerpt),
                "provider returned error status"
            );
            return Err(error_for_status(status.as_u16()));
        }

        extract_completion_text(&body)
    }
}
