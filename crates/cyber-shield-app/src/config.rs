//! TOML configuration with environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cyber_shield_classifier::{ClientSettings, RetryPolicy, validate_provider_endpoint};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overrides `provider.base_url`.
pub const PROVIDER_URL_ENV: &str = "CYBER_SHIELD_PROVIDER_URL";
/// Overrides `provider.model`.
pub const MODEL_ENV: &str = "CYBER_SHIELD_MODEL";
/// Overrides `provider.timeout_secs`.
pub const TIMEOUT_ENV: &str = "CYBER_SHIELD_TIMEOUT_SECS";
/// Default env var holding the provider API key.
pub const DEFAULT_API_KEY_ENV: &str = "CYBER_SHIELD_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Completion provider settings.
    pub provider: ProviderConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Completion provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Name of the env var holding the API key. The key itself is never
    /// stored in the file.
    pub api_key_env: String,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Retry policy; single-shot by default.
    pub retry: RetryPolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 30,
            retry: RetryPolicy::single_shot(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(ConfigError::Parse)
    }

    /// Loads configuration from `path` (defaults when `None`), applies
    /// process env overrides and validates the result.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when reading, parsing, overriding or
    /// validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies env overrides read through `lookup`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when the timeout override is not a
    /// number.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(base_url) = lookup(PROVIDER_URL_ENV) {
            self.provider.base_url = base_url;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            self.provider.model = model;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.provider.timeout_secs = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{TIMEOUT_ENV} must be a whole number of seconds"))
            })?;
        }
        Ok(())
    }

    /// Checks endpoint policy, model and timeout.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_provider_endpoint(&self.provider.base_url)
            .map_err(|error| ConfigError::Invalid(error.to_string()))?;

        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.model must be set".to_string()));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "provider.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.provider.retry.max_delay_ms < self.provider.retry.base_delay_ms {
            return Err(ConfigError::Invalid(
                "provider.retry.max_delay_ms must be at least base_delay_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads the API key from the configured env var through `lookup`.
    pub fn api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        lookup(&self.provider.api_key_env).filter(|key| !key.trim().is_empty())
    }

    /// Classifier settings derived from the provider section.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            model: self.provider.model.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
            retry: self.provider.retry,
        }
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    /// Returns [`ConfigError::Encode`] when serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Encode)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid TOML for [`AppConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
    /// Config could not be rendered.
    #[error("failed to render config: {0}")]
    Encode(#[source] toml::ser::Error),
    /// Config values are unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_single_shot_with_bounded_timeout() {
        let config = AppConfig::default();
        assert_eq!(config.provider.retry.max_retries, 0);
        assert_eq!(config.client_settings().timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
[provider]
model = "llama3.1"
base_url = "http://localhost:11434/v1"

[provider.retry]
max_retries = 2
"#,
        )
        .expect("config should parse");
        assert_eq!(config.provider.model, "llama3.1");
        assert_eq!(config.provider.retry.max_retries, 2);
        assert_eq!(config.provider.retry.base_delay_ms, 500);
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_keys_and_plain_http_remote() {
        assert!(AppConfig::from_toml_str("[provider]\nmodle = \"x\"\n").is_err());

        let config = AppConfig::from_toml_str("[provider]\nbase_url = \"http://llm.example.test/v1\"\n")
            .expect("config should parse");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
