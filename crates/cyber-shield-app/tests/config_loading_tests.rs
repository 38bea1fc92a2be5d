//! Integration tests for config file loading and env overrides.

use std::collections::HashMap;
use std::time::Duration;

use cyber_shield_app::config::{MODEL_ENV, PROVIDER_URL_ENV, TIMEOUT_ENV};
use cyber_shield_app::{AppConfig, ConfigError, build_classifier};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn config_loading_tests_missing_path_uses_defaults() {
    let config = AppConfig::load(None).expect("defaults should load");
    assert_eq!(config.provider.retry.max_retries, 0);
    assert_eq!(config.client_settings().timeout, Duration::from_secs(config.provider.timeout_secs));
}

#[test]
fn config_loading_tests_unreadable_file_is_read_error() {
    let path = std::env::temp_dir().join("cyber-shield-config-does-not-exist.toml");
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn config_loading_tests_file_round_trips_through_toml() {
    let path = std::env::temp_dir().join(format!(
        "cyber-shield-config-{}.toml",
        std::process::id()
    ));
    std::fs::write(
        &path,
        r#"
[provider]
base_url = "http://127.0.0.1:8080/v1"
model = "qwen2.5"
timeout_secs = 12

[provider.retry]
max_retries = 3
base_delay_ms = 100
max_delay_ms = 400
jitter_ms = 0

[logging]
filter = "cyber_shield=debug"
json = true
"#,
    )
    .expect("config should be written");

    let loaded = AppConfig::load(Some(&path));
    std::fs::remove_file(&path).ok();
    let config = loaded.expect("config should load");

    assert_eq!(config.provider.model, "qwen2.5");
    assert_eq!(config.provider.retry.max_retries, 3);
    assert!(config.logging.json);

    let rendered = config.to_toml_string().expect("config should render");
    let reparsed = AppConfig::from_toml_str(&rendered).expect("rendered config should parse");
    assert_eq!(reparsed, config);
}

#[test]
fn config_loading_tests_env_overrides_win_over_file() {
    let mut config = AppConfig::from_toml_str("[provider]\nmodel = \"from-file\"\n")
        .expect("config should parse");
    config
        .apply_env_overrides(lookup_from(&[
            (MODEL_ENV, "from-env"),
            (PROVIDER_URL_ENV, "http://localhost:11434/v1"),
            (TIMEOUT_ENV, " 7 "),
        ]))
        .expect("overrides should apply");

    assert_eq!(config.provider.model, "from-env");
    assert_eq!(config.provider.base_url, "http://localhost:11434/v1");
    assert_eq!(config.provider.timeout_secs, 7);
    assert!(config.validate().is_ok());
}

#[test]
fn config_loading_tests_bad_timeout_override_is_invalid() {
    let mut config = AppConfig::default();
    assert!(matches!(
        config.apply_env_overrides(lookup_from(&[(TIMEOUT_ENV, "soon")])),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn config_loading_tests_validation_rejects_unusable_values() {
    let mut config = AppConfig::default();
    config.provider.timeout_secs = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = AppConfig::default();
    config.provider.model = " ".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = AppConfig::default();
    config.provider.retry.base_delay_ms = 1000;
    config.provider.retry.max_delay_ms = 10;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn config_loading_tests_api_key_comes_from_named_env_var() {
    let mut config = AppConfig::default();
    config.provider.api_key_env = "LOCAL_LLM_KEY".to_string();

    assert_eq!(
        config.api_key(lookup_from(&[("LOCAL_LLM_KEY", "sk-local")])),
        Some("sk-local".to_string())
    );
    assert_eq!(config.api_key(lookup_from(&[("LOCAL_LLM_KEY", "  ")])), None);
    assert_eq!(config.api_key(lookup_from(&[])), None);
}

#[test]
fn config_loading_tests_default_config_builds_classifier() {
    let classifier = build_classifier(&AppConfig::default(), None).expect("classifier should build");
    assert_eq!(classifier.settings().model, "gpt-4o-mini");
}

#[test]
fn config_loading_tests_example_file_is_valid() {
    let config = AppConfig::from_toml_str(include_str!("../../../config/cyber-shield.example.toml"))
        .expect("example config should parse");
    assert!(config.validate().is_ok());
    assert_eq!(config, AppConfig::default());
}
