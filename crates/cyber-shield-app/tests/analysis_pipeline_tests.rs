//! Integration tests for the validate -> classify -> map pipeline.

mod common;

use common::{ScriptedTransport, StubClassifier, client_with, phishing_text};
use cyber_shield_analysis_contract::{RiskBand, present_risk};
use cyber_shield_app::{AnalysisError, analyze_scam_risk};
use cyber_shield_classifier::RetryPolicy;
use cyber_shield_core::CoreError;

#[tokio::test]
async fn analysis_pipeline_tests_out_of_bound_text_never_reaches_provider() {
    let classifier = StubClassifier::scoring(50.0);

    for text in ["".to_string(), "a".repeat(49), "a".repeat(5001)] {
        let error = analyze_scam_risk(&classifier, &text)
            .await
            .expect_err("out-of-bound text should fail");
        assert!(matches!(error, AnalysisError::Validation(_)));
    }

    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn analysis_pipeline_tests_in_bound_text_proceeds() {
    let classifier = StubClassifier::scoring(50.0);

    for len in [50_usize, 5000] {
        analyze_scam_risk(&classifier, &"a".repeat(len))
            .await
            .expect("in-bound text should be analyzed");
    }

    assert_eq!(classifier.calls(), 2);
}

#[tokio::test]
async fn analysis_pipeline_tests_band_mapping_from_provider_payloads() {
    let cases = [
        (r#"{"riskScore": 82, "summary": "Gift card demand."}"#, RiskBand::High),
        (r#"{"riskScore": 75, "summary": "Some red flags."}"#, RiskBand::Medium),
        (r#"{"riskScore": 40, "summary": "Mostly benign."}"#, RiskBand::Low),
    ];

    for (payload, expected) in cases {
        let client = client_with(ScriptedTransport::replying(payload), RetryPolicy::single_shot());
        let result = analyze_scam_risk(&client, &phishing_text())
            .await
            .expect("payload should parse");
        assert_eq!(present_risk(&result).band, expected, "payload {payload}");
    }
}

#[tokio::test]
async fn analysis_pipeline_tests_malformed_payload_is_schema_error() {
    for payload in [
        r#"{"riskScore": 82}"#,
        r#"{"riskScore": "82", "summary": "High risk."}"#,
        r#"{"summary": "No score."}"#,
        "I think this is a scam.",
    ] {
        let transport = ScriptedTransport::replying(payload);
        let client = client_with(transport.clone(), RetryPolicy::single_shot());

        let outcome = analyze_scam_risk(&client, &phishing_text()).await;
        assert!(
            matches!(outcome, Err(AnalysisError::Schema(_))),
            "payload {payload} should be a schema error"
        );
        assert_eq!(transport.calls(), 1);
    }
}

#[tokio::test]
async fn analysis_pipeline_tests_repeated_calls_are_checked_by_shape_only() {
    let transport = ScriptedTransport::new(vec![
        Ok(r#"{"riskScore": 88, "summary": "Impersonates a bank."}"#.to_string()),
        Ok(r#"{"riskScore": 93.5, "summary": "Credential harvesting link."}"#.to_string()),
    ]);
    let client = client_with(transport, RetryPolicy::single_shot());
    let text = phishing_text();

    for _ in 0..2 {
        let result = analyze_scam_risk(&client, &text).await.expect("analysis should work");
        assert!((0.0..=100.0).contains(&result.risk_score));
        assert!(!result.summary.trim().is_empty());
    }
}

#[tokio::test]
async fn analysis_pipeline_tests_end_to_end_phishing_message() {
    let text = phishing_text();
    assert_eq!(text.chars().count(), 200);

    let client = client_with(
        ScriptedTransport::replying(
            "```json\n{\"riskScore\": 97, \"summary\": \"Urgent threat, OTP request and suspicious link.\"}\n```",
        ),
        RetryPolicy::single_shot(),
    );

    let result = analyze_scam_risk(&client, &text).await.expect("analysis should work");
    assert!((0.0..=100.0).contains(&result.risk_score));
    assert!(!result.summary.is_empty());
}

#[tokio::test]
async fn analysis_pipeline_tests_validation_keeps_field_message() {
    let classifier = StubClassifier::scoring(10.0);
    let error = analyze_scam_risk(&classifier, "short")
        .await
        .expect_err("short text should fail");

    assert!(matches!(
        error,
        AnalysisError::Validation(CoreError::TextTooShort { actual: 5, .. })
    ));
    assert_eq!(
        error.user_message(),
        "Please enter at least 50 characters to analyze."
    );
}
