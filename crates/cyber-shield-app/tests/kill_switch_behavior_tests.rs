//! Integration test for the analysis kill switch.

mod common;

use common::{StubClassifier, phishing_text};
use cyber_shield_app::{ANALYSIS_ENABLED_ENV, AnalysisError, analysis_enabled_from_env, analyze_scam_risk};

#[tokio::test]
async fn kill_switch_behavior_tests_disabled_switch_blocks_provider_calls() {
    // SAFETY: this test binary contains a single test, so no other thread
    // reads the environment concurrently.
    unsafe {
        std::env::set_var(ANALYSIS_ENABLED_ENV, "off");
    }
    assert!(!analysis_enabled_from_env());

    let classifier = StubClassifier::scoring(90.0);
    let outcome = analyze_scam_risk(&classifier, &phishing_text()).await;
    assert!(matches!(outcome, Err(AnalysisError::Disabled)));
    assert_eq!(classifier.calls(), 0);

    let short = analyze_scam_risk(&classifier, "tiny").await;
    assert!(matches!(short, Err(AnalysisError::Validation(_))));

    // SAFETY: same single-test invariant as above.
    unsafe {
        std::env::set_var(ANALYSIS_ENABLED_ENV, "yes");
    }
    assert!(analysis_enabled_from_env());
    analyze_scam_risk(&classifier, &phishing_text())
        .await
        .expect("re-enabled analysis should run");
    assert_eq!(classifier.calls(), 1);

    // SAFETY: same single-test invariant as above.
    unsafe {
        std::env::remove_var(ANALYSIS_ENABLED_ENV);
    }
    assert!(analysis_enabled_from_env());
}
