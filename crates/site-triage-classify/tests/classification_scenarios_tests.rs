//! Integration tests for labels derived from normalized model output.

use serde_json::{Value, json};
use site_triage_classify::{DEFAULT_THRESHOLDS, classify, compute_risk_score};
use site_triage_core::{AnalysisRecord, Label};
use site_triage_normalize::normalize_response;

fn record_from(features: Value, confidence: f64) -> AnalysisRecord {
    normalize_response(
        &json!({"features": features, "overall_confidence": confidence}),
        "scenario.jpg",
    )
}

#[test]
fn classification_scenarios_tests_severe_combination_caps_at_100() {
    let record = record_from(
        json!({
            "discharge": {"present": true, "type": "purulent"},
            "redness": {"present": true, "extent_percent": 80},
            "swelling": {"present": true},
            "dressing_lift": {"present": true},
            "open_wound": {"present": true}
        }),
        0.9,
    );
    assert_eq!(compute_risk_score(&record.features), 100);
}

#[test]
fn classification_scenarios_tests_purulent_discharge_is_red() {
    let record = record_from(
        json!({
            "discharge": {"present": true, "type": "purulent"},
            "redness": {"present": false},
            "swelling": {"present": false}
        }),
        0.9,
    );
    let result = classify(&record);
    assert_eq!(result.label, Label::Red);
    assert!(result.explanation.contains("Purulent"));
    assert!(result.risk_score >= DEFAULT_THRESHOLDS.red_at);
}

#[test]
fn classification_scenarios_tests_low_confidence_is_uncertain() {
    let record = record_from(
        json!({
            "discharge": {"present": false},
            "redness": {"present": false}
        }),
        0.3,
    );
    let result = classify(&record);
    assert_eq!(result.label, Label::Uncertain);
    assert!(result.explanation.contains("confidence"));
}

#[test]
fn classification_scenarios_tests_low_confidence_beats_purulent_override() {
    let record = record_from(json!({"discharge": {"present": true, "type": "purulent"}}), 0.2);
    let result = classify(&record);
    assert_eq!(result.label, Label::Uncertain);
    assert_eq!(result.risk_score, 60);
}

#[test]
fn classification_scenarios_tests_moderate_redness_with_swelling_is_yellow() {
    let record = record_from(
        json!({
            "discharge": {"present": false},
            "redness": {"present": true, "extent_percent": 60},
            "swelling": {"present": true}
        }),
        0.9,
    );
    let result = classify(&record);
    assert_eq!(result.label, Label::Yellow);
    assert!(result.risk_score >= 25);
    assert!(result.explanation.contains("redness (60% extent)"));
    assert!(result.explanation.contains("swelling"));
}

#[test]
fn classification_scenarios_tests_descriptive_confidence_is_accepted() {
    let record = normalize_response(
        &json!({"overall_confidence": "high", "features": {"bruising": true}}),
        "scenario.jpg",
    );
    let result = classify(&record);
    assert_eq!(result.label, Label::Green);
    assert_eq!(result.risk_score, 5);
}

#[test]
fn classification_scenarios_tests_purulent_override_needs_exact_type() {
    let record = record_from(
        json!({"discharge": {"present": true, "type": " PURULENT "}}),
        0.9,
    );
    let result = classify(&record);
    assert_eq!(result.risk_score, 25);
    assert_eq!(result.label, Label::Yellow);
    assert!(!result.explanation.starts_with("Purulent"));
}
