//! Integration tests for choosing the vision transport from configuration.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use site_triage_app::{Analyzer, AppConfig, TransportKind, keys, transport_for, transport_kind};
use site_triage_core::Label;
use site_triage_vision::RecordSource;

fn config_with(pairs: &[(&str, &str)]) -> AppConfig {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    AppConfig::from_lookup(|key| map.get(key).map(|value| value.to_string()))
        .expect("config should resolve")
}

#[test]
fn vision_transport_tests_api_key_selects_http() {
    let keyed = config_with(&[(keys::VISION_API_KEY, "real-key")]);
    assert_eq!(transport_kind(&keyed.vision), TransportKind::Http);
    assert!(transport_for(&keyed.vision).is_ok());

    let unkeyed = config_with(&[(keys::VISION_API_KEY, "  ")]);
    assert_eq!(transport_kind(&unkeyed.vision), TransportKind::Offline);
}

#[test]
fn vision_transport_tests_configured_key_reaches_model() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let storage = dir.path().to_string_lossy().into_owned();
    let config = config_with(&[
        (keys::VISION_API_KEY, "test-key"),
        (keys::VISION_MODEL, "models/custom"),
        (keys::STORAGE_DIR, storage.as_str()),
    ]);
    let transport = Arc::new(common::CannedTransport(
        r#"{"features":{"redness":{"present":true,"extent_percent":60},"swelling":true},"overall_confidence":0.9}"#
            .to_string(),
    ));

    let analyzer = Analyzer::from_config(&config, transport).expect("analyzer should build");
    let response = analyzer
        .analyze("a.jpg", "image/jpeg", b"xx")
        .expect("analysis should succeed");

    assert_eq!(response.source, RecordSource::Model);
    assert_eq!(response.classification.label, Label::Yellow);
    assert_eq!(response.classification.risk_score, 30);
}

#[test]
fn vision_transport_tests_missing_key_falls_back_offline() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let storage = dir.path().to_string_lossy().into_owned();
    let config = config_with(&[(keys::STORAGE_DIR, storage.as_str())]);

    let analyzer = Analyzer::from_env_config(&config).expect("analyzer should build");
    let response = analyzer
        .analyze("a.jpg", "image/jpeg", b"xx")
        .expect("analysis should succeed");

    assert_eq!(response.source, RecordSource::Fallback);
}
