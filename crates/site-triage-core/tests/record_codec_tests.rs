//! Tests record serialization and deserialization stability.

use site_triage_core::{AnalysisRecord, FeatureName};

#[test]
fn record_codec_tests_round_trip_json() {
    let mut record = AnalysisRecord::with_defaults("site-a.jpg");
    record.features.discharge.present = true;
    record.features.discharge.discharge_type = Some("serous".to_string());
    record.features.redness.present = true;
    record.features.redness.extent_percent = 35.0;
    record.localization.bbox = [1.0, 2.0, 3.0, 4.0];
    record.overall_confidence = 0.7;

    let encoded = record.to_json_bytes().expect("encoding should succeed");
    let decoded = AnalysisRecord::from_json_bytes(&encoded).expect("decoding should succeed");
    assert_eq!(decoded, record);
    assert_eq!(
        decoded.features.flagged(),
        vec![FeatureName::Redness, FeatureName::Discharge]
    );
}
