//! Tests that adding findings never lowers the risk score.

use site_triage_classify::compute_risk_score;
use site_triage_core::{FeatureName, FeatureSet};

fn flag(features: &mut FeatureSet, name: FeatureName) {
    match name {
        FeatureName::Redness => features.redness.present = true,
        FeatureName::Swelling => features.swelling.present = true,
        FeatureName::DressingLift => features.dressing_lift.present = true,
        FeatureName::Discharge => features.discharge.present = true,
        FeatureName::ExposedCatheter => features.exposed_catheter.present = true,
        FeatureName::OpenWound => features.open_wound.present = true,
        FeatureName::Bruising => features.bruising.present = true,
        FeatureName::Crusting => features.crusting.present = true,
        FeatureName::ErythemaBorderSharp => features.erythema_border_sharp.yes = true,
        FeatureName::Fluctuance => features.fluctuance.present = true,
    }
}

fn baselines() -> Vec<FeatureSet> {
    let mut moderate = FeatureSet::default();
    moderate.redness.extent_percent = 40.0;
    moderate.swelling.present = true;

    let mut severe = FeatureSet::default();
    severe.discharge.discharge_type = Some("purulent".to_string());
    severe.redness.extent_percent = 90.0;
    severe.open_wound.present = true;

    vec![FeatureSet::default(), moderate, severe]
}

#[test]
fn risk_monotonicity_tests_presence_never_lowers_score() {
    for base in baselines() {
        let before = compute_risk_score(&base);
        for name in FeatureName::ALL {
            let mut raised = base.clone();
            flag(&mut raised, name);
            let after = compute_risk_score(&raised);
            assert!(after >= before, "{name} lowered score {before} -> {after}");
            assert!(after <= 100);
        }
    }
}

#[test]
fn risk_monotonicity_tests_extent_never_lowers_score() {
    let mut features = FeatureSet::default();
    features.redness.present = true;

    let mut previous = 0;
    for extent in (0..=120).step_by(5) {
        features.redness.extent_percent = f64::from(extent);
        let score = compute_risk_score(&features);
        assert!(score >= previous);
        previous = score;
    }
    assert_eq!(previous, 25);
}
