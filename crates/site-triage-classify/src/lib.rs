#![warn(missing_docs)]
//! # site-triage-classify
//!
//! ## Purpose
//! Derives a bounded risk score and a triage label from a normalized record.
//!
//! ## Responsibilities
//! - Score the ten features with a fixed weight table.
//! - Apply the low-confidence and purulent-discharge overrides.
//! - Map scores onto Green/Yellow/Red and explain the outcome.
//!
//! ## Data flow
//! [`AnalysisRecord`] -> [`classify`] (calls [`compute_risk_score`]) ->
//! [`ClassificationResult`].
//!
//! ## Ownership and lifetimes
//! Records are borrowed; results own their explanation text.
//!
//! ## Error model
//! Classification is total and has no error type. `Uncertain` is an outcome,
//! not a failure.
//!
//! ## Security and privacy notes
//! Weight and threshold tables are constants; nothing here is mutable at
//! runtime.

use site_triage_core::{AnalysisRecord, ClassificationResult, FeatureName, FeatureSet, Label};

/// Per-feature contributions to the risk score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskWeights {
    /// Present discharge typed as purulent.
    pub purulent_discharge: f64,
    /// Present discharge of any other or unknown type.
    pub other_discharge: f64,
    /// Points per percent of visible redness extent.
    pub redness_per_percent: f64,
    /// Swelling.
    pub swelling: f64,
    /// Dressing lift.
    pub dressing_lift: f64,
    /// Open wound.
    pub open_wound: f64,
    /// Exposed catheter.
    pub exposed_catheter: f64,
    /// Fluctuance.
    pub fluctuance: f64,
    /// Sharp erythema border.
    pub erythema_border_sharp: f64,
    /// Bruising.
    pub bruising: f64,
    /// Crusting.
    pub crusting: f64,
}

/// Weight table used by [`compute_risk_score`].
pub const DEFAULT_RISK_WEIGHTS: RiskWeights = RiskWeights {
    purulent_discharge: 60.0,
    other_discharge: 25.0,
    redness_per_percent: 0.25,
    swelling: 15.0,
    dressing_lift: 10.0,
    open_wound: 20.0,
    exposed_catheter: 25.0,
    fluctuance: 20.0,
    erythema_border_sharp: 10.0,
    bruising: 5.0,
    crusting: 5.0,
};

/// Cut-offs used to turn confidence and score into a label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelThresholds {
    /// Overall confidence strictly below this yields `Uncertain`.
    pub min_confidence: f64,
    /// Scores at or above this are at least `Yellow`.
    pub yellow_at: u8,
    /// Scores at or above this are `Red`.
    pub red_at: u8,
}

/// Thresholds used by [`classify`].
pub const DEFAULT_THRESHOLDS: LabelThresholds = LabelThresholds {
    min_confidence: 0.5,
    yellow_at: 25,
    red_at: 60,
};

/// Upper bound of the risk score.
pub const MAX_RISK_SCORE: u8 = 100;

/// Computes the risk score with [`DEFAULT_RISK_WEIGHTS`].
pub fn compute_risk_score(features: &FeatureSet) -> u8 {
    compute_risk_score_with(features, &DEFAULT_RISK_WEIGHTS)
}

/// Computes the risk score with an explicit weight table.
///
/// Contributions are summed unbounded, then clamped to [0, 100] and rounded.
pub fn compute_risk_score_with(features: &FeatureSet, weights: &RiskWeights) -> u8 {
    let mut total = 0.0;

    if features.discharge.is_purulent() {
        total += weights.purulent_discharge;
    } else if features.discharge.present {
        total += weights.other_discharge;
    }

    if features.redness.present {
        total += weights.redness_per_percent * features.redness.extent_percent.clamp(0.0, 100.0);
    }

    let fixed = [
        (features.swelling.present, weights.swelling),
        (features.dressing_lift.present, weights.dressing_lift),
        (features.open_wound.present, weights.open_wound),
        (features.exposed_catheter.present, weights.exposed_catheter),
        (features.fluctuance.present, weights.fluctuance),
        (features.erythema_border_sharp.yes, weights.erythema_border_sharp),
        (features.bruising.present, weights.bruising),
        (features.crusting.present, weights.crusting),
    ];
    total += fixed
        .iter()
        .filter(|(flagged, _)| *flagged)
        .map(|(_, weight)| weight)
        .sum::<f64>();

    total.clamp(0.0, f64::from(MAX_RISK_SCORE)).round() as u8
}

/// Maps a score onto Green/Yellow/Red.
pub fn label_for_score(score: u8, thresholds: &LabelThresholds) -> Label {
    if score >= thresholds.red_at {
        Label::Red
    } else if score >= thresholds.yellow_at {
        Label::Yellow
    } else {
        Label::Green
    }
}

/// Classifies a record with the default weights and thresholds.
pub fn classify(record: &AnalysisRecord) -> ClassificationResult {
    classify_with(record, &DEFAULT_RISK_WEIGHTS, &DEFAULT_THRESHOLDS)
}

/// Classifies a record.
///
/// Rules, first match wins:
/// 1. overall confidence below `min_confidence` -> `Uncertain`;
/// 2. purulent discharge -> `Red`;
/// 3. otherwise the score decides via [`label_for_score`].
///
/// The risk score is always computed, including for overridden labels.
pub fn classify_with(
    record: &AnalysisRecord,
    weights: &RiskWeights,
    thresholds: &LabelThresholds,
) -> ClassificationResult {
    let features = &record.features;
    let risk_score = compute_risk_score_with(features, weights);
    let findings = describe_findings(features);

    if record.overall_confidence < thresholds.min_confidence {
        let mut explanation = format!(
            "Low model confidence ({:.2} < {:.2}); manual review required.",
            record.overall_confidence, thresholds.min_confidence
        );
        if !findings.is_empty() {
            explanation.push_str(&format!(" Unconfirmed findings: {}.", findings.join(", ")));
        }
        return ClassificationResult {
            label: Label::Uncertain,
            risk_score,
            explanation,
        };
    }

    if features.discharge.is_purulent() {
        let others: Vec<String> = findings
            .into_iter()
            .filter(|finding| !finding.ends_with("discharge"))
            .collect();
        let mut explanation =
            "Purulent discharge detected; urgent clinical review recommended.".to_string();
        if !others.is_empty() {
            explanation.push_str(&format!(" Also noted: {}.", others.join(", ")));
        }
        return ClassificationResult {
            label: Label::Red,
            risk_score,
            explanation,
        };
    }

    let label = label_for_score(risk_score, thresholds);
    let explanation = if findings.is_empty() {
        format!("No concerning features detected (risk score {risk_score}).")
    } else {
        let concern = match label {
            Label::Red => "High concern",
            Label::Yellow => "Moderate concern",
            Label::Green | Label::Uncertain => "Low concern",
        };
        format!("{concern}: {} (risk score {risk_score}).", findings.join(", "))
    };

    ClassificationResult {
        label,
        risk_score,
        explanation,
    }
}

fn describe_findings(features: &FeatureSet) -> Vec<String> {
    FeatureName::ALL
        .into_iter()
        .filter(|name| features.is_flagged(*name))
        .map(|name| match name {
            FeatureName::Discharge => match features.discharge.discharge_type.as_deref() {
                Some(kind) if !kind.trim().is_empty() => {
                    format!("{} discharge", kind.trim().to_lowercase())
                }
                _ => "discharge".to_string(),
            },
            FeatureName::Redness => with_extent("redness", features.redness.extent_percent),
            FeatureName::Swelling => with_extent("swelling", features.swelling.extent_percent),
            FeatureName::ErythemaBorderSharp => "sharp erythema border".to_string(),
            other => other.as_str().replace('_', " "),
        })
        .collect()
}

fn with_extent(label: &str, extent_percent: f64) -> String {
    if extent_percent > 0.0 {
        format!("{label} ({extent_percent:.0}% extent)")
    } else {
        label.to_string()
    }
}
