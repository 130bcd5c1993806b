#![warn(missing_docs)]
//! # site-triage-core
//!
//! ## Purpose
//! Defines the canonical data model shared across the `site-triage` workspace.
//!
//! ## Responsibilities
//! - Represent one catheter-site analysis as a fixed-shape [`AnalysisRecord`].
//! - Represent the ten clinical features with per-feature typed entries.
//! - Represent the triage outcome as [`ClassificationResult`].
//! - Encode/decode records for transport and storage.
//!
//! ## Data flow
//! The normalizer builds an [`AnalysisRecord`] from untyped model output.
//! The classifier reads the record's [`FeatureSet`] and overall confidence and
//! emits a [`ClassificationResult`].
//!
//! ## Ownership and lifetimes
//! Records own all of their strings. A record is created once per analysis and
//! is never mutated after normalization completes.
//!
//! ## Error model
//! Only the JSON codec can fail; failures surface as [`CoreError::Codec`].
//!
//! ## Security and privacy notes
//! Records carry model observations only. Image bytes never enter this crate.
//!
//! ## Example
//! ```rust
//! use site_triage_core::{AnalysisRecord, FEATURE_NAMES};
//!
//! let record = AnalysisRecord::with_defaults("site.jpg");
//! let raw = record.to_raw().expect("record should encode");
//! assert_eq!(raw["features"].as_object().unwrap().len(), FEATURE_NAMES.len());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical feature names in schema order.
pub const FEATURE_NAMES: [&str; 10] = [
    "redness",
    "swelling",
    "dressing_lift",
    "discharge",
    "exposed_catheter",
    "open_wound",
    "bruising",
    "crusting",
    "erythema_border_sharp",
    "fluctuance",
];

/// Label the record carries before the model or classifier says otherwise.
pub const DEFAULT_RECOMMENDED_LABEL: &str = "Green";

/// One of the ten known clinical features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureName {
    /// Visible erythema around the insertion site.
    Redness,
    /// Local oedema.
    Swelling,
    /// Dressing no longer adherent.
    DressingLift,
    /// Fluid leaving the site.
    Discharge,
    /// Catheter length visible outside the dressing.
    ExposedCatheter,
    /// Broken skin at or near the site.
    OpenWound,
    /// Bruising.
    Bruising,
    /// Crusting.
    Crusting,
    /// Sharply demarcated erythema border.
    ErythemaBorderSharp,
    /// Fluctuance suggesting a collection.
    Fluctuance,
}

impl FeatureName {
    /// All feature names in schema order.
    pub const ALL: [FeatureName; 10] = [
        FeatureName::Redness,
        FeatureName::Swelling,
        FeatureName::DressingLift,
        FeatureName::Discharge,
        FeatureName::ExposedCatheter,
        FeatureName::OpenWound,
        FeatureName::Bruising,
        FeatureName::Crusting,
        FeatureName::ErythemaBorderSharp,
        FeatureName::Fluctuance,
    ];

    /// Returns the wire name of this feature.
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureName::Redness => "redness",
            FeatureName::Swelling => "swelling",
            FeatureName::DressingLift => "dressing_lift",
            FeatureName::Discharge => "discharge",
            FeatureName::ExposedCatheter => "exposed_catheter",
            FeatureName::OpenWound => "open_wound",
            FeatureName::Bruising => "bruising",
            FeatureName::Crusting => "crusting",
            FeatureName::ErythemaBorderSharp => "erythema_border_sharp",
            FeatureName::Fluctuance => "fluctuance",
        }
    }

    /// Looks up a feature by wire name. Unknown names return `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.as_str() == name)
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Feature with a presence flag and a visible extent (redness, swelling).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtentFeature {
    /// Whether the sign is visible.
    pub present: bool,
    /// Share of the visible site affected, in percent.
    pub extent_percent: f64,
    /// Model confidence in [0.0, 1.0], if reported.
    pub confidence: Option<f64>,
}

/// Feature described only by presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenceFeature {
    /// Whether the sign is visible.
    pub present: bool,
    /// Model confidence in [0.0, 1.0], if reported.
    pub confidence: Option<f64>,
}

/// Discharge observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DischargeFeature {
    /// Whether discharge is visible.
    pub present: bool,
    /// Discharge character, for example `purulent` or `serous`.
    #[serde(rename = "type")]
    pub discharge_type: Option<String>,
    /// Free-text amount, for example `scant`.
    pub amount: Option<String>,
    /// Model confidence in [0.0, 1.0], if reported.
    pub confidence: Option<f64>,
}

impl DischargeFeature {
    /// Returns `true` when discharge is present and typed exactly `purulent`.
    ///
    /// Any other spelling counts as other discharge.
    pub fn is_purulent(&self) -> bool {
        self.present && self.discharge_type.as_deref() == Some(PURULENT_DISCHARGE_TYPE)
    }
}

/// Discharge type that triggers the purulent override.
pub const PURULENT_DISCHARGE_TYPE: &str = "purulent";

/// Exposed catheter observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposedCatheterFeature {
    /// Whether catheter length is exposed.
    pub present: bool,
    /// Estimated exposed length in millimetres.
    pub length_mm_estimate: Option<f64>,
    /// Model confidence in [0.0, 1.0], if reported.
    pub confidence: Option<f64>,
}

/// Open wound observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenWoundFeature {
    /// Whether an open wound is visible.
    pub present: bool,
    /// Estimated wound size in millimetres.
    pub size_mm: Option<f64>,
    /// Model confidence in [0.0, 1.0], if reported.
    pub confidence: Option<f64>,
}

/// Binary-shaped feature (`erythema_border_sharp`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BorderFeature {
    /// Whether the erythema border is sharp.
    pub yes: bool,
    /// Model confidence in [0.0, 1.0], if reported.
    pub confidence: Option<f64>,
}

/// The fixed set of ten features. No other keys exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureSet {
    /// Redness.
    pub redness: ExtentFeature,
    /// Swelling.
    pub swelling: ExtentFeature,
    /// Dressing lift.
    pub dressing_lift: PresenceFeature,
    /// Discharge.
    pub discharge: DischargeFeature,
    /// Exposed catheter.
    pub exposed_catheter: ExposedCatheterFeature,
    /// Open wound.
    pub open_wound: OpenWoundFeature,
    /// Bruising.
    pub bruising: PresenceFeature,
    /// Crusting.
    pub crusting: PresenceFeature,
    /// Sharp erythema border.
    pub erythema_border_sharp: BorderFeature,
    /// Fluctuance.
    pub fluctuance: PresenceFeature,
}

impl FeatureSet {
    /// Returns the presence (or `yes`) flag of one feature.
    pub fn is_flagged(&self, name: FeatureName) -> bool {
        match name {
            FeatureName::Redness => self.redness.present,
            FeatureName::Swelling => self.swelling.present,
            FeatureName::DressingLift => self.dressing_lift.present,
            FeatureName::Discharge => self.discharge.present,
            FeatureName::ExposedCatheter => self.exposed_catheter.present,
            FeatureName::OpenWound => self.open_wound.present,
            FeatureName::Bruising => self.bruising.present,
            FeatureName::Crusting => self.crusting.present,
            FeatureName::ErythemaBorderSharp => self.erythema_border_sharp.yes,
            FeatureName::Fluctuance => self.fluctuance.present,
        }
    }

    /// Returns the reported confidence of one feature.
    pub fn confidence(&self, name: FeatureName) -> Option<f64> {
        match name {
            FeatureName::Redness => self.redness.confidence,
            FeatureName::Swelling => self.swelling.confidence,
            FeatureName::DressingLift => self.dressing_lift.confidence,
            FeatureName::Discharge => self.discharge.confidence,
            FeatureName::ExposedCatheter => self.exposed_catheter.confidence,
            FeatureName::OpenWound => self.open_wound.confidence,
            FeatureName::Bruising => self.bruising.confidence,
            FeatureName::Crusting => self.crusting.confidence,
            FeatureName::ErythemaBorderSharp => self.erythema_border_sharp.confidence,
            FeatureName::Fluctuance => self.fluctuance.confidence,
        }
    }

    /// Returns flagged features in schema order.
    pub fn flagged(&self) -> Vec<FeatureName> {
        FeatureName::ALL
            .into_iter()
            .filter(|name| self.is_flagged(*name))
            .collect()
    }
}

/// Photo quality assessment reported by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityInfo {
    /// Lighting was adequate.
    pub adequate_lighting: bool,
    /// Image was in focus.
    pub focused: bool,
    /// The whole site was in view.
    pub view_complete: bool,
    /// Free-text remarks.
    pub notes: String,
}

/// Location of the site within the image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizationInfo {
    /// Bounding box `[x0, y0, x1, y1]` in pixels.
    pub bbox: [f64; 4],
    /// Whether a segmentation mask was produced.
    pub segmentation_mask_available: bool,
}

/// Canonical analysis of one photograph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Identifier of the analysed image.
    pub image_id: String,
    /// Photo quality.
    pub quality: QualityInfo,
    /// Site location.
    pub localization: LocalizationInfo,
    /// Clinical features.
    pub features: FeatureSet,
    /// Model self-reported confidence in [0.0, 1.0].
    pub overall_confidence: f64,
    /// Label suggested by the model. Informational only.
    pub recommended_label: String,
    /// Model narrative.
    pub explanation: String,
}

impl AnalysisRecord {
    /// Builds the all-defaults record for `image_id`.
    pub fn with_defaults(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            quality: QualityInfo::default(),
            localization: LocalizationInfo::default(),
            features: FeatureSet::default(),
            overall_confidence: 0.0,
            recommended_label: DEFAULT_RECOMMENDED_LABEL.to_string(),
            explanation: String::new(),
        }
    }

    /// Converts the record back into untyped JSON.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when serialization fails.
    pub fn to_raw(&self) -> Result<serde_json::Value, CoreError> {
        serde_json::to_value(self).map_err(CoreError::Codec)
    }

    /// Serializes the record to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(CoreError::Codec)
    }

    /// Strictly decodes a record that is already in canonical shape.
    ///
    /// Use the normalizer for model output; this decoder rejects anything
    /// outside the schema.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(raw).map_err(CoreError::Codec)
    }
}

/// Triage category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Low concern.
    Green,
    /// Moderate concern.
    Yellow,
    /// High concern; urgent review.
    Red,
    /// Model confidence too low to classify.
    Uncertain,
}

impl Label {
    /// Returns the wire name of the label.
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Green => "Green",
            Label::Yellow => "Yellow",
            Label::Red => "Red",
            Label::Uncertain => "Uncertain",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Deterministic triage outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Triage label.
    pub label: Label,
    /// Risk score in [0, 100].
    pub risk_score: u8,
    /// Findings that drove the label.
    pub explanation: String,
}

/// Error type for core codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON encoding/decoding error.
    #[error("record codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for the record model.

    use super::*;

    #[test]
    fn feature_names_match_wire_names() {
        let wire: Vec<&str> = FeatureName::ALL.iter().map(|name| name.as_str()).collect();
        assert_eq!(wire, FEATURE_NAMES);
        assert_eq!(FeatureName::from_wire("fluctuance"), Some(FeatureName::Fluctuance));
        assert_eq!(FeatureName::from_wire("pain"), None);
    }

    #[test]
    fn default_record_serializes_template_shape() {
        let raw = AnalysisRecord::with_defaults("img-1")
            .to_raw()
            .expect("record should encode");

        assert_eq!(raw["image_id"], "img-1");
        assert_eq!(raw["recommended_label"], "Green");
        assert_eq!(raw["localization"]["bbox"].as_array().map(Vec::len), Some(4));
        assert!(raw["features"]["discharge"]["type"].is_null());
        assert_eq!(raw["features"]["redness"]["extent_percent"], 0.0);
        assert_eq!(raw["features"]["erythema_border_sharp"]["yes"], false);
        assert!(raw["features"]["erythema_border_sharp"].get("present").is_none());
    }

    #[test]
    fn purulent_check_is_exact_and_requires_presence() {
        let mut discharge = DischargeFeature {
            present: false,
            discharge_type: Some("purulent".to_string()),
            ..DischargeFeature::default()
        };
        assert!(!discharge.is_purulent());
        discharge.present = true;
        assert!(discharge.is_purulent());

        for variant in ["Purulent", " PURULENT ", "purulent "] {
            discharge.discharge_type = Some(variant.to_string());
            assert!(!discharge.is_purulent(), "{variant:?} should not match");
        }
    }

    #[test]
    fn strict_decoder_rejects_unknown_feature_keys() {
        let mut raw = AnalysisRecord::with_defaults("img-2")
            .to_raw()
            .expect("record should encode");
        raw["features"]["pain"] = serde_json::json!({"present": true});
        let bytes = serde_json::to_vec(&raw).expect("json should encode");
        assert!(AnalysisRecord::from_json_bytes(&bytes).is_err());
    }
}
