#![warn(missing_docs)]
//! # site-triage-normalize
//!
//! ## Purpose
//! Coerces arbitrary vision-model JSON into the canonical [`AnalysisRecord`].
//!
//! ## Responsibilities
//! - Convert numeric or descriptive confidences into [0.0, 1.0].
//! - Merge quality, localization and feature fields over schema defaults.
//! - Drop unknown feature names and keep exactly the ten canonical features.
//!
//! ## Data flow
//! Parsed model output (`serde_json::Value`) -> [`normalize_response`] ->
//! [`AnalysisRecord`] consumed by the classifier.
//!
//! ## Ownership and lifetimes
//! The raw value is only borrowed; the returned record owns every string it
//! carries.
//!
//! ## Error model
//! Normalization is total. Missing, mistyped or unparsable input is replaced
//! by schema defaults, so no error type exists here.
//!
//! ## Security and privacy notes
//! Unknown keys are discarded rather than passed through, so model output
//! cannot smuggle extra fields into stored records.

mod confidence;
mod shape;

pub use confidence::{CONFIDENCE_VOCABULARY, coerce_confidence, coerce_optional_confidence};
pub use shape::{RawShape, truthy};

use serde_json::{Map, Value};
use site_triage_core::{
    AnalysisRecord, BorderFeature, DischargeFeature, ExposedCatheterFeature, ExtentFeature,
    FeatureName, FeatureSet, LocalizationInfo, OpenWoundFeature, PresenceFeature, QualityInfo,
};
use tracing::debug;

use crate::shape::{bbox_value, number_value, text_value};

/// Normalizes raw model output for `image_id`.
///
/// `image_id`, `explanation` and `recommended_label` are replaced only when
/// the raw object carries a non-null value for them. A non-object `raw`
/// yields the all-defaults record.
pub fn normalize_response(raw: &Value, image_id: &str) -> AnalysisRecord {
    let mut record = AnalysisRecord::with_defaults(image_id);
    let Some(root) = raw.as_object() else {
        debug!(image_id, "model output is not an object; using defaults");
        return record;
    };

    if let Some(id) = root.get("image_id").and_then(text_value) {
        record.image_id = id;
    }
    if let Some(explanation) = root.get("explanation").and_then(text_value) {
        record.explanation = explanation;
    }
    if let Some(label) = root.get("recommended_label").and_then(text_value) {
        record.recommended_label = label;
    }

    record.overall_confidence = coerce_optional_confidence(root.get("overall_confidence"));
    merge_quality(&mut record.quality, RawShape::of(root.get("quality")));
    merge_localization(&mut record.localization, RawShape::of(root.get("localization")));
    merge_features(&mut record.features, RawShape::of(root.get("features")));
    record
}

fn merge_quality(quality: &mut QualityInfo, shape: RawShape<'_>) {
    match shape {
        RawShape::Object(object) => {
            let flags = [
                ("adequate_lighting", &mut quality.adequate_lighting),
                ("focused", &mut quality.focused),
                ("view_complete", &mut quality.view_complete),
            ];
            for (key, slot) in flags {
                if let Some(value) = object.get(key).filter(|value| !value.is_null()) {
                    *slot = truthy(value);
                }
            }

            if let Some(notes) = object.get("notes").filter(|notes| truthy(notes)) {
                quality.notes = match notes {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
            }
        }
        RawShape::Scalar(Value::String(notes)) => quality.notes = notes.clone(),
        RawShape::Scalar(_) | RawShape::Absent => {}
    }
}

fn merge_localization(localization: &mut LocalizationInfo, shape: RawShape<'_>) {
    match shape {
        RawShape::Object(object) => {
            if let Some(bbox) = object.get("bbox").and_then(bbox_value) {
                localization.bbox = bbox;
            }
            if let Some(mask) = object.get("segmentation_mask_available") {
                localization.segmentation_mask_available = truthy(mask);
            }
        }
        RawShape::Scalar(value) => {
            if let Some(bbox) = bbox_value(value) {
                localization.bbox = bbox;
            }
        }
        RawShape::Absent => {}
    }
}

fn merge_features(features: &mut FeatureSet, shape: RawShape<'_>) {
    let RawShape::Object(entries) = shape else {
        if shape != RawShape::Absent {
            debug!("features is not an object; keeping defaults");
        }
        return;
    };

    for (name, value) in entries {
        let Some(feature) = FeatureName::from_wire(name) else {
            debug!(feature = %name, "dropping unknown feature");
            continue;
        };

        let shape = RawShape::of(Some(value));
        match feature {
            FeatureName::Redness => features.redness.merge(shape),
            FeatureName::Swelling => features.swelling.merge(shape),
            FeatureName::DressingLift => features.dressing_lift.merge(shape),
            FeatureName::Discharge => features.discharge.merge(shape),
            FeatureName::ExposedCatheter => features.exposed_catheter.merge(shape),
            FeatureName::OpenWound => features.open_wound.merge(shape),
            FeatureName::Bruising => features.bruising.merge(shape),
            FeatureName::Crusting => features.crusting.merge(shape),
            FeatureName::ErythemaBorderSharp => merge_border(&mut features.erythema_border_sharp, shape),
            FeatureName::Fluctuance => features.fluctuance.merge(shape),
        }
    }
}

fn merge_border(entry: &mut BorderFeature, shape: RawShape<'_>) {
    match shape {
        RawShape::Object(object) => {
            if let Some(yes) = object.get("yes") {
                entry.yes = truthy(yes);
            }
            if let Some(confidence) = object.get("confidence").filter(|value| !value.is_null()) {
                entry.confidence = Some(coerce_confidence(confidence));
            }
        }
        RawShape::Scalar(value) => entry.yes = truthy(value),
        RawShape::Absent => {}
    }
}

/// Merge rules shared by every presence-flagged feature entry.
trait StandardEntry {
    fn set_present(&mut self, present: bool);

    /// Copies one non-null attribute. Keys the entry does not carry are ignored.
    fn merge_attribute(&mut self, key: &str, value: &Value);

    fn merge(&mut self, shape: RawShape<'_>) {
        match shape {
            RawShape::Object(object) => self.merge_object(object),
            RawShape::Scalar(value) => self.set_present(truthy(value)),
            RawShape::Absent => {}
        }
    }

    fn merge_object(&mut self, object: &Map<String, Value>) {
        // An explicit `present` wins; `yes` is accepted as an alias.
        let flag = object
            .get("present")
            .filter(|value| !value.is_null())
            .or_else(|| object.get("yes"));
        if let Some(flag) = flag.filter(|value| !value.is_null()) {
            self.set_present(truthy(flag));
        }

        for (key, value) in object {
            if key != "present" && !value.is_null() {
                self.merge_attribute(key, value);
            }
        }
    }
}

fn merge_confidence(slot: &mut Option<f64>, value: &Value) {
    *slot = Some(coerce_confidence(value));
}

impl StandardEntry for ExtentFeature {
    fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    fn merge_attribute(&mut self, key: &str, value: &Value) {
        match key {
            "confidence" => merge_confidence(&mut self.confidence, value),
            "extent_percent" => {
                if let Some(extent) = number_value(value) {
                    self.extent_percent = extent;
                }
            }
            _ => {}
        }
    }
}

impl StandardEntry for PresenceFeature {
    fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    fn merge_attribute(&mut self, key: &str, value: &Value) {
        if key == "confidence" {
            merge_confidence(&mut self.confidence, value);
        }
    }
}

impl StandardEntry for DischargeFeature {
    fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    fn merge_attribute(&mut self, key: &str, value: &Value) {
        match key {
            "confidence" => merge_confidence(&mut self.confidence, value),
            "type" => {
                if let Some(kind) = text_value(value) {
                    self.discharge_type = Some(kind);
                }
            }
            "amount" => {
                if let Some(amount) = text_value(value) {
                    self.amount = Some(amount);
                }
            }
            _ => {}
        }
    }
}

impl StandardEntry for ExposedCatheterFeature {
    fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    fn merge_attribute(&mut self, key: &str, value: &Value) {
        match key {
            "confidence" => merge_confidence(&mut self.confidence, value),
            "length_mm_estimate" => {
                if let Some(length) = number_value(value) {
                    self.length_mm_estimate = Some(length);
                }
            }
            _ => {}
        }
    }
}

impl StandardEntry for OpenWoundFeature {
    fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    fn merge_attribute(&mut self, key: &str, value: &Value) {
        match key {
            "confidence" => merge_confidence(&mut self.confidence, value),
            "size_mm" => {
                if let Some(size) = number_value(value) {
                    self.size_mm = Some(size);
                }
            }
            _ => {}
        }
    }
}
