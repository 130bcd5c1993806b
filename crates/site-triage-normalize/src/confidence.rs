//! Confidence coercion for numeric and descriptive model output.

use serde_json::Value;

/// Descriptive confidence words and their numeric values.
pub const CONFIDENCE_VOCABULARY: [(&str, f64); 6] = [
    ("very low", 0.1),
    ("low", 0.25),
    ("medium", 0.5),
    ("high", 0.75),
    ("very high", 0.9),
    ("certain", 1.0),
];

/// Converts any JSON value into a confidence in [0.0, 1.0].
///
/// Numbers are clamped. Strings are matched against
/// [`CONFIDENCE_VOCABULARY`] (trimmed, case-insensitive) before a numeric
/// parse is attempted. Everything else, and every failed parse, yields `0.0`.
pub fn coerce_confidence(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().map_or(0.0, clamp_unit),
        Value::String(text) => {
            let key = text.trim().to_lowercase();
            if let Some((_, mapped)) = CONFIDENCE_VOCABULARY
                .iter()
                .find(|(word, _)| *word == key)
            {
                return *mapped;
            }

            key.parse::<f64>().map_or(0.0, clamp_unit)
        }
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => 0.0,
    }
}

/// Same as [`coerce_confidence`], treating a missing value as `null`.
pub fn coerce_optional_confidence(value: Option<&Value>) -> f64 {
    value.map_or(0.0, coerce_confidence)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
