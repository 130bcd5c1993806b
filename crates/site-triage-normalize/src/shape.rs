//! Shape tagging for untyped model output.
//!
//! Every field the normalizer reads is first tagged as object-shaped,
//! scalar-shaped or absent, and each merge rule matches on that tag.

use serde_json::{Map, Value};

/// Shape of one raw field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawShape<'a> {
    /// A JSON object.
    Object(&'a Map<String, Value>),
    /// Any non-null, non-object value (bool, number, string, array).
    Scalar(&'a Value),
    /// Key missing or explicitly `null`.
    Absent,
}

impl<'a> RawShape<'a> {
    /// Tags an optional raw value.
    pub fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => RawShape::Absent,
            Some(Value::Object(object)) => RawShape::Object(object),
            Some(other) => RawShape::Scalar(other),
        }
    }
}

/// JSON truthiness: `null`, `false`, zero, empty strings, empty arrays and
/// empty objects are falsy; everything else is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}

/// Reads a finite number from a JSON number or numeric string.
pub(crate) fn number_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Reads text from a JSON string, or renders a number/bool as text.
pub(crate) fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Reads exactly four numbers as a bounding box.
pub(crate) fn bbox_value(value: &Value) -> Option<[f64; 4]> {
    let items = value.as_array().filter(|items| items.len() == 4)?;
    let mut bbox = [0.0; 4];
    for (slot, item) in bbox.iter_mut().zip(items) {
        *slot = number_value(item)?;
    }
    Some(bbox)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tags_null_as_absent() {
        assert_eq!(RawShape::of(None), RawShape::Absent);
        assert_eq!(RawShape::of(Some(&Value::Null)), RawShape::Absent);
        assert!(matches!(RawShape::of(Some(&json!({}))), RawShape::Object(_)));
        assert!(matches!(RawShape::of(Some(&json!([1]))), RawShape::Scalar(_)));
    }

    #[test]
    fn truthiness_follows_json_values() {
        assert!(truthy(&json!("yes")));
        assert!(truthy(&json!(2)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!([])));
    }

    #[test]
    fn bbox_requires_four_numbers() {
        assert_eq!(bbox_value(&json!([1, 2, "3", 4.5])), Some([1.0, 2.0, 3.0, 4.5]));
        assert_eq!(bbox_value(&json!([1, 2, 3])), None);
        assert_eq!(bbox_value(&json!([1, 2, 3, "x"])), None);
    }
}
