use serde_json::Value;

/// Returns `true` for a sequence or map without entries.
///
/// Scalars are never "empty containers", use [`is_empty_value`] when a scalar
/// should count as having no content.
pub fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Array(arr) => arr.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Check if a value carries no content.
///
/// `null`, `""`, `[]` and `{}` are empty; other scalars are not.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use auto_immutable_util::is_empty::is_empty_value;
///
/// assert!(is_empty_value(&json!({})));
/// assert!(is_empty_value(&json!(null)));
/// assert!(!is_empty_value(&json!(0)));
/// assert!(!is_empty_value(&json!({"a": 1})));
/// ```
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => is_empty_container(value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
