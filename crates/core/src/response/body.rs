//! JSON token response flattening

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Flatten a JSON object body into string key/value pairs.
///
/// Strings are kept as-is, numbers and booleans are rendered with their JSON
/// text, nested arrays or objects keep their JSON text, and `null` values are
/// dropped.
///
/// # Errors
/// Returns the parse error when the body is not a JSON object.
pub fn flatten_json_body(body: &str) -> Result<HashMap<String, String>, serde_json::Error> {
    let object: Map<String, Value> = serde_json::from_str(body)?;
    Ok(object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect())
}
