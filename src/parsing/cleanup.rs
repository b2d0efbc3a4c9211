//! Best-effort cleanup of model output before JSON decoding

use serde_json::{Map, Value};

const FENCE: &str = "```";

/// Normalize raw model text toward a bare JSON object.
///
/// Trims whitespace, strips a surrounding fenced code block, then drops
/// everything before the first `{`. Malformed JSON stays malformed.
pub fn clean_json(raw: &str) -> &str {
    let mut text = raw.trim();

    if text.len() >= 2 * FENCE.len() && text.starts_with(FENCE) && text.ends_with(FENCE) {
        text = text[FENCE.len()..text.len() - FENCE.len()].trim();
    }

    if let Some(start) = text.find('{') {
        text = &text[start..];
    }

    text
}

/// Clean `raw` and decode it as a JSON object
pub fn decode_object(raw: &str) -> Result<Map<String, Value>, String> {
    let cleaned = clean_json(raw);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", value_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

/// Human-readable kind of a JSON value, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
