//! Request fingerprinting.
//!
//! The fingerprint is a SHA-256 digest over the canonical (key-sorted,
//! compact) JSON of `{ kwargs, messages, model }`, computed from the same
//! sanitized structures that end up in the artifact.

use crate::convert::to_jsonable;
use crate::sanitize::strip_image_payloads;
use promptlog_audit_types::Fingerprint;
use promptlog_backends_core::Message;
use serde_json::{Map, Value};

/// Messages as they appear in logs: converted, with image payloads stripped.
pub fn serialize_messages(messages: &[Message]) -> Value {
    strip_image_payloads(to_jsonable(messages).into_value())
}

/// Rebuild `value` with every object's keys in sorted order.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Fingerprint a request from its sanitized parts.
pub fn fingerprint_request(model: &str, messages: &Value, kwargs: &Map<String, Value>) -> Fingerprint {
    let mut payload = Map::new();
    payload.insert("model".to_string(), Value::String(model.to_string()));
    payload.insert("messages".to_string(), messages.clone());
    payload.insert("kwargs".to_string(), Value::Object(kwargs.clone()));

    let canonical = canonicalize(Value::Object(payload)).to_string();
    Fingerprint::digest(canonical.as_bytes())
}
