//! Removal of heavy payloads and credentials before anything is persisted.

use serde_json::{Map, Value};

/// Key (and content-part tag) carrying inline image payloads.
pub const IMAGE_PAYLOAD_KEY: &str = "image_url";

/// Replacement for credential-like option values.
pub const REDACTED: &str = "***REDACTED***";

/// Lowercase fragments that mark an option key as a credential.
const CREDENTIAL_FRAGMENTS: [&str; 5] = ["api_key", "apikey", "authorization", "auth", "token"];

/// Recursively drop image payloads.
///
/// An object tagged `"type": "image_url"` keeps only its tag, so the log still
/// shows that an image was present. Any other `image_url` key is removed
/// wherever it occurs.
pub fn strip_image_payloads(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some(IMAGE_PAYLOAD_KEY) {
                let mut tag = Map::new();
                tag.insert("type".to_string(), Value::String(IMAGE_PAYLOAD_KEY.to_string()));
                return Value::Object(tag);
            }
            Value::Object(
                map.into_iter()
                    .filter(|(key, _)| key != IMAGE_PAYLOAD_KEY)
                    .map(|(key, v)| (key, strip_image_payloads(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(strip_image_payloads).collect()),
        other => other,
    }
}

/// Whether an option key looks like it holds a credential.
pub fn is_credential_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    CREDENTIAL_FRAGMENTS.iter().any(|fragment| lower.contains(fragment))
}

/// Copy of `options` with credential-like values replaced by [`REDACTED`].
///
/// Only top-level keys are inspected; this applies to call options, never to
/// message content.
pub fn redact_options(options: &Map<String, Value>) -> Map<String, Value> {
    options
        .iter()
        .map(|(key, value)| {
            let value = if is_credential_key(key) {
                Value::String(REDACTED.to_string())
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}
