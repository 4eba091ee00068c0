//! Best-effort conversion of arbitrary values to JSON.

use promptlog_audit_types::Jsonable;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Containers nested deeper than this are logged as strings.
pub const MAX_DEPTH: usize = 64;

/// Convert `value` for logging.
///
/// `Serialize` is tried first; if it fails the `Debug` representation is kept
/// instead. Never panics on conversion failure and never returns an error.
pub fn to_jsonable<T>(value: &T) -> Jsonable
where
    T: Serialize + fmt::Debug + ?Sized,
{
    match serde_json::to_value(value) {
        Ok(json) => Jsonable::Serialized(bound_depth(json, MAX_DEPTH)),
        Err(err) => {
            tracing::trace!(error = %err, "structured conversion failed, keeping debug form");
            Jsonable::Fallback(format!("{value:?}"))
        }
    }
}

/// Replace containers below `max_depth` with their compact JSON text.
pub fn bound_depth(value: Value, max_depth: usize) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) if max_depth == 0 => Value::String(value.to_string()),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| bound_depth(v, max_depth - 1))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, bound_depth(v, max_depth - 1)))
                .collect(),
        ),
        scalar => scalar,
    }
}
