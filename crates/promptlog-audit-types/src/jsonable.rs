//! Outcome of best-effort JSON conversion.

use serde_json::Value;

/// A value converted for logging.
///
/// Conversion never fails: anything that cannot be represented as JSON is
/// kept as its textual representation instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Jsonable {
    /// Structured conversion succeeded.
    Serialized(Value),
    /// Structured conversion failed; the value's string form.
    Fallback(String),
}

impl Jsonable {
    /// Whether structured conversion succeeded.
    pub fn is_serialized(&self) -> bool {
        matches!(self, Self::Serialized(_))
    }

    /// Collapse into a JSON value; fallbacks become JSON strings.
    pub fn into_value(self) -> Value {
        match self {
            Self::Serialized(value) => value,
            Self::Fallback(text) => Value::String(text),
        }
    }
}

impl From<Value> for Jsonable {
    fn from(value: Value) -> Self {
        Self::Serialized(value)
    }
}
