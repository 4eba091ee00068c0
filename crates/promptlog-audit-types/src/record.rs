//! Core audit record type.

use crate::Fingerprint;
use promptlog_common_core::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sanitized view of the request side of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSection {
    /// Model identifier the call was made against.
    pub model: String,
    /// Messages with image payloads stripped.
    pub messages: Value,
    /// Call options with credentials redacted.
    pub kwargs: Map<String, Value>,
    /// When the call started.
    pub timestamp: Timestamp,
}

/// Sanitized view of the response side of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSection {
    /// When the call finished.
    pub timestamp: Timestamp,
    /// Wall-clock duration of a successful call, when it could be computed.
    pub duration_ms: Option<u64>,
    /// Converted usage statistics.
    pub usage: Option<Value>,
    /// Converted completion content.
    pub content: Option<Value>,
    /// Error description for failed calls.
    pub error: Option<String>,
}

/// Outcome of a recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The wrapped client returned a result.
    Success,
    /// The wrapped client returned an error.
    Failure { reason: String },
}

impl Outcome {
    /// Check if the outcome is successful.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if the outcome is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl ResponseSection {
    /// Derive the outcome from the error field.
    pub fn outcome(&self) -> Outcome {
        match &self.error {
            None => Outcome::Success,
            Some(reason) => Outcome::Failure {
                reason: reason.clone(),
            },
        }
    }
}

/// One recorded request/response exchange.
///
/// Records are built once when a call completes and are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Content hash of the request.
    pub fingerprint: Fingerprint,
    /// Model identifier.
    pub model: String,
    /// Sanitized request.
    pub request: RequestSection,
    /// Sanitized response.
    pub response: ResponseSection,
}

impl LogRecord {
    /// Create a new record builder.
    pub fn builder(fingerprint: Fingerprint, model: impl Into<String>) -> LogRecordBuilder {
        LogRecordBuilder::new(fingerprint, model)
    }

    /// When the call started.
    pub fn started_at(&self) -> Timestamp {
        self.request.timestamp
    }

    /// When the call finished.
    pub fn ended_at(&self) -> Timestamp {
        self.response.timestamp
    }

    /// Outcome of the call.
    pub fn outcome(&self) -> Outcome {
        self.response.outcome()
    }
}

/// Builder for constructing log records.
#[derive(Debug)]
pub struct LogRecordBuilder {
    fingerprint: Fingerprint,
    model: String,
    messages: Value,
    kwargs: Map<String, Value>,
    started_at: Option<Timestamp>,
    ended_at: Option<Timestamp>,
    usage: Option<Value>,
    content: Option<Value>,
    error: Option<String>,
}

impl LogRecordBuilder {
    /// Create a new builder.
    pub fn new(fingerprint: Fingerprint, model: impl Into<String>) -> Self {
        Self {
            fingerprint,
            model: model.into(),
            messages: Value::Array(Vec::new()),
            kwargs: Map::new(),
            started_at: None,
            ended_at: None,
            usage: None,
            content: None,
            error: None,
        }
    }

    /// Set the sanitized messages.
    pub fn messages(mut self, messages: Value) -> Self {
        self.messages = messages;
        self
    }

    /// Set the redacted call options.
    pub fn kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Set the start time.
    pub fn started_at(mut self, ts: Timestamp) -> Self {
        self.started_at = Some(ts);
        self
    }

    /// Set the end time.
    pub fn ended_at(mut self, ts: Timestamp) -> Self {
        self.ended_at = Some(ts);
        self
    }

    /// Set converted usage statistics.
    pub fn usage(mut self, usage: Option<Value>) -> Self {
        self.usage = usage;
        self
    }

    /// Set converted completion content.
    pub fn content(mut self, content: Option<Value>) -> Self {
        self.content = content;
        self
    }

    /// Mark the call as failed. Clears content and usage.
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.content = None;
        self.usage = None;
        self
    }

    /// Build the record. Missing timestamps default to now.
    ///
    /// Failed calls carry no duration.
    pub fn build(self) -> LogRecord {
        let started_at = self.started_at.unwrap_or_else(Timestamp::now);
        let ended_at = self.ended_at.unwrap_or_else(Timestamp::now);
        let duration_ms = match self.error {
            None => ended_at.millis_since(&started_at),
            Some(_) => None,
        };
        LogRecord {
            fingerprint: self.fingerprint,
            request: RequestSection {
                model: self.model.clone(),
                messages: self.messages,
                kwargs: self.kwargs,
                timestamp: started_at,
            },
            response: ResponseSection {
                timestamp: ended_at,
                duration_ms,
                usage: self.usage,
                content: self.content,
                error: self.error,
            },
            model: self.model,
        }
    }
}
