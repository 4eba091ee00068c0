//! Span helpers for chat model calls.

use tracing::{info_span, Span};

/// Span covering one chat model call.
pub fn llm_call_span(model: &str, fingerprint: &str) -> Span {
    info_span!("llm_call", model = %model, fingerprint = %fingerprint)
}

/// Span covering one artifact write.
pub fn persist_span(dir: &str) -> Span {
    info_span!("persist", dir = %dir)
}
