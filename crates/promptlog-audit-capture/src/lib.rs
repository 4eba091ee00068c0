//! Request/response audit logging for promptlog chat models.
//!
//! [`AuditingInterceptor`] wraps any [`ChatModel`] and records every call as
//! a Markdown artifact:
//!
//! - request fingerprinting over sanitized, key-sorted JSON
//! - image payload stripping and credential redaction
//! - best-effort conversion that never fails the call
//! - collision-free, chronologically sortable artifact names
//!
//! ```no_run
//! use promptlog_audit_capture::{AuditingInterceptor, FixedLogDir};
//! # use promptlog_backends_core::ChatModel;
//! # fn wrap<M: ChatModel>(model: M) -> AuditingInterceptor<M> {
//! AuditingInterceptor::new(model, FixedLogDir::new("./llm_logs"))
//! # }
//! ```

mod artifact;
mod convert;
mod dir;
mod error;
mod fingerprint;
mod interceptor;
mod maybe;
mod sanitize;

pub use artifact::{artifact_base_name, filename_safe_model, persist, render, ArtifactReader, ARTIFACT_EXTENSION};
pub use convert::{bound_depth, to_jsonable, MAX_DEPTH};
pub use dir::{FixedLogDir, LogDirProvider, SessionLogDir};
pub use error::CaptureError;
pub use fingerprint::{canonicalize, fingerprint_request, serialize_messages};
pub use interceptor::{AuditingInterceptor, PersistFailureHook};
pub use maybe::MaybeAudited;
pub use sanitize::{is_credential_key, redact_options, strip_image_payloads, IMAGE_PAYLOAD_KEY, REDACTED};

// Re-export types for convenience
pub use promptlog_audit_types::{Fingerprint, Jsonable, LogRecord, Outcome, RequestSection, ResponseSection};
pub use promptlog_backends_core::ChatModel;
