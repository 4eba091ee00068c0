//! Audit record types for promptlog.

mod fingerprint;
mod jsonable;
mod record;

pub use fingerprint::{Fingerprint, FingerprintError};
pub use jsonable::Jsonable;
pub use record::{LogRecord, LogRecordBuilder, Outcome, RequestSection, ResponseSection};
pub use promptlog_common_core::Timestamp;
