//! Configuration for promptlog.
//!
//! Call logging is configured from, in increasing precedence:
//! defaults, `.promptlog/config.yaml`, `.env` files, and the process environment
//! (`PROMPTLOG_LLM_CALL_LOGS`, `PROMPTLOG_LLM_LOGS_DIRNAME`).

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;
