//! Errors raised on the logging path.
//!
//! None of these ever reach the caller of a wrapped model; they are reported
//! through `tracing` and the optional failure hook.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while recording a call.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write artifact {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render artifact: {0}")]
    Render(#[from] serde_json::Error),

    #[error("no free artifact name for {base} after {attempts} attempts")]
    NameExhausted { base: String, attempts: u32 },
}
