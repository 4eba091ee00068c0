//! Error types for promptlog.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for promptlog operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A persisted artifact could not be understood.
    #[error("malformed artifact {}: {message}", path.display())]
    MalformedArtifact { path: PathBuf, message: String },
}

impl Error {
    /// Create a malformed artifact error.
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedArtifact {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using promptlog's Error.
pub type Result<T> = std::result::Result<T, Error>;
