//! Configuration types.

use serde::{Deserialize, Serialize};

/// Default name of the per-session call log directory.
pub const DEFAULT_LOGS_DIRNAME: &str = "llm_logs";

/// Root configuration from `.promptlog/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptlogConfig {
    /// LLM call logging.
    pub call_logs: CallLogConfig,
}

/// Controls whether chat model calls are recorded, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallLogConfig {
    /// Record every call as an artifact.
    pub enabled: bool,
    /// Directory name joined onto the session root.
    pub dirname: String,
}

impl Default for CallLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dirname: DEFAULT_LOGS_DIRNAME.to_string(),
        }
    }
}

impl CallLogConfig {
    /// Enabled config with the default dirname.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Set the directory name.
    pub fn with_dirname(mut self, dirname: impl Into<String>) -> Self {
        self.dirname = dirname.into();
        self
    }
}
