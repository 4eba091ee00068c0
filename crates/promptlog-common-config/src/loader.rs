//! Configuration file loading and parsing.

use crate::env::EnvError;
use crate::types::{CallLogConfig, PromptlogConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory holding the config file, relative to the project root.
pub const CONFIG_DIR: &str = ".promptlog";
/// Config file name.
pub const CONFIG_FILE: &str = "config.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("invalid expansion pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file this loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from `.promptlog/config.yaml`.
    ///
    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<PromptlogConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(PromptlogConfig::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let expanded = self.expand_env_vars(&contents)?;

        // An empty or comment-only file deserializes as null.
        if expanded.trim().is_empty() {
            return Ok(PromptlogConfig::default());
        }

        let config: PromptlogConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        self.validate(&config)?;
        Ok(config)
    }

    /// Call-log settings: file values overlaid with the environment.
    pub fn load_call_logs(&self) -> Result<CallLogConfig, ConfigError> {
        let config = self.load()?.call_logs.overlay_env()?;
        validate_dirname(&config.dirname)?;
        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let re = regex::Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}")?;
        let mut result = String::with_capacity(content.len());
        let mut last = 0;

        for cap in re.captures_iter(content) {
            let Some(full_match) = cap.get(0) else {
                continue;
            };
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result.push_str(&content[last..full_match.start()]);
            result.push_str(&value);
            last = full_match.end();
        }

        result.push_str(&content[last..]);
        Ok(result)
    }

    /// Validate configuration values.
    fn validate(&self, config: &PromptlogConfig) -> Result<(), ConfigError> {
        validate_dirname(&config.call_logs.dirname)
    }

    /// Save configuration to file.
    pub fn save(&self, config: &PromptlogConfig) -> Result<(), ConfigError> {
        self.validate(config)?;
        let config_dir = self.base_path.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(config_dir.join(CONFIG_FILE), yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

// The dirname is joined onto a session root, so it must stay a single component.
fn validate_dirname(dirname: &str) -> Result<(), ConfigError> {
    if dirname.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            message: "call_logs.dirname must not be empty".to_string(),
        });
    }
    if dirname.contains(['/', '\\']) || dirname == "." || dirname == ".." {
        return Err(ConfigError::ValidationError {
            message: format!("call_logs.dirname must be a single directory name, got {dirname:?}"),
        });
    }
    Ok(())
}
