//! Environment variable handling.

use crate::types::CallLogConfig;
use std::env;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    // Call logging
    pub const PROMPTLOG_LLM_CALL_LOGS: &str = "PROMPTLOG_LLM_CALL_LOGS";
    pub const PROMPTLOG_LLM_LOGS_DIRNAME: &str = "PROMPTLOG_LLM_LOGS_DIRNAME";

    // Profile selecting `.env.<profile>`
    pub const PROMPTLOG_ENV: &str = "PROMPTLOG_ENV";
}

/// Environment configuration.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Initialize environment from .env files.
    ///
    /// Missing files are skipped. Variables already set in the process win.
    pub fn init() -> Result<Self, EnvError> {
        load_optional(".env")?;
        load_optional(".env.local")?;

        if let Ok(profile) = env::var(vars::PROMPTLOG_ENV) {
            load_optional(&format!(".env.{}", profile))?;
        }

        Ok(Self { _guard: () })
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Get a boolean variable.
    ///
    /// Accepts `true/1/yes/on` and `false/0/no/off`, case-insensitively.
    pub fn get_bool(var: &str) -> Result<Option<bool>, EnvError> {
        match env::var(var) {
            Ok(v) => parse_bool(&v).map(Some).ok_or_else(|| EnvError::InvalidValue {
                var: var.to_string(),
                message: format!("expected boolean, got {v:?}"),
            }),
            Err(_) => Ok(None),
        }
    }
}

fn load_optional(path: &str) -> Result<(), EnvError> {
    match dotenvy::from_filename(path) {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl CallLogConfig {
    /// Apply `PROMPTLOG_LLM_CALL_LOGS` and `PROMPTLOG_LLM_LOGS_DIRNAME` on top of `self`.
    pub fn overlay_env(mut self) -> Result<Self, EnvError> {
        if let Some(enabled) = Environment::get_bool(vars::PROMPTLOG_LLM_CALL_LOGS)? {
            self.enabled = enabled;
        }
        if let Some(dirname) = Environment::get(vars::PROMPTLOG_LLM_LOGS_DIRNAME) {
            let dirname = dirname.trim();
            if !dirname.is_empty() {
                self.dirname = dirname.to_string();
            }
        }
        Ok(self)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, EnvError> {
        Self::default().overlay_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_parsing() {
        env::set_var("PROMPTLOG_TEST_BOOL", "true");
        assert_eq!(Environment::get_bool("PROMPTLOG_TEST_BOOL").unwrap(), Some(true));
        env::set_var("PROMPTLOG_TEST_BOOL", "1");
        assert_eq!(Environment::get_bool("PROMPTLOG_TEST_BOOL").unwrap(), Some(true));
        env::set_var("PROMPTLOG_TEST_BOOL", "Off");
        assert_eq!(Environment::get_bool("PROMPTLOG_TEST_BOOL").unwrap(), Some(false));
        env::set_var("PROMPTLOG_TEST_BOOL", "maybe");
        assert!(Environment::get_bool("PROMPTLOG_TEST_BOOL").is_err());
        env::remove_var("PROMPTLOG_TEST_BOOL");
        assert_eq!(Environment::get_bool("PROMPTLOG_TEST_BOOL").unwrap(), None);
    }

    // Both call-log variables are touched only by this test.
    #[test]
    fn test_call_log_env_overlay() {
        env::remove_var(vars::PROMPTLOG_LLM_CALL_LOGS);
        env::remove_var(vars::PROMPTLOG_LLM_LOGS_DIRNAME);
        assert_eq!(CallLogConfig::from_env().unwrap(), CallLogConfig::default());

        env::set_var(vars::PROMPTLOG_LLM_CALL_LOGS, "yes");
        env::set_var(vars::PROMPTLOG_LLM_LOGS_DIRNAME, "calls");
        let config = CallLogConfig::from_env().unwrap();
        assert!(config.enabled);
        assert_eq!(config.dirname, "calls");

        env::set_var(vars::PROMPTLOG_LLM_LOGS_DIRNAME, "   ");
        let config = CallLogConfig::from_env().unwrap();
        assert_eq!(config.dirname, "llm_logs");

        env::set_var(vars::PROMPTLOG_LLM_CALL_LOGS, "sometimes");
        assert!(matches!(
            CallLogConfig::from_env(),
            Err(EnvError::InvalidValue { .. })
        ));

        env::remove_var(vars::PROMPTLOG_LLM_CALL_LOGS);
        env::remove_var(vars::PROMPTLOG_LLM_LOGS_DIRNAME);
    }
}
