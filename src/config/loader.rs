use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::RunnerConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl RunnerConfig {
    /// Per-application config file: `<config_dir>/<app_name>/cli.toml`.
    ///
    /// Falls back to the current directory if `dirs::config_dir()` is unavailable.
    pub fn config_path(app_name: &str) -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join(app_name).join("cli.toml")
    }

    /// Loads the per-application config file. See [`RunnerConfig::load`].
    pub fn discover(app_name: &str) -> Result<Self, ConfigError> {
        Self::load(Self::config_path(app_name))
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `RunnerConfig::default()`.
    /// - Otherwise parses it as TOML and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(RunnerConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: RunnerConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks:
    /// - The handler timeout is positive
    /// - A bug report URL is set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.handler_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "handler_timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.bug_report_url.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "bug_report_url must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
