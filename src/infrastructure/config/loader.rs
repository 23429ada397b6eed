use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("State root cannot be empty")]
    EmptyStateRoot,

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error("Invalid stop_error_threshold: {0}. Cannot be 0")]
    InvalidStopThreshold(usize),

    #[error("Invalid scheduler interval: {0}s. Must be positive")]
    InvalidInterval(u64),

    #[error("Invalid join timeout: {0}s. Must be positive")]
    InvalidJoinTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .stageward/config.yaml (project config)
    /// 3. .stageward/local.yaml (project local overrides, optional)
    /// 4. Environment variables (STAGEWARD_* prefix, highest priority)
    ///
    /// Configuration is always project-local so multiple workflows on one
    /// machine stay independent.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".stageward/config.yaml"))
            .merge(Yaml::file(".stageward/local.yaml"))
            .merge(Env::prefixed("STAGEWARD_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("STAGEWARD_").split("__"))
            .extract()
            .context(format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.state_root.is_empty() {
            return Err(ConfigError::EmptyStateRoot);
        }

        if config.gate.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.gate.max_retries));
        }

        if config.gate.stop_error_threshold == 0 {
            return Err(ConfigError::InvalidStopThreshold(config.gate.stop_error_threshold));
        }

        if config.scheduler.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval(config.scheduler.interval_secs));
        }

        if config.scheduler.join_timeout_secs == 0 {
            return Err(ConfigError::InvalidJoinTimeout(config.scheduler.join_timeout_secs));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
