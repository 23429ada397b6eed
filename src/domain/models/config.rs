//! Configuration model.
//!
//! Loaded hierarchically by `infrastructure::config::ConfigLoader`; every
//! field has a serde default so partial YAML files and env overrides merge
//! cleanly.

use serde::{Deserialize, Serialize};

/// Main configuration structure for Stageward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Root directory for persisted workflow state.
    #[serde(default = "default_state_root")]
    pub state_root: String,

    /// Quality gate policy.
    #[serde(default)]
    pub gate: GateConfig,

    /// Reprompt scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_state_root() -> String {
    ".stageward".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_root: default_state_root(),
            gate: GateConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Quality gate policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GateConfig {
    /// Failed attempts per stage before REVISE becomes ESCALATE.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Error count above which an invalid gate becomes STOP.
    #[serde(default = "default_stop_error_threshold")]
    pub stop_error_threshold: usize,

    /// Whether evidence records with a declared location must point at an
    /// existing file.
    #[serde(default = "default_enforce_evidence_files")]
    pub enforce_evidence_files: bool,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_stop_error_threshold() -> usize {
    10
}

const fn default_enforce_evidence_files() -> bool {
    true
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            stop_error_threshold: default_stop_error_threshold(),
            enforce_evidence_files: default_enforce_evidence_files(),
        }
    }
}

/// Reprompt scheduler knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Seconds between background gate checks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Bound on joining the background task during `stop()`.
    #[serde(default = "default_join_timeout_secs")]
    pub join_timeout_secs: u64,
}

const fn default_interval_secs() -> u64 {
    300
}

const fn default_join_timeout_secs() -> u64 {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            join_timeout_secs: default_join_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json, pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Mirror logs into `<workflow dir>/logs/` as JSON.
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            to_file: false,
        }
    }
}
