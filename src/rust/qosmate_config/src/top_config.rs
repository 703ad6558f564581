//! Top-level configuration file for the flow monitor.

use crate::{DisplayConfig, SourceConfig, SORT_COLUMN_NAMES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Where the configuration lives unless overridden.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/qosmate_flows.toml";

/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_ENV_VAR: &str = "QOSMATE_FLOWS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration file for the flow monitor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How often the flow table is polled
    pub poll_interval_ms: u64,

    /// Number of instantaneous rate samples kept per flow
    pub history_length: usize,

    /// Forget flows that have not been seen for this many seconds.
    /// Zero keeps them for the lifetime of the view.
    pub flow_timeout_seconds: u64,

    /// Optional log destination, used by the full-screen viewer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,

    /// Snapshot source
    pub source: SourceConfig,

    /// Initial filter and sort settings
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            history_length: 10,
            flow_timeout_seconds: 60,
            log_file: None,
            source: SourceConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Test if a configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than zero".to_string());
        }
        if self.history_length == 0 {
            return Err("history_length must be at least 1".to_string());
        }
        if self.source.fetch_timeout_ms == 0 {
            return Err("source.fetch_timeout_ms must be greater than zero".to_string());
        }
        if !SORT_COLUMN_NAMES.contains(&self.display.sort_column.as_str()) {
            return Err(format!(
                "Unknown sort column [{}], expected one of {}",
                self.display.sort_column,
                SORT_COLUMN_NAMES.join(", ")
            ));
        }
        Ok(())
    }

    /// Loads a config file from a string
    pub fn load_from_string(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.source.fetch_timeout_ms)
    }

    /// Idle expiry for flows, `None` when disabled.
    pub fn flow_timeout(&self) -> Option<Duration> {
        if self.flow_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.flow_timeout_seconds))
        }
    }
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads the configuration from `$QOSMATE_FLOWS_CONFIG` or the default
/// location. A missing file is not an error: the defaults are used.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Loads the configuration from an explicit path, falling back to the
/// defaults if the file does not exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        info!("No configuration at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    info!("Loading configuration from {}", path.display());
    let raw = std::fs::read_to_string(path)?;
    Config::load_from_string(&raw)
}
