//! Manages the `/etc/qosmate_flows.toml` configuration file used by the
//! flow monitor.

mod display;
mod source;
mod top_config;

pub use display::{DisplayConfig, SORT_COLUMN_NAMES};
pub use source::{SourceConfig, SourceKind};
pub use top_config::{load_config, load_config_from, Config, ConfigError, CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};
