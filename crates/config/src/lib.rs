//! Configuration management for the loan desk
//!
//! Supports loading configuration from:
//! - YAML/TOML files (config/default, config/{env})
//! - Environment variables (LOAN_DESK__ prefix)
//!
//! Reference data lives next to the settings:
//! - config/tables/*.json - region tiers, LTV and interest-rate tables
//! - feed templates (embedded, optionally overridden by a YAML file)

pub mod constants;
pub mod feed_templates;
pub mod settings;
pub mod tables;

pub use feed_templates::{FeedTemplatesConfig, FeedTemplatesConfigError};
pub use settings::{
    load_settings, FeedsConfig, ObservabilityConfig, RatesConfig, RuntimeEnvironment,
    ServerConfig, Settings, TablesConfig,
};
pub use tables::{parse_rate_tables, validate_rate_tables, TableSources};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
