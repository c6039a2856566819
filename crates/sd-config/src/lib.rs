//! Status dashboard configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the dashboard config file
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots for startup logs and health reporting

pub mod config;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use config::{
    DashboardConfig, DatabaseConfig, FamilyConventions, LogFormat, LoggingConfig, ServerConfig,
    ThresholdDefaults, UsageBands,
};
pub use resolve::{resolve_config, ConfigOverrides, ConfigSource, ResolvedConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl From<ConfigError> for sd_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(_) => sd_common::Error::InvalidConfig(err.to_string()),
            other => sd_common::Error::Config(other.to_string()),
        }
    }
}
