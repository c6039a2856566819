//! Dashboard configuration types.
//!
//! Every field has a default so a partial file (or none at all) still yields
//! a complete configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use sd_common::MonthNameStyle;

/// Complete dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub schema_version: String,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub thresholds: ThresholdDefaults,
    pub families: FamilyConventions,
    pub logging: LoggingConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            thresholds: ThresholdDefaults::default(),
            families: FamilyConventions::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse a config from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Relational store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Bounded number of concurrently outstanding queries. One read
    /// connection is opened per HTTP worker, so this is also the worker count.
    pub pool_size: usize,
    /// How long a query waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sre_data.db"),
            pool_size: 10,
            busy_timeout_ms: 5_000,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Fallback limits used when threshold tables are empty or hold unusable
/// values, plus the color bands applied to usage percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdDefaults {
    pub r2_payload_tb: f64,
    pub r2_class_a_mm: f64,
    pub r2_class_b_mm: f64,
    pub zone_china_bandwidth_tb: f64,
    pub zone_com_bandwidth_tb: f64,
    pub zone_requests_m: f64,
    pub bands: UsageBands,
    /// Certificates expiring in fewer days than this count as failing.
    pub ssl_warning_days: i64,
}

impl Default for ThresholdDefaults {
    fn default() -> Self {
        Self {
            r2_payload_tb: 80.0,
            r2_class_a_mm: 550.0,
            r2_class_b_mm: 600.0,
            zone_china_bandwidth_tb: 5.0,
            zone_com_bandwidth_tb: 120.0,
            zone_requests_m: 1200.0,
            bands: UsageBands::default(),
            ssl_warning_days: 30,
        }
    }
}

/// Percent-of-limit bands: yellow from `yellow_at` (inclusive), red above
/// `red_above`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageBands {
    pub yellow_at: f64,
    pub red_above: f64,
}

impl Default for UsageBands {
    fn default() -> Self {
        Self {
            yellow_at: 75.0,
            red_above: 80.0,
        }
    }
}

/// Month-name spelling each metric family's upstream table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyConventions {
    pub aws_cost: MonthNameStyle,
    pub cloudflare_r2: MonthNameStyle,
    pub cloudflare_zones: MonthNameStyle,
    pub s3_buckets: MonthNameStyle,
}

impl Default for FamilyConventions {
    fn default() -> Self {
        Self {
            aws_cost: MonthNameStyle::Full,
            cloudflare_r2: MonthNameStyle::Full,
            cloudflare_zones: MonthNameStyle::Abbreviated,
            s3_buckets: MonthNameStyle::Abbreviated,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Human,
            level: "info".to_string(),
        }
    }
}
