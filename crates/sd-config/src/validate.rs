//! Semantic validation of a parsed configuration.
//!
//! Collects every problem rather than stopping at the first, so a bad config
//! file can be fixed in one pass.

use std::net::SocketAddr;

use crate::config::DashboardConfig;

/// A single validation problem, addressed by dotted field path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Outcome of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a configuration.
pub fn validate(config: &DashboardConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if !sd_common::schema::is_compatible(&config.schema_version) {
        errors.push(ValidationError::new(
            "schema_version",
            format!(
                "unsupported version {} (expected {}.x)",
                config.schema_version,
                crate::CONFIG_SCHEMA_VERSION
                    .split('.')
                    .next()
                    .unwrap_or("1")
            ),
        ));
    }

    if config.database.pool_size == 0 {
        errors.push(ValidationError::new("database.pool_size", "must be at least 1"));
    }
    if config.database.path.as_os_str().is_empty() {
        errors.push(ValidationError::new("database.path", "must not be empty"));
    }

    if config.server.bind.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind",
            format!("'{}' is not a socket address", config.server.bind),
        ));
    }

    let t = &config.thresholds;
    let limits = [
        ("thresholds.r2_payload_tb", t.r2_payload_tb),
        ("thresholds.r2_class_a_mm", t.r2_class_a_mm),
        ("thresholds.r2_class_b_mm", t.r2_class_b_mm),
        ("thresholds.zone_china_bandwidth_tb", t.zone_china_bandwidth_tb),
        ("thresholds.zone_com_bandwidth_tb", t.zone_com_bandwidth_tb),
        ("thresholds.zone_requests_m", t.zone_requests_m),
    ];
    for (field, value) in limits {
        if !(value.is_finite() && value > 0.0) {
            errors.push(ValidationError::new(field, format!("must be positive, got {value}")));
        }
    }

    if t.bands.yellow_at >= t.bands.red_above {
        errors.push(ValidationError::new(
            "thresholds.bands",
            format!(
                "yellow_at ({}) must be below red_above ({})",
                t.bands.yellow_at, t.bands.red_above
            ),
        ));
    }
    if t.ssl_warning_days < 0 {
        errors.push(ValidationError::new("thresholds.ssl_warning_days", "must not be negative"));
    }

    ValidationResult { errors }
}
