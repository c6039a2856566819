//! Usage limits and color bands, resolved per request.
//!
//! Limits come from the threshold tables when present. A missing, zero or
//! unparsable value falls back to the configured default for that limit.

use serde::{Deserialize, Serialize};

use sd_config::{ThresholdDefaults, UsageBands};

use crate::store::{R2ThresholdRow, ZoneThresholdRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Green,
    Yellow,
    Red,
}

impl UsageLevel {
    /// Red strictly above the red band, yellow from the yellow band up.
    pub fn classify(percent: f64, bands: &UsageBands) -> Self {
        if percent > bands.red_above {
            UsageLevel::Red
        } else if percent >= bands.yellow_at {
            UsageLevel::Yellow
        } else {
            UsageLevel::Green
        }
    }
}

/// `value` as a percentage of `limit`; zero when there is no usable limit.
pub fn percent_of(value: f64, limit: f64) -> f64 {
    if limit > 0.0 && limit.is_finite() && value.is_finite() {
        value / limit * 100.0
    } else {
        0.0
    }
}

fn or_default(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => default,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct R2Thresholds {
    pub payload_tb: f64,
    pub class_a_mm: f64,
    pub class_b_mm: f64,
}

impl R2Thresholds {
    pub fn defaults(defaults: &ThresholdDefaults) -> Self {
        Self {
            payload_tb: defaults.r2_payload_tb,
            class_a_mm: defaults.r2_class_a_mm,
            class_b_mm: defaults.r2_class_b_mm,
        }
    }

    pub fn resolve(row: Option<&R2ThresholdRow>, defaults: &ThresholdDefaults) -> Self {
        let base = Self::defaults(defaults);
        match row {
            Some(row) => Self {
                payload_tb: or_default(row.payload_size_tb, base.payload_tb),
                class_a_mm: or_default(row.class_a_requests, base.class_a_mm),
                class_b_mm: or_default(row.class_b_requests, base.class_b_mm),
            },
            None => base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionLimits {
    pub bandwidth_tb: f64,
    pub requests_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneThresholds {
    pub china: RegionLimits,
    pub com: RegionLimits,
    /// Limit for total requests across both regions.
    pub all_requests_m: f64,
}

impl ZoneThresholds {
    pub fn defaults(defaults: &ThresholdDefaults) -> Self {
        Self {
            china: RegionLimits {
                bandwidth_tb: defaults.zone_china_bandwidth_tb,
                requests_m: defaults.zone_requests_m,
            },
            com: RegionLimits {
                bandwidth_tb: defaults.zone_com_bandwidth_tb,
                requests_m: defaults.zone_requests_m,
            },
            all_requests_m: defaults.zone_requests_m,
        }
    }

    /// Later rows for the same region win. The unified request limit follows
    /// the China row's request limit.
    pub fn resolve(rows: &[ZoneThresholdRow], defaults: &ThresholdDefaults) -> Self {
        let mut out = Self::defaults(defaults);
        if rows.is_empty() {
            return out;
        }
        for row in rows {
            if row.is_china {
                out.china = RegionLimits {
                    bandwidth_tb: or_default(row.bandwidth_tb, defaults.zone_china_bandwidth_tb),
                    requests_m: or_default(row.requests_m, defaults.zone_requests_m),
                };
            } else {
                out.com = RegionLimits {
                    bandwidth_tb: or_default(row.bandwidth_tb, defaults.zone_com_bandwidth_tb),
                    requests_m: or_default(row.requests_m, defaults.zone_requests_m),
                };
            }
        }
        out.all_requests_m = out.china.requests_m;
        out
    }
}
