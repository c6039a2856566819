//! Current-month usage snapshot with threshold-relative summaries.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use sd_common::{CalendarMonth, MonthNameStyle};
use sd_config::{DashboardConfig, UsageBands};

use crate::forecast::{
    r2_field, FamilyActuals, ZoneTotals, R2_CLASS_A, R2_CLASS_B, R2_PAYLOAD, ZONE_ALL_REQUESTS,
    ZONE_CHINA_BANDWIDTH, ZONE_COM_BANDWIDTH,
};
use crate::store::{
    AwsCostRow, DashboardStore, FetchResult, R2ThresholdRow, R2UsageRow, S3BucketRow,
    ZoneThresholdRow, ZoneUsageRow,
};
use crate::thresholds::{percent_of, R2Thresholds, UsageLevel, ZoneThresholds};

/// One threshold-colored figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageCard {
    pub value: f64,
    pub limit: f64,
    pub percent: f64,
    pub level: UsageLevel,
}

impl UsageCard {
    pub fn new(value: f64, limit: f64, bands: &UsageBands) -> Self {
        let percent = percent_of(value, limit);
        Self {
            value,
            limit,
            percent,
            level: UsageLevel::classify(percent, bands),
        }
    }
}

/// An AWS account's spend relative to its baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountUsage {
    pub account_name: Option<String>,
    pub current_cost: f64,
    pub baseline_cost: f64,
    pub percent: f64,
    pub level: UsageLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    /// Absent when the month has no R2 row.
    pub cloudflare_r2: Option<BTreeMap<String, UsageCard>>,
    /// Absent when the month has no zone rows.
    pub cloudflare_zones: Option<BTreeMap<String, UsageCard>>,
    pub aws_costs: Vec<AccountUsage>,
}

impl UsageSummary {
    pub fn compute(
        r2: Option<&R2UsageRow>,
        zones: &[ZoneUsageRow],
        aws: &[AwsCostRow],
        r2_limits: &R2Thresholds,
        zone_limits: &ZoneThresholds,
        bands: &UsageBands,
    ) -> Self {
        let cloudflare_r2 = r2.map(|row| {
            [
                (R2_PAYLOAD, r2_limits.payload_tb),
                (R2_CLASS_A, r2_limits.class_a_mm),
                (R2_CLASS_B, r2_limits.class_b_mm),
            ]
            .into_iter()
            .map(|(key, limit)| {
                let value = r2_field(row, key).unwrap_or(0.0);
                (key.to_string(), UsageCard::new(value, limit, bands))
            })
            .collect()
        });

        let cloudflare_zones = (!zones.is_empty()).then(|| {
            let totals = ZoneTotals::from_rows(zones);
            BTreeMap::from([
                (
                    ZONE_ALL_REQUESTS.to_string(),
                    UsageCard::new(totals.all_requests, zone_limits.all_requests_m, bands),
                ),
                (
                    ZONE_COM_BANDWIDTH.to_string(),
                    UsageCard::new(totals.com_bandwidth, zone_limits.com.bandwidth_tb, bands),
                ),
                (
                    ZONE_CHINA_BANDWIDTH.to_string(),
                    UsageCard::new(totals.china_bandwidth, zone_limits.china.bandwidth_tb, bands),
                ),
            ])
        });

        let aws_costs = aws
            .iter()
            .map(|row| {
                let current_cost = row.current_cost.unwrap_or(0.0);
                let baseline_cost = row.baseline_cost.unwrap_or(0.0);
                let percent = percent_of(current_cost, baseline_cost);
                AccountUsage {
                    account_name: row.account_name.clone(),
                    current_cost,
                    baseline_cost,
                    percent,
                    level: UsageLevel::classify(percent, bands),
                }
            })
            .collect();

        Self {
            cloudflare_r2,
            cloudflare_zones,
            aws_costs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectiveThresholds {
    pub cloudflare_r2: R2Thresholds,
    pub cloudflare_zones: ZoneThresholds,
}

/// Everything the usage panel shows for the current month.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub s3_buckets: Vec<S3BucketRow>,
    pub cloudflare_r2: Vec<R2UsageRow>,
    pub cloudflare_r2_thresholds: Option<R2ThresholdRow>,
    pub cloudflare_zones: Vec<ZoneUsageRow>,
    pub cloudflare_zone_thresholds: Vec<ZoneThresholdRow>,
    pub aws_costs: Vec<AwsCostRow>,
    pub current_month: &'static str,
    pub current_year: i32,
    pub thresholds: EffectiveThresholds,
    pub summary: UsageSummary,
    pub live_actuals: FamilyActuals,
}

fn by_cost_desc(a: &AwsCostRow, b: &AwsCostRow) -> Ordering {
    match (a.current_cost, b.current_cost) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl UsageSnapshot {
    pub fn fetch(store: &DashboardStore, today: NaiveDate, config: &DashboardConfig) -> FetchResult<Self> {
        let month = CalendarMonth::containing(today);
        let families = &config.families;
        let year = month.year;

        let s3_buckets = store.s3_usage(year, month.name(families.s3_buckets))?;
        let r2_threshold_row = store.r2_thresholds()?;
        let cloudflare_r2 = store.r2_usage(year, month.name(families.cloudflare_r2))?;
        let cloudflare_zones = store.zone_usage(year, month.name(families.cloudflare_zones))?;
        let zone_threshold_rows = store.zone_thresholds()?;
        let mut aws_costs = store.aws_costs(year, month.name(families.aws_cost))?;
        aws_costs.sort_by(by_cost_desc);

        let thresholds = EffectiveThresholds {
            cloudflare_r2: R2Thresholds::resolve(r2_threshold_row.as_ref(), &config.thresholds),
            cloudflare_zones: ZoneThresholds::resolve(&zone_threshold_rows, &config.thresholds),
        };
        let summary = UsageSummary::compute(
            cloudflare_r2.first(),
            &cloudflare_zones,
            &aws_costs,
            &thresholds.cloudflare_r2,
            &thresholds.cloudflare_zones,
            &config.thresholds.bands,
        );
        let live_actuals = live_actuals(cloudflare_r2.first(), &cloudflare_zones, &aws_costs);
        debug!(
            month = %month,
            s3 = s3_buckets.len(),
            zones = cloudflare_zones.len(),
            accounts = aws_costs.len(),
            "usage snapshot fetched"
        );

        Ok(Self {
            s3_buckets,
            cloudflare_r2,
            cloudflare_r2_thresholds: r2_threshold_row,
            cloudflare_zones,
            cloudflare_zone_thresholds: zone_threshold_rows,
            aws_costs,
            current_month: month.name(MonthNameStyle::Full),
            current_year: year,
            thresholds,
            summary,
            live_actuals,
        })
    }
}

/// Current-month values keyed the way forecast series are keyed.
pub fn live_actuals(r2: Option<&R2UsageRow>, zones: &[ZoneUsageRow], aws: &[AwsCostRow]) -> FamilyActuals {
    let totals = ZoneTotals::from_rows(zones);
    FamilyActuals {
        aws_cost: aws
            .iter()
            .filter_map(|row| Some((row.account_name.clone()?, row.current_cost)))
            .collect(),
        cloudflare_r2: [R2_PAYLOAD, R2_CLASS_A, R2_CLASS_B]
            .into_iter()
            .map(|key| (key.to_string(), r2.and_then(|row| r2_field(row, key))))
            .collect(),
        cloudflare_zones: [ZONE_CHINA_BANDWIDTH, ZONE_COM_BANDWIDTH, ZONE_ALL_REQUESTS]
            .into_iter()
            .map(|key| (key.to_string(), totals.get(key)))
            .collect(),
    }
}
