//! Month-end forecast report across the AWS cost, R2 and zone families.
//!
//! Each family is fetched month by month over the standard window with its
//! own month-name spelling, then reduced to series and estimated:
//! - AWS cost: one series per account (`current_cost`), accounts discovered
//!   across the whole window;
//! - R2: `payload_tb`, `class_a_requests`, `class_b_requests` from the
//!   month's first usage row;
//! - zones: `china_bandwidth`, `com_bandwidth`, `all_requests` as per-month
//!   sums over every zone row.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use tracing::info;

use sd_common::{CalendarMonth, MetricSeries, MonthNameStyle, SCHEMA_VERSION};
use sd_config::FamilyConventions;
use sd_math::ForecastResult;

use crate::aggregate::{forecast_by_entity, sum_field, sum_where, ForecastBundle};
use crate::store::{AwsCostRow, DashboardStore, FetchResult, R2UsageRow, ZoneUsageRow};
use crate::window::{collect_months, month_window, normalize_series, MonthData};

pub const R2_PAYLOAD: &str = "payload_tb";
pub const R2_CLASS_A: &str = "class_a_requests";
pub const R2_CLASS_B: &str = "class_b_requests";
pub const ZONE_CHINA_BANDWIDTH: &str = "china_bandwidth";
pub const ZONE_COM_BANDWIDTH: &str = "com_bandwidth";
pub const ZONE_ALL_REQUESTS: &str = "all_requests";

/// One month of zone rows reduced to the three forecast quantities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ZoneTotals {
    pub china_bandwidth: f64,
    pub com_bandwidth: f64,
    pub all_requests: f64,
}

impl ZoneTotals {
    /// Bandwidth splits on the China flag; every row that is not flagged
    /// counts as .com. Requests are summed over all rows.
    pub fn from_rows(rows: &[ZoneUsageRow]) -> Self {
        Self {
            china_bandwidth: sum_where(rows, |z| z.bandwidth_tb, |z| z.is_china),
            com_bandwidth: sum_where(rows, |z| z.bandwidth_tb, |z| !z.is_china),
            all_requests: sum_field(rows, |z| z.requests_m),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            ZONE_CHINA_BANDWIDTH => Some(self.china_bandwidth),
            ZONE_COM_BANDWIDTH => Some(self.com_bandwidth),
            ZONE_ALL_REQUESTS => Some(self.all_requests),
            _ => None,
        }
    }
}

/// Read one R2 sub-metric from a usage row.
pub fn r2_field(row: &R2UsageRow, key: &str) -> Option<f64> {
    match key {
        R2_PAYLOAD => row.payload_size_tb,
        R2_CLASS_A => row.class_a_requests_mm,
        R2_CLASS_B => row.class_b_requests_mm,
        _ => None,
    }
}

pub fn aws_cost_bundle(
    store: &DashboardStore,
    window: &[CalendarMonth],
    style: MonthNameStyle,
) -> FetchResult<ForecastBundle<Vec<AwsCostRow>>> {
    let history = collect_months(window, style, |year, month| store.aws_costs(year, month))?;
    Ok(forecast_by_entity(
        history,
        |row: &AwsCostRow| row.account_name.as_deref(),
        |row: &AwsCostRow| row.current_cost,
    ))
}

pub fn r2_bundle(
    store: &DashboardStore,
    window: &[CalendarMonth],
    style: MonthNameStyle,
) -> FetchResult<ForecastBundle<Option<R2UsageRow>>> {
    let history = collect_months(window, style, |year, month| {
        store.r2_usage(year, month).map(|rows| rows.into_iter().next())
    })?;
    let series: Vec<MetricSeries> = [R2_PAYLOAD, R2_CLASS_A, R2_CLASS_B]
        .into_iter()
        .map(|key| {
            normalize_series(key, &history, |row: &Option<R2UsageRow>| {
                row.as_ref().and_then(|r| r2_field(r, key))
            })
        })
        .collect();
    let mut bundle = ForecastBundle::new(history);
    for s in series {
        bundle.insert_series(s);
    }
    Ok(bundle)
}

pub fn zone_bundle(
    store: &DashboardStore,
    window: &[CalendarMonth],
    style: MonthNameStyle,
) -> FetchResult<ForecastBundle<Vec<ZoneUsageRow>>> {
    let history = collect_months(window, style, |year, month| store.zone_usage(year, month))?;
    let series: Vec<MetricSeries> = [ZONE_CHINA_BANDWIDTH, ZONE_COM_BANDWIDTH, ZONE_ALL_REQUESTS]
        .into_iter()
        .map(|key| {
            normalize_series(key, &history, |rows: &Vec<ZoneUsageRow>| {
                ZoneTotals::from_rows(rows).get(key)
            })
        })
        .collect();
    let mut bundle = ForecastBundle::new(history);
    for s in series {
        bundle.insert_series(s);
    }
    Ok(bundle)
}

/// Forecasts for every family, anchored at the current month.
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub aws_cost: ForecastBundle<Vec<AwsCostRow>>,
    pub cloudflare_r2: ForecastBundle<Option<R2UsageRow>>,
    pub cloudflare_zones: ForecastBundle<Vec<ZoneUsageRow>>,
    pub current: CalendarMonth,
}

impl ForecastReport {
    pub fn build(
        store: &DashboardStore,
        today: NaiveDate,
        families: &FamilyConventions,
    ) -> FetchResult<Self> {
        let window = month_window(today);
        let report = Self {
            aws_cost: aws_cost_bundle(store, &window, families.aws_cost)?,
            cloudflare_r2: r2_bundle(store, &window, families.cloudflare_r2)?,
            cloudflare_zones: zone_bundle(store, &window, families.cloudflare_zones)?,
            current: CalendarMonth::containing(today),
        };
        info!(
            month = %report.current,
            accounts = report.aws_cost.forecast.len(),
            "forecast report built"
        );
        Ok(report)
    }

    /// Day number of the month end the forecast projects to.
    pub fn forecast_date(&self) -> u32 {
        self.current.last_day()
    }

    /// The current-month value of every series, keyed per family.
    pub fn current_actuals(&self) -> FamilyActuals {
        FamilyActuals {
            aws_cost: current_slot(&self.aws_cost.series),
            cloudflare_r2: current_slot(&self.cloudflare_r2.series),
            cloudflare_zones: current_slot(&self.cloudflare_zones.series),
        }
    }
}

fn current_slot(series: &BTreeMap<String, MetricSeries>) -> BTreeMap<String, Option<f64>> {
    series
        .iter()
        .map(|(key, s)| (key.clone(), s.current().and_then(|slot| slot.value)))
        .collect()
}

/// Live current-month values per series key, per family.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FamilyActuals {
    pub aws_cost: BTreeMap<String, Option<f64>>,
    pub cloudflare_r2: BTreeMap<String, Option<f64>>,
    pub cloudflare_zones: BTreeMap<String, Option<f64>>,
}

#[derive(Serialize)]
struct Families<A, R, Z> {
    aws_cost: A,
    cloudflare_r2: R,
    cloudflare_zones: Z,
}

#[derive(Serialize)]
struct ReportWire<'a> {
    historical: Families<
        &'a [MonthData<Vec<AwsCostRow>>],
        &'a [MonthData<Option<R2UsageRow>>],
        &'a [MonthData<Vec<ZoneUsageRow>>],
    >,
    forecast: Families<
        &'a BTreeMap<String, ForecastResult>,
        &'a BTreeMap<String, ForecastResult>,
        &'a BTreeMap<String, ForecastResult>,
    >,
    series: Families<
        &'a BTreeMap<String, MetricSeries>,
        &'a BTreeMap<String, MetricSeries>,
        &'a BTreeMap<String, MetricSeries>,
    >,
    forecast_month: &'static str,
    forecast_date: u32,
    current_month: &'static str,
    current_year: i32,
    schema_version: &'static str,
}

impl Serialize for ForecastReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let month = self.current.name(MonthNameStyle::Full);
        ReportWire {
            historical: Families {
                aws_cost: &self.aws_cost.historical,
                cloudflare_r2: &self.cloudflare_r2.historical,
                cloudflare_zones: &self.cloudflare_zones.historical,
            },
            forecast: Families {
                aws_cost: &self.aws_cost.forecast,
                cloudflare_r2: &self.cloudflare_r2.forecast,
                cloudflare_zones: &self.cloudflare_zones.forecast,
            },
            series: Families {
                aws_cost: &self.aws_cost.series,
                cloudflare_r2: &self.cloudflare_r2.series,
                cloudflare_zones: &self.cloudflare_zones.series,
            },
            forecast_month: month,
            forecast_date: self.forecast_date(),
            current_month: month,
            current_year: self.current.year,
            schema_version: SCHEMA_VERSION,
        }
        .serialize(serializer)
    }
}
