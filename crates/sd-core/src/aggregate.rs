//! Metric aggregation: fan the estimator out across named series.
//!
//! Three shapes are supported:
//! - per-entity series discovered from the rows themselves ([`forecast_by_entity`]),
//! - fixed sub-metrics read from a single row per month ([`normalize_series`]
//!   with a field reader),
//! - per-month reductions (sums, optionally filtered) fed as one series
//!   ([`sum_field`], [`sum_where`]).
//!
//! Every series is a month-stamped [`MetricSeries`]; the estimator only sees
//! its slot values.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use sd_common::MetricSeries;
use sd_math::{estimate_detailed, ForecastResult};

use crate::window::{normalize_series, MonthData};

/// Forecasts for one metric family plus the history they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastBundle<H> {
    pub historical: Vec<MonthData<H>>,
    /// Input series per key, oldest→newest.
    pub series: BTreeMap<String, MetricSeries>,
    pub forecast: BTreeMap<String, ForecastResult>,
}

impl<H> ForecastBundle<H> {
    pub fn new(historical: Vec<MonthData<H>>) -> Self {
        Self {
            historical,
            series: BTreeMap::new(),
            forecast: BTreeMap::new(),
        }
    }

    /// Estimate `series` and record both the series and its forecast under
    /// its key.
    pub fn insert_series(&mut self, series: MetricSeries) -> ForecastResult {
        let key = series.series_key.clone();
        let detail = estimate_detailed(&series.values());
        debug!(
            series = %key,
            n = detail.n,
            mean = detail.mean,
            std_dev = detail.std_dev,
            growth_rate = detail.growth_rate,
            "estimated series"
        );
        self.series.insert(key.clone(), series);
        self.forecast.insert(key, detail.result);
        detail.result
    }

    pub fn get(&self, key: &str) -> Option<&ForecastResult> {
        self.forecast.get(key)
    }

    pub fn series_of(&self, key: &str) -> Option<&MetricSeries> {
        self.series.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.forecast.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.forecast.is_empty()
    }

    /// The newest month of history, i.e. the current partial month.
    pub fn current_month(&self) -> Option<&MonthData<H>> {
        self.historical.last()
    }
}

/// Union of entity keys seen in any month of the window, sorted.
pub fn discover_entities<R, K>(historical: &[MonthData<Vec<R>>], key: K) -> BTreeSet<String>
where
    K: Fn(&R) -> Option<&str>,
{
    historical
        .iter()
        .flat_map(|month| month.data.iter())
        .filter_map(|row| key(row))
        .map(str::to_string)
        .collect()
}

/// One entity's series: the first matching row per month, `None` where the
/// entity is absent or its value unusable.
pub fn entity_series<R, K, V>(
    historical: &[MonthData<Vec<R>>],
    entity: &str,
    key: K,
    value: V,
) -> MetricSeries
where
    K: Fn(&R) -> Option<&str>,
    V: Fn(&R) -> Option<f64>,
{
    normalize_series(entity, historical, |rows: &Vec<R>| {
        rows.iter()
            .find(|row| key(*row) == Some(entity))
            .and_then(|row| value(row))
    })
}

/// Discover entities across the window and forecast each one.
pub fn forecast_by_entity<R, K, V>(
    historical: Vec<MonthData<Vec<R>>>,
    key: K,
    value: V,
) -> ForecastBundle<Vec<R>>
where
    K: Fn(&R) -> Option<&str>,
    V: Fn(&R) -> Option<f64>,
{
    let entities = discover_entities(&historical, &key);
    let series: Vec<MetricSeries> = entities
        .iter()
        .map(|entity| entity_series(&historical, entity, &key, &value))
        .collect();

    let mut bundle = ForecastBundle::new(historical);
    for s in series {
        bundle.insert_series(s);
    }
    bundle
}

/// Sum of `value` over every row; missing values count as zero.
pub fn sum_field<R, V>(rows: &[R], value: V) -> f64
where
    V: Fn(&R) -> Option<f64>,
{
    sum_where(rows, value, |_| true)
}

/// Sum of `value` over the rows `keep` accepts; missing values count as zero.
pub fn sum_where<R, V, P>(rows: &[R], value: V, keep: P) -> f64
where
    V: Fn(&R) -> Option<f64>,
    P: Fn(&R) -> bool,
{
    rows.iter()
        .filter(|row| keep(*row))
        .map(|row| value(row).filter(|v| v.is_finite()).unwrap_or(0.0))
        .sum()
}
