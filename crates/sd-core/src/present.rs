//! Presentation adapter: forecast bundles plus live actuals as chart series.
//!
//! Each series renders as its elapsed months (historical line), the current
//! month's live actual, and three forecast markers anchored at a synthetic
//! month-end point such as `"Oct 31"`. Values are passed through as computed;
//! this layer only labels and formats them.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use sd_common::{CalendarMonth, MonthNameStyle};

use crate::aggregate::ForecastBundle;
use crate::forecast::{FamilyActuals, ForecastReport, R2_PAYLOAD, ZONE_ALL_REQUESTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Historical,
    CurrentActual,
    ForecastHigh,
    ForecastMean,
    ForecastLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Usd,
    Terabytes,
    /// Millions of requests.
    Millions,
    /// Millions of storage operations.
    MillionOps,
}

impl Unit {
    pub fn format(self, value: f64) -> String {
        match self {
            Unit::Usd => format!("${value:.2}"),
            Unit::Terabytes => format!("{value:.2} TB"),
            Unit::Millions => format!("{value:.2} M"),
            Unit::MillionOps => format!("{value:.2} MM"),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::Usd => "USD",
            Unit::Terabytes => "TB",
            Unit::Millions => "M",
            Unit::MillionOps => "MM",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub kind: PointKind,
    pub value: Option<f64>,
    /// Formatted value, `"-"` when absent.
    pub display: String,
}

impl ChartPoint {
    fn new(label: impl Into<String>, kind: PointKind, value: Option<f64>, unit: Unit) -> Self {
        Self {
            label: label.into(),
            kind,
            value,
            display: value.map_or_else(|| "-".to_string(), |v| unit.format(v)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesChart {
    pub key: String,
    pub unit: Unit,
    pub points: Vec<ChartPoint>,
}

impl SeriesChart {
    pub fn points_of(&self, kind: PointKind) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter().filter(move |p| p.kind == kind)
    }
}

/// `"Oct 31"` for October.
pub fn month_end_label(month: CalendarMonth) -> String {
    format!("{} {}", month.name(MonthNameStyle::Abbreviated), month.last_day())
}

/// `"Oct 2026"`.
fn short_label(month: CalendarMonth) -> String {
    format!("{} {}", month.name(MonthNameStyle::Abbreviated), month.year)
}

/// Render one series of `bundle`. Returns `None` for an unknown key.
pub fn chart_series<H>(
    bundle: &ForecastBundle<H>,
    key: &str,
    actual: Option<f64>,
    unit: Unit,
    current: CalendarMonth,
) -> Option<SeriesChart> {
    let forecast = bundle.get(key)?;
    let series = bundle.series_of(key)?;

    let mut points: Vec<ChartPoint> = series
        .elapsed()
        .iter()
        .map(|slot| ChartPoint::new(short_label(slot.period()), PointKind::Historical, slot.value, unit))
        .collect();

    points.push(ChartPoint::new(short_label(current), PointKind::CurrentActual, actual, unit));

    let end = month_end_label(current);
    points.push(ChartPoint::new(end.clone(), PointKind::ForecastHigh, Some(forecast.high), unit));
    points.push(ChartPoint::new(end.clone(), PointKind::ForecastMean, Some(forecast.mean), unit));
    points.push(ChartPoint::new(end, PointKind::ForecastLow, Some(forecast.low), unit));

    Some(SeriesChart {
        key: key.to_string(),
        unit,
        points,
    })
}

/// Render every series of `bundle`, each paired with its live actual.
pub fn render_bundle<H>(
    bundle: &ForecastBundle<H>,
    actuals: &BTreeMap<String, Option<f64>>,
    unit_for: impl Fn(&str) -> Unit,
    current: CalendarMonth,
) -> Vec<SeriesChart> {
    bundle
        .keys()
        .filter_map(|key| {
            let actual = actuals.get(key).copied().flatten();
            chart_series(bundle, key, actual, unit_for(key), current)
        })
        .collect()
}

fn r2_unit(key: &str) -> Unit {
    if key == R2_PAYLOAD {
        Unit::Terabytes
    } else {
        Unit::MillionOps
    }
}

fn zone_unit(key: &str) -> Unit {
    if key == ZONE_ALL_REQUESTS {
        Unit::Millions
    } else {
        Unit::Terabytes
    }
}

/// Chart payload for the whole forecast report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartsPayload {
    pub aws_cost: Vec<SeriesChart>,
    pub cloudflare_r2: Vec<SeriesChart>,
    pub cloudflare_zones: Vec<SeriesChart>,
    pub month_end: String,
    pub current_month: &'static str,
    pub current_year: i32,
}

pub fn render_report(report: &ForecastReport, actuals: &FamilyActuals) -> ChartsPayload {
    let current = report.current;
    ChartsPayload {
        aws_cost: render_bundle(&report.aws_cost, &actuals.aws_cost, |_| Unit::Usd, current),
        cloudflare_r2: render_bundle(&report.cloudflare_r2, &actuals.cloudflare_r2, r2_unit, current),
        cloudflare_zones: render_bundle(
            &report.cloudflare_zones,
            &actuals.cloudflare_zones,
            zone_unit,
            current,
        ),
        month_end: month_end_label(current),
        current_month: current.name(MonthNameStyle::Full),
        current_year: current.year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{normalize_series, window_ending, MonthData};

    fn bundle() -> (ForecastBundle<Option<f64>>, CalendarMonth) {
        let current = CalendarMonth::new(2026, 10).unwrap();
        let values = [Some(100.0), Some(110.0), None, Some(130.0), Some(132.0)];
        let history: Vec<MonthData<Option<f64>>> = window_ending(current, values.len())
            .into_iter()
            .zip(values)
            .map(|(month, value)| MonthData::new(month, value))
            .collect();
        let series = normalize_series("X", &history, |v: &Option<f64>| *v);
        let mut b = ForecastBundle::new(history);
        b.insert_series(series);
        (b, current)
    }

    #[test]
    fn series_has_history_actual_and_three_markers() {
        let (b, current) = bundle();
        let chart = chart_series(&b, "X", Some(132.0), Unit::Usd, current).unwrap();
        assert_eq!(chart.points.len(), 4 + 1 + 3);
        let hist: Vec<_> = chart.points_of(PointKind::Historical).map(|p| p.label.as_str()).collect();
        assert_eq!(hist, vec!["Jun 2026", "Jul 2026", "Aug 2026", "Sep 2026"]);
        assert_eq!(chart.points[2].display, "-");
        let actual = chart.points_of(PointKind::CurrentActual).next().unwrap();
        assert_eq!(actual.label, "Oct 2026");
        assert_eq!(actual.display, "$132.00");
        let mean = chart.points_of(PointKind::ForecastMean).next().unwrap();
        assert_eq!(mean.label, "Oct 31");
        assert_eq!(mean.value, Some(b.get("X").unwrap().mean));
    }

    #[test]
    fn unknown_key_renders_nothing() {
        let (b, current) = bundle();
        assert!(chart_series(&b, "missing", None, Unit::Usd, current).is_none());
    }

    #[test]
    fn month_end_for_february() {
        assert_eq!(month_end_label(CalendarMonth::new(2028, 2).unwrap()), "Feb 29");
        assert_eq!(month_end_label(CalendarMonth::new(2026, 2).unwrap()), "Feb 28");
    }

    #[test]
    fn unit_formatting() {
        assert_eq!(Unit::Terabytes.format(61.234), "61.23 TB");
        assert_eq!(Unit::Millions.format(1200.0), "1200.00 M");
        assert_eq!(Unit::MillionOps.format(3.5), "3.50 MM");
    }

    #[test]
    fn missing_actual_is_blank() {
        let (b, current) = bundle();
        let charts = render_bundle(&b, &BTreeMap::new(), |_| Unit::Terabytes, current);
        let actual = charts[0].points_of(PointKind::CurrentActual).next().unwrap();
        assert_eq!(actual.value, None);
    }
}
