//! Series normalization over a fixed window of calendar months.
//!
//! The window ends at the current (partial) month and reaches back
//! [`WINDOW_MONTHS`]` - 1` fully elapsed months, wrapping year boundaries.
//! Rows are fetched per month through a caller-supplied callback using the
//! month-name spelling of the metric family, and placed oldest→newest.
//! Missing or unparsable rows become empty slots; only callback failures
//! propagate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sd_common::{CalendarMonth, MetricObservation, MetricSeries, MonthNameStyle, WINDOW_MONTHS};

/// One month's fetched data, labelled the way the dashboard payload labels
/// months (full month name plus year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthData<T> {
    pub month: String,
    pub year: i32,
    pub data: T,
    #[serde(skip)]
    pub period: Option<CalendarMonth>,
}

impl<T> MonthData<T> {
    pub fn new(period: CalendarMonth, data: T) -> Self {
        Self {
            month: period.name(MonthNameStyle::Full).to_string(),
            year: period.year,
            data,
            period: Some(period),
        }
    }

    /// The calendar month, recovered from the label if the value was
    /// deserialized.
    pub fn calendar_month(&self) -> Option<CalendarMonth> {
        self.period.or_else(|| {
            MonthNameStyle::parse_any(&self.month).and_then(|m| CalendarMonth::new(self.year, m))
        })
    }
}

/// The `size` months ending at `current`, oldest first.
pub fn window_ending(current: CalendarMonth, size: usize) -> Vec<CalendarMonth> {
    (0..size as u32)
        .rev()
        .map(|back| current.months_before(back))
        .collect()
}

/// The standard forecasting window for `today`.
pub fn month_window(today: NaiveDate) -> Vec<CalendarMonth> {
    window_ending(CalendarMonth::containing(today), WINDOW_MONTHS)
}

/// Fetch every month of `window` with the family's month-name spelling.
///
/// The callback receives `(year, month name)`. The first error aborts the walk
/// and is returned unchanged.
pub fn collect_months<T, E, F>(
    window: &[CalendarMonth],
    style: MonthNameStyle,
    mut fetch: F,
) -> Result<Vec<MonthData<T>>, E>
where
    F: FnMut(i32, &str) -> Result<T, E>,
{
    window
        .iter()
        .map(|&period| fetch(period.year, period.name(style)).map(|data| MonthData::new(period, data)))
        .collect()
}

/// Reduce fetched months to the windowed series for one key.
///
/// `value` reads the key's number out of one month's data. Absent and
/// non-finite readings become empty slots; slot order follows `months`.
pub fn normalize_series<T, V>(series_key: &str, months: &[MonthData<T>], value: V) -> MetricSeries
where
    V: Fn(&T) -> Option<f64>,
{
    let slots = months
        .iter()
        .filter_map(|m| {
            let period = m.calendar_month()?;
            let reading = value(&m.data).filter(|v| v.is_finite());
            Some(MetricObservation::new(series_key, period, reading))
        })
        .collect();
    MetricSeries {
        series_key: series_key.to_string(),
        slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cm(y: i32, m: u32) -> CalendarMonth {
        CalendarMonth::new(y, m).unwrap()
    }

    #[test]
    fn january_window_wraps_into_previous_year() {
        assert_eq!(
            month_window(date(2026, 1, 15)),
            vec![cm(2025, 9), cm(2025, 10), cm(2025, 11), cm(2025, 12), cm(2026, 1)]
        );
    }

    #[test]
    fn mid_year_window_stays_in_year() {
        assert_eq!(
            month_window(date(2026, 10, 18)),
            vec![cm(2026, 6), cm(2026, 7), cm(2026, 8), cm(2026, 9), cm(2026, 10)]
        );
    }

    #[test]
    fn fetch_receives_family_spelling() {
        let mut seen = Vec::new();
        let _ = collect_months::<(), (), _>(&month_window(date(2026, 2, 1)), MonthNameStyle::Abbreviated, |y, m| {
            seen.push(format!("{m} {y}"));
            Ok(())
        });
        assert_eq!(seen, vec!["Oct 2025", "Nov 2025", "Dec 2025", "Jan 2026", "Feb 2026"]);
    }

    #[test]
    fn labels_always_use_full_names() {
        let months = collect_months::<u8, (), _>(&[cm(2026, 3)], MonthNameStyle::Abbreviated, |_, _| Ok(1))
            .unwrap();
        assert_eq!(months[0].month, "March");
        assert_eq!(months[0].year, 2026);
    }

    #[test]
    fn missing_months_become_null_slots() {
        let rows: HashMap<(i32, String), f64> = [
            ((2025, "November".to_string()), 10.0),
            ((2026, "January".to_string()), 12.0),
        ]
        .into_iter()
        .collect();
        let months = collect_months::<_, (), _>(&month_window(date(2026, 1, 3)), MonthNameStyle::Full, |y, m| {
            Ok(rows.get(&(y, m.to_string())).copied())
        })
        .unwrap();
        let series = normalize_series("acct", &months, |v: &Option<f64>| *v);
        assert_eq!(series.series_key, "acct");
        assert_eq!(series.values(), vec![None, None, Some(10.0), None, Some(12.0)]);
        assert_eq!(series.current().unwrap().period(), cm(2026, 1));
        assert_eq!(series.slots[0].period(), cm(2025, 9));
    }

    #[test]
    fn non_finite_values_become_null() {
        let months = collect_months::<_, (), _>(&month_window(date(2026, 5, 1)), MonthNameStyle::Full, |_, _| {
            Ok(Some(f64::NAN))
        })
        .unwrap();
        let series = normalize_series("k", &months, |v: &Option<f64>| *v);
        assert_eq!(series.slots.len(), WINDOW_MONTHS);
        assert!(series.values().iter().all(Option::is_none));
    }

    #[test]
    fn fetch_errors_propagate() {
        let mut calls = 0;
        let err = collect_months(&month_window(date(2026, 5, 1)), MonthNameStyle::Full, |_, _| {
            calls += 1;
            if calls == 2 {
                Err("connection reset")
            } else {
                Ok(Some(1.0))
            }
        })
        .unwrap_err();
        assert_eq!(err, "connection reset");
        assert_eq!(calls, 2);
    }

    #[test]
    fn deserialized_month_data_recovers_period() {
        let json = r#"{"month":"September","year":2025,"data":3}"#;
        let m: MonthData<u32> = serde_json::from_str(json).unwrap();
        assert_eq!(m.calendar_month(), Some(cm(2025, 9)));
    }
}
