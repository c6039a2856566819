//! Monthly metric observations and fixed-window series.

use serde::{Deserialize, Serialize};

use crate::month::CalendarMonth;

/// Number of calendar months in a forecasting window: four fully elapsed
/// months plus the current, possibly partial, month.
pub const WINDOW_MONTHS: usize = 5;

/// One numeric (or absent) value for one named series at one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricObservation {
    pub series_key: String,
    pub year: i32,
    pub month: u32,
    pub value: Option<f64>,
}

impl MetricObservation {
    pub fn new(series_key: impl Into<String>, period: CalendarMonth, value: Option<f64>) -> Self {
        Self {
            series_key: series_key.into(),
            year: period.year,
            month: period.month,
            value,
        }
    }

    pub fn period(&self) -> CalendarMonth {
        CalendarMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// Ordered oldest→newest slots for one series; the final slot is the current
/// calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub series_key: String,
    pub slots: Vec<MetricObservation>,
}

impl MetricSeries {
    /// Slot values in window order, `None` where no usable row existed.
    pub fn values(&self) -> Vec<Option<f64>> {
        self.slots.iter().map(|s| s.value).collect()
    }

    /// The current (final) slot, if the series is non-empty.
    pub fn current(&self) -> Option<&MetricObservation> {
        self.slots.last()
    }

    /// Slots for fully elapsed months (all but the last).
    pub fn elapsed(&self) -> &[MetricObservation] {
        match self.slots.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }
}
