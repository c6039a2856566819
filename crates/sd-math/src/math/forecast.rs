//! Trend-adjusted month-end forecast with a high/low band.
//!
//! A deliberately simple heuristic, not a fitted time-series model:
//!
//! 1. drop absent and non-finite observations, keeping order;
//! 2. take the population mean and standard deviation of what remains;
//! 3. scale the mean by the single most recent step's growth rate;
//! 4. place a band of ±1.5σ around that trend-adjusted mean, floored at zero.
//!
//! Estimation never fails. An empty series yields an all-zero result and a
//! single observation yields a zero-width band around itself, so renderers and
//! aggregators can always rely on receiving a well-formed [`ForecastResult`].

use serde::{Deserialize, Serialize};

use super::stats::{mean, population_std_dev, round2, step_growth_rate};

/// Half-width of the forecast band in standard deviations.
pub const BAND_SIGMAS: f64 = 1.5;

/// Month-end projection for one series, rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub high: f64,
    pub mean: f64,
    pub low: f64,
}

impl ForecastResult {
    /// The no-data result.
    pub const ZERO: ForecastResult = ForecastResult {
        high: 0.0,
        mean: 0.0,
        low: 0.0,
    };
}

/// Unrounded intermediate quantities behind a [`ForecastResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastDetail {
    /// Number of usable observations.
    pub n: usize,
    /// Plain mean of the usable observations.
    pub mean: f64,
    /// Population standard deviation of the usable observations.
    pub std_dev: f64,
    /// Growth from the second-most-recent to the most recent observation.
    pub growth_rate: f64,
    /// `mean * (1 + growth_rate)`.
    pub trend_mean: f64,
    /// Rounded, floored output.
    pub result: ForecastResult,
}

/// Forecast a series of nullable observations ordered oldest→newest.
pub fn estimate(series: &[Option<f64>]) -> ForecastResult {
    estimate_detailed(series).result
}

/// Like [`estimate`], but also returns the unrounded intermediates.
pub fn estimate_detailed(series: &[Option<f64>]) -> ForecastDetail {
    let values: Vec<f64> = series
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();

    let n = values.len();
    if n == 0 {
        return ForecastDetail {
            n: 0,
            mean: 0.0,
            std_dev: 0.0,
            growth_rate: 0.0,
            trend_mean: 0.0,
            result: ForecastResult::ZERO,
        };
    }

    let avg = mean(&values);
    let std_dev = population_std_dev(&values);

    let growth_rate = match values.as_slice() {
        [.., previous, recent] => step_growth_rate(*previous, *recent),
        _ => 0.0,
    };

    let trend_mean = avg * (1.0 + growth_rate);
    let high = trend_mean + BAND_SIGMAS * std_dev;
    let low = (trend_mean - BAND_SIGMAS * std_dev).max(0.0);

    ForecastDetail {
        n,
        mean: avg,
        std_dev,
        growth_rate,
        trend_mean,
        result: ForecastResult {
            high: round2(high),
            mean: round2(trend_mean),
            low: round2(low),
        },
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn series_strategy() -> impl Strategy<Value = Vec<Option<f64>>> {
        prop::collection::vec(prop::option::of(0.0f64..1.0e6), 0..=5)
    }

    proptest! {
        #[test]
        fn low_never_negative(series in series_strategy()) {
            let r = estimate(&series);
            prop_assert!(r.low >= 0.0, "low below zero: {}", r.low);
        }

        #[test]
        fn band_is_ordered_for_non_negative_input(series in series_strategy()) {
            let r = estimate(&series);
            prop_assert!(r.high >= r.mean, "high {} < mean {}", r.high, r.mean);
            prop_assert!(r.mean >= r.low, "mean {} < low {}", r.mean, r.low);
        }

        #[test]
        fn nulls_do_not_change_the_result(series in series_strategy()) {
            let compact: Vec<Option<f64>> = series.iter().copied().flatten().map(Some).collect();
            prop_assert_eq!(estimate(&series), estimate(&compact));
        }

        #[test]
        fn outputs_have_at_most_two_decimals(series in series_strategy()) {
            let r = estimate(&series);
            for v in [r.high, r.mean, r.low] {
                prop_assert!((v * 100.0 - (v * 100.0).round()).abs() <= 1e-6 * v.abs().max(1.0));
            }
        }
    }
}
