//! Descriptive statistics over plain `f64` slices.
//!
//! All functions are total: empty input yields `0.0` instead of `NaN` so that
//! callers never have to special-case missing history.

use std::cmp::Ordering;

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`, not `n - 1`).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn population_std_dev(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Relative change from `previous` to `recent`.
///
/// Guarded: a zero or negative base yields 0.0 rather than an infinite or
/// sign-flipped rate.
pub fn step_growth_rate(previous: f64, recent: f64) -> f64 {
    if previous > 0.0 {
        (recent - previous) / previous
    } else {
        0.0
    }
}

/// Magnitudes at or above this have no fractional hundredths left to round.
const ROUND2_LIMIT: f64 = 1e15;

/// Round to two decimal places from the exact stored value.
///
/// `(value * 100.0).round()` rounds twice: a value stored just below a
/// `.xx5` midpoint (62.245 is really 62.24499999...) can land exactly on
/// `.5` after scaling and round up. Here the choice between the two
/// neighbouring hundredths is made by comparing the stored value against
/// their midpoint exactly. Exact ties round away from zero.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let magnitude = value.abs();
    if magnitude >= ROUND2_LIMIT {
        return value;
    }
    let lower = (magnitude * 100.0).floor();
    let hundredths = match cmp_hundredths_midpoint(magnitude, lower) {
        Ordering::Less => lower,
        Ordering::Equal | Ordering::Greater => lower + 1.0,
    };
    let rounded = (hundredths / 100.0).copysign(value);
    // Avoid serializing "-0.0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Compare `magnitude` with `(lower + 0.5) / 100` without rounding error.
///
/// Both sides are scaled by 200: `200 * magnitude` is split into `p + e`
/// with a fused multiply-add, and the midpoint becomes the odd integer
/// `2 * lower + 1`.
fn cmp_hundredths_midpoint(magnitude: f64, lower: f64) -> Ordering {
    let eighths = magnitude * 8.0;
    let p = eighths * 25.0;
    let e = 25.0f64.mul_add(eighths, -p);
    let midpoint = 2.0 * lower + 1.0;
    let d = p - midpoint;
    d.partial_cmp(&-e).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_variance(&[]), 0.0);
    }

    #[test]
    fn population_variance_divides_by_n() {
        // Sample variance would be 2.5; population variance is 2.0.
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(approx_eq(population_variance(&v), 2.0, 1e-12));
        assert!(approx_eq(population_std_dev(&v), 2.0f64.sqrt(), 1e-12));
    }

    #[test]
    fn growth_rate_guards_non_positive_base() {
        assert_eq!(step_growth_rate(0.0, 50.0), 0.0);
        assert_eq!(step_growth_rate(-10.0, 50.0), 0.0);
        assert!(approx_eq(step_growth_rate(100.0, 110.0), 0.1, 1e-12));
        assert!(approx_eq(step_growth_rate(100.0, 50.0), -0.5, 1e-12));
    }

    #[test]
    fn round2_behaves() {
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(2.675_000_1), 2.68);
        assert_eq!(round2(-0.001), 0.0);
        assert!(round2(-0.001).is_sign_positive());
    }

    #[test]
    fn round2_uses_stored_value_below_midpoint() {
        // 62.245 is stored as 62.244999999999997..., 44.995 as 44.994999999999997...
        assert_eq!(round2(62.245), 62.24);
        assert_eq!(round2(44.995), 44.99);
        assert_eq!(round2(1.005), 1.0);
        assert_eq!(round2(-62.245), -62.24);
    }

    #[test]
    fn round2_exact_ties_round_away_from_zero() {
        // 0.125 and 10.375 are exactly representable midpoints.
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(10.375), 10.38);
        assert_eq!(round2(-0.125), -0.13);
    }

    #[test]
    fn round2_handles_scaling_past_an_integer() {
        // 0.29 * 100.0 == 28.999999999999996 in f64.
        assert_eq!(round2(0.29), 0.29);
        assert_eq!(round2(4.35), 4.35);
        assert_eq!(round2(138.355_000_1), 138.36);
        assert_eq!(round2(1e16), 1e16);
    }
}
