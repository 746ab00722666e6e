//! Lagged autocorrelation of wind speed and direction.
//!
//! Two estimators share one accumulation loop:
//!
//! - **Linear** (speed): `v_i·v_j / max(v_i, v_j)²`, with two zero readings
//!   counted as perfectly correlated.
//! - **Circular** (direction): `(90 - d) / 90` where `d` is the shortest
//!   angular distance in degrees, so identical headings give `+1` and
//!   opposite headings give `-1`.
//!
//! Each interval contributes its per-lag mean divided by the number of
//! intervals passed in, so the curve is an average over intervals. An
//! interval too short to reach a lag adds nothing at that lag but still
//! counts in the divisor, which down-weights long lags.

use rayon::prelude::*;

use super::resample::{one_hz_length, resample};
use crate::types::{IntervalWithSamples, SignalKind};

/// Correlation of a single value pair under the given distance semantics.
pub fn pair_correlation(kind: SignalKind, value: f64, other: f64) -> f64 {
    match kind {
        SignalKind::Linear => {
            let max = value.max(other);
            if max > 0.0 {
                value * other / (max * max)
            } else {
                1.0
            }
        }
        SignalKind::Circular => {
            let mut difference = (value - other).abs();
            if difference > 180.0 {
                difference = 360.0 - difference;
            }
            (90.0 - difference) / 90.0
        }
    }
}

/// Per-lag mean correlation of one fixed-rate series.
///
/// Lags at or beyond the series length are left at zero.
pub fn lag_means(series: &[f64], kind: SignalKind, max_lag: usize) -> Vec<f64> {
    let mut means = vec![0.0; max_lag];
    for (lag, mean) in means.iter_mut().enumerate() {
        if lag >= series.len() {
            break;
        }
        let n_valid = series.len() - lag;
        let sum: f64 = series[..n_valid]
            .iter()
            .zip(&series[lag..])
            .map(|(&value, &other)| pair_correlation(kind, value, other))
            .sum();
        *mean = sum / n_valid as f64;
    }
    means
}

/// Add the autocorrelation of every interval into `curve`.
///
/// `curve.len()` is the maximum lag. Intervals without samples are skipped
/// but still count as intervals for the normalization.
pub fn accumulate(curve: &mut [f64], intervals: &[IntervalWithSamples], kind: SignalKind) {
    if intervals.is_empty() {
        return;
    }
    let max_lag = curve.len();
    let n_intervals = intervals.len() as f64;

    let per_interval: Vec<Vec<f64>> = intervals
        .par_iter()
        .filter_map(|data| {
            let series = resample(data, one_hz_length(&data.interval));
            if series.is_none() {
                tracing::debug!(interval = %data.interval, "Skipping interval without samples");
            }
            series
        })
        .map(|series| lag_means(&series, kind, max_lag))
        .collect();

    for means in &per_interval {
        for (slot, mean) in curve.iter_mut().zip(means) {
            *slot += mean / n_intervals;
        }
    }

    tracing::debug!(
        intervals = intervals.len(),
        contributing = per_interval.len(),
        max_lag,
        ?kind,
        "Accumulated autocorrelation"
    );
}

/// Autocorrelation curve of length `max_lag` over all `intervals`.
pub fn autocorrelation(
    intervals: &[IntervalWithSamples],
    kind: SignalKind,
    max_lag: usize,
) -> Vec<f64> {
    let mut curve = vec![0.0; max_lag];
    accumulate(&mut curve, intervals, kind);
    curve
}
