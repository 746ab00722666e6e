//! Value histograms and summary statistics of a time range.

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::config::defaults::{HISTOGRAM_DIRECTION_BUCKET_DEG, HISTOGRAM_SPEED_BUCKET_KNOTS};
use crate::processing::AnalysisError;
use crate::storage::WindDataSource;
use crate::types::{ChartCurve, Interval, Signal, ValueCount};

/// Occurrences of every stored value of `signal` in `[start, end)`, with
/// `x` the value and `y` the count.
pub fn value_histogram<S: WindDataSource + ?Sized>(
    source: &S,
    signal: Signal,
    range: &Interval,
) -> Result<ChartCurve, AnalysisError> {
    let counts = source.fetch_value_histogram(signal, range.start(), range.end())?;
    let mut curve = ChartCurve::with_capacity(counts.len());
    for ValueCount { value, count } in counts {
        curve.push(value, count as f64);
    }
    Ok(curve)
}

/// Display bucket width for a signal, and whether zero gets its own bucket.
pub fn histogram_buckets(signal: Signal) -> (f64, bool) {
    match signal {
        Signal::Speed => (HISTOGRAM_SPEED_BUCKET_KNOTS, true),
        Signal::Direction => (HISTOGRAM_DIRECTION_BUCKET_DEG, false),
    }
}

/// Group a value histogram into buckets of `bucket_size`.
///
/// Each output point is `(bucket centre, total count)`, ascending, for
/// non-empty buckets only. With `zero_bucket` the value 0 is reported on its
/// own at `x = 0` (calm readings).
pub fn bucket_histogram(
    histogram: &ChartCurve,
    bucket_size: f64,
    zero_bucket: bool,
) -> Result<ChartCurve, AnalysisError> {
    if !(bucket_size > 0.0) || !bucket_size.is_finite() {
        return Err(AnalysisError::InvalidFilter(format!(
            "histogram bucket size must be a positive number, got {bucket_size}"
        )));
    }

    let mut out = ChartCurve::default();
    let mut current: Option<(i64, f64)> = None;

    for (value, count) in histogram.points() {
        if zero_bucket && value == 0.0 {
            out.push(0.0, count);
            continue;
        }
        // Small epsilon keeps values like 0.3 / 0.1 in the intended bucket
        let index = (value / bucket_size + 1e-9).floor() as i64;
        match current.as_mut() {
            Some((bucket, total)) if *bucket == index => *total += count,
            _ => {
                if let Some((bucket, total)) = current.take() {
                    out.push((bucket as f64 + 0.5) * bucket_size, total);
                }
                current = Some((index, count));
            }
        }
    }
    if let Some((bucket, total)) = current {
        out.push((bucket as f64 + 0.5) * bucket_size, total);
    }
    Ok(out)
}

/// Summary statistics of one signal over a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalSummary {
    pub signal: Signal,
    pub samples: usize,
    pub mean: f64,
    /// Sample standard deviation, NaN below two samples
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Statistics of the samples of `signal` in `(start, end]`, or `None` when
/// the range holds no samples.
pub fn summarize<S: WindDataSource + ?Sized>(
    source: &S,
    signal: Signal,
    range: &Interval,
) -> Result<Option<SignalSummary>, AnalysisError> {
    let samples = source.fetch_ordered_samples(signal, range.start(), range.end())?;
    if samples.is_empty() {
        return Ok(None);
    }
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    Ok(Some(SignalSummary {
        signal,
        samples: values.len(),
        mean: values.iter().mean(),
        std_dev: values.iter().std_dev(),
        min: Statistics::min(values.iter()),
        max: Statistics::max(values.iter()),
    }))
}
