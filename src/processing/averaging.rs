//! Bucket averaging of chart curves for display.
//!
//! Both strategies walk the points in order and replace each bucket by the
//! mean of its x and y values. The input curve is never modified.

use super::AnalysisError;
use crate::types::ChartCurve;

/// Running sums of the points in the current bucket.
#[derive(Debug, Default)]
struct Bucket {
    x_sum: f64,
    y_sum: f64,
    count: usize,
}

impl Bucket {
    fn push(&mut self, x: f64, y: f64) {
        self.x_sum += x;
        self.y_sum += y;
        self.count += 1;
    }

    /// Append the bucket mean to `out` and reset. Empty buckets are dropped.
    fn flush_into(&mut self, out: &mut ChartCurve) {
        if self.count > 0 {
            let n = self.count as f64;
            out.push(self.x_sum / n, self.y_sum / n);
        }
        *self = Self::default();
    }
}

/// Average consecutive runs of `points_per_bucket` points.
///
/// The last bucket may hold fewer points. `points_per_bucket == 1` returns
/// the curve unchanged.
pub fn average_fixed(curve: &ChartCurve, points_per_bucket: usize) -> Result<ChartCurve, AnalysisError> {
    if points_per_bucket == 0 {
        return Err(AnalysisError::InvalidBucketSize);
    }

    let mut out = ChartCurve::with_capacity(curve.len().div_ceil(points_per_bucket));
    let mut bucket = Bucket::default();
    for (x, y) in curve.points() {
        bucket.push(x, y);
        if bucket.count == points_per_bucket {
            bucket.flush_into(&mut out);
        }
    }
    bucket.flush_into(&mut out);
    Ok(out)
}

/// Average with buckets whose x-width grows geometrically by `factor`.
///
/// Starting from `[x₀, x₀·factor]`, points are added to the current bucket
/// until a point lies beyond the bucket end *and* the bucket already holds
/// `min_points_per_bucket` points. The bucket is then flushed and the next
/// one starts at the larger of the last x seen and the previous end. The
/// x values must be non-decreasing.
pub fn average_logarithmic(
    curve: &ChartCurve,
    factor: f64,
    min_points_per_bucket: usize,
) -> Result<ChartCurve, AnalysisError> {
    // Also rejects NaN, which would never advance a bucket
    if !(factor > 1.0) {
        return Err(AnalysisError::InvalidAveragingFactor(factor));
    }

    let Some(&first_x) = curve.x.first() else {
        return Ok(ChartCurve::default());
    };

    let mut out = ChartCurve::default();
    let mut bucket = Bucket::default();
    let mut interval_end = first_x * factor;
    let mut last_x = first_x;

    for (x, y) in curve.points() {
        if x > interval_end && bucket.count >= min_points_per_bucket.max(1) {
            bucket.flush_into(&mut out);
            let interval_start = last_x.max(interval_end);
            interval_end = interval_start * factor;
        }
        bucket.push(x, y);
        last_x = x;
    }
    bucket.flush_into(&mut out);

    tracing::trace!(
        input_points = curve.len(),
        output_points = out.len(),
        factor,
        min_points_per_bucket,
        "Logarithmic chart averaging"
    );
    Ok(out)
}
