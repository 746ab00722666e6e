//! Average wind speed over time.

use crate::processing::AnalysisError;
use crate::storage::WindDataSource;
use crate::types::{ChartCurve, Interval, Signal};

/// Average speed of `steps` equal sub-intervals of `range`.
///
/// Each point is `(step midpoint in epoch ms, average knots)`. The step
/// width is the range duration divided by `steps`, rounded down, so a
/// remainder at the end of the range is not covered. Steps without records
/// leave a gap in the curve.
pub fn speed_graph<S: WindDataSource + ?Sized>(
    source: &S,
    range: &Interval,
    steps: usize,
) -> Result<ChartCurve, AnalysisError> {
    if steps == 0 {
        return Err(AnalysisError::InvalidBucketSize);
    }
    let step_millis = range.duration_millis() / steps as i64;
    if step_millis <= 0 {
        return Err(AnalysisError::InvalidAverageInterval(step_millis));
    }

    let mut curve = ChartCurve::with_capacity(steps);
    for step in 0..steps as i64 {
        let start = range.start() + step * step_millis;
        let end = start + step_millis;
        if let Some(speed) = source.fetch_average(Signal::Speed, start, end)? {
            curve.push(((start + end) / 2) as f64, speed);
        }
    }
    tracing::debug!(
        steps,
        step_millis,
        points = curve.len(),
        "Averaged speed graph"
    );
    Ok(curve)
}
