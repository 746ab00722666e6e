//! Time-series model: samples, intervals and chart curves.

use serde::{Deserialize, Serialize};

use crate::processing::AnalysisError;

/// Milliseconds per second of the fixed-rate grid.
pub const MILLIS_PER_SECOND: i64 = 1_000;

/// A single timestamped value (knots or degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

// ============================================================================
// Interval
// ============================================================================

/// A closed time window `[start, end]` in epoch milliseconds.
///
/// The constructor rejects `end < start`; there is no way to build an
/// inverted interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    start: i64,
    end: i64,
}

impl Interval {
    pub fn new(start: i64, end: i64) -> Result<Self, AnalysisError> {
        if end < start {
            return Err(AnalysisError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn duration_millis(&self) -> i64 {
        self.end - self.start
    }

    /// Duration truncated to whole seconds.
    pub fn duration_secs(&self) -> i64 {
        self.duration_millis() / MILLIS_PER_SECOND
    }

    /// Move the end forward, used when merging adjoining windows.
    pub(crate) fn extend_to(&mut self, end: i64) {
        if end > self.end {
            self.end = end;
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", format_millis(self.start), format_millis(self.end))
    }
}

/// Render epoch milliseconds as RFC 3339 (UTC), falling back to the raw number.
pub fn format_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map_or_else(|| format!("{ms} ms"), |dt| dt.to_rfc3339())
}

/// An interval together with the ordered samples in `(start, end]`.
///
/// Owned by whoever built it; the engines only ever borrow it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalWithSamples {
    pub interval: Interval,
    pub samples: Vec<Sample>,
}

impl IntervalWithSamples {
    pub fn new(interval: Interval, samples: Vec<Sample>) -> Self {
        Self { interval, samples }
    }

    /// Copy whose interval runs from the first to the last sample.
    ///
    /// Without samples the interval is kept as is.
    pub fn clipped_to_samples(&self) -> Self {
        let interval = match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Interval {
                start: first.timestamp,
                end: last.timestamp.max(first.timestamp),
            },
            _ => self.interval,
        };
        Self {
            interval,
            samples: self.samples.clone(),
        }
    }
}

// ============================================================================
// Chart Curve
// ============================================================================

/// A display-ready curve of equal-length `x` and `y` arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl ChartCurve {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, AnalysisError> {
        if x.len() != y.len() {
            return Err(AnalysisError::LengthMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        Ok(Self { x, y })
    }

    /// Curve whose x values are the array indices of `values`.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            x: (0..values.len()).map(|i| i as f64).collect(),
            y: values.to_vec(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_rejects_inverted_bounds() {
        let err = Interval::new(2_000, 1_000).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidInterval { start: 2_000, end: 1_000 }
        ));
    }

    #[test]
    fn test_interval_allows_empty_window() {
        let interval = Interval::new(5_000, 5_000).unwrap();
        assert_eq!(interval.duration_millis(), 0);
        assert_eq!(interval.duration_secs(), 0);
    }

    #[test]
    fn test_duration_truncates_to_seconds() {
        let interval = Interval::new(0, 2_999).unwrap();
        assert_eq!(interval.duration_secs(), 2);
    }

    #[test]
    fn test_clip_to_sample_span() {
        let data = IntervalWithSamples::new(
            Interval::new(0, 86_400_000).unwrap(),
            vec![Sample::new(7_000, 1.0), Sample::new(9_500, 2.0)],
        );
        let clipped = data.clipped_to_samples();
        assert_eq!(clipped.interval, Interval::new(7_000, 9_500).unwrap());
        assert_eq!(clipped.samples, data.samples);

        let empty = IntervalWithSamples::new(Interval::new(0, 1_000).unwrap(), Vec::new());
        assert_eq!(empty.clipped_to_samples(), empty);
    }

    #[test]
    fn test_chart_curve_rejects_uneven_lengths() {
        assert!(ChartCurve::new(vec![1.0, 2.0], vec![1.0]).is_err());
        let curve = ChartCurve::from_values(&[3.0, 4.0, 5.0]);
        assert_eq!(curve.x, vec![0.0, 1.0, 2.0]);
        assert_eq!(curve.y, vec![3.0, 4.0, 5.0]);
    }
}
