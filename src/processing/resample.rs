//! Zero-order-hold resampling of irregular samples onto a 1 Hz grid.

use crate::types::{Interval, IntervalWithSamples, Sample, MILLIS_PER_SECOND};

/// Number of 1 Hz slots covering an interval: whole seconds plus the start slot.
pub fn one_hz_length(interval: &Interval) -> usize {
    usize::try_from(interval.duration_secs()).unwrap_or(0) + 1
}

/// Resample `data` onto `len` slots, one per second from the interval start.
///
/// Returns `None` when the interval holds no samples.
pub fn resample(data: &IntervalWithSamples, len: usize) -> Option<Vec<f64>> {
    resample_from(data.interval.start(), &data.samples, len)
}

/// Step-hold resampling starting at `start` (epoch ms).
///
/// Slot `i` carries the value of the last sample with
/// `timestamp <= start + i * 1000`. Slots before the first sample take the
/// first sample's value and slots past the last sample keep the last value.
/// `samples` must be sorted by timestamp; this is a single forward scan.
pub fn resample_from(start: i64, samples: &[Sample], len: usize) -> Option<Vec<f64>> {
    if samples.is_empty() {
        return None;
    }

    let last = samples.len() - 1;
    let mut cursor = 0usize;
    let mut series = Vec::with_capacity(len);

    let mut target = start;
    for _ in 0..len {
        while cursor < last && samples[cursor + 1].timestamp <= target {
            cursor += 1;
        }
        series.push(samples[cursor].value);
        target += MILLIS_PER_SECOND;
    }

    Some(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(i64, f64)]) -> Vec<Sample> {
        points.iter().map(|&(t, v)| Sample::new(t, v)).collect()
    }

    #[test]
    fn test_single_sample_fills_every_slot() {
        for len in [1, 2, 17, 300] {
            let series = resample_from(10_000, &samples(&[(12_345, 7.5)]), len).unwrap();
            assert_eq!(series.len(), len);
            assert!(series.iter().all(|&v| v == 7.5));
        }
    }

    #[test]
    fn test_step_hold_between_samples() {
        let data = samples(&[(0, 1.0), (2_500, 2.0), (4_000, 3.0)]);
        let series = resample_from(0, &data, 6).unwrap();
        assert_eq!(series, vec![1.0, 1.0, 1.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_before_first_sample_uses_first_value() {
        let data = samples(&[(3_000, 4.0), (4_000, 5.0)]);
        let series = resample_from(0, &data, 5).unwrap();
        assert_eq!(series, vec![4.0, 4.0, 4.0, 4.0, 5.0]);
    }

    #[test]
    fn test_dense_samples_keep_last_per_second() {
        let data = samples(&[(0, 1.0), (200, 2.0), (900, 3.0), (1_000, 4.0), (1_500, 5.0)]);
        let series = resample_from(0, &data, 3).unwrap();
        assert_eq!(series, vec![1.0, 4.0, 5.0]);
    }

    #[test]
    fn test_empty_samples_yield_none() {
        assert!(resample_from(0, &[], 10).is_none());
    }

    #[test]
    fn test_one_hz_length_includes_start_slot() {
        let interval = Interval::new(0, 1_800_000).unwrap();
        assert_eq!(one_hz_length(&interval), 1_801);
        let empty = Interval::new(5, 5).unwrap();
        assert_eq!(one_hz_length(&empty), 1);
    }
}
