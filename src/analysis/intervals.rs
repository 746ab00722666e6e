//! Selection of time intervals by their average wind speed and direction.
//!
//! A range is cut into equal steps; each step whose average speed and
//! average direction fall inside the filter bounds is kept. Kept steps can
//! optionally be merged with the previous one when they touch.

use serde::{Deserialize, Serialize};

use crate::config::SelectionConfig;
use crate::processing::AnalysisError;
use crate::storage::WindDataSource;
use crate::types::{Interval, IntervalWithSamples, Signal};

/// Optional speed (knots) and direction (degrees) bounds.
///
/// Lower bounds are inclusive, upper bounds exclusive. Missing bounds are
/// filled from [`SelectionConfig`] by [`WindFilter::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindFilter {
    pub speed_from: Option<f64>,
    pub speed_to: Option<f64>,
    pub direction_from: Option<f64>,
    pub direction_to: Option<f64>,
}

impl WindFilter {
    /// Filter on speed only.
    pub fn speed(from: Option<f64>, to: Option<f64>) -> Self {
        Self {
            speed_from: from,
            speed_to: to,
            ..Self::default()
        }
    }

    /// Whether any bound is set. Without bounds analyses use the whole range
    /// as one interval.
    pub fn is_active(&self) -> bool {
        self.speed_from.is_some()
            || self.speed_to.is_some()
            || self.direction_from.is_some()
            || self.direction_to.is_some()
    }

    /// Whether both speed bounds are set.
    pub fn has_speed_range(&self) -> bool {
        self.speed_from.is_some() && self.speed_to.is_some()
    }

    pub fn resolve(&self, defaults: &SelectionConfig) -> FilterBounds {
        FilterBounds {
            speed_from: self.speed_from.unwrap_or(defaults.speed_from),
            speed_to: self.speed_to.unwrap_or(defaults.speed_to),
            direction_from: self.direction_from.unwrap_or(defaults.direction_from),
            direction_to: self.direction_to.unwrap_or(defaults.direction_to),
        }
    }
}

/// Fully specified filter bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterBounds {
    pub speed_from: f64,
    pub speed_to: f64,
    pub direction_from: f64,
    pub direction_to: f64,
}

impl FilterBounds {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        // Negated so NaN bounds are rejected too
        if !(self.speed_from < self.speed_to) {
            return Err(AnalysisError::InvalidFilter(format!(
                "upper speed bound {} must be larger than lower speed bound {}",
                self.speed_to, self.speed_from
            )));
        }
        if !(self.direction_from < self.direction_to) {
            return Err(AnalysisError::InvalidFilter(format!(
                "upper direction bound {} must be larger than lower direction bound {}",
                self.direction_to, self.direction_from
            )));
        }
        Ok(())
    }

    pub fn contains(&self, speed: f64, direction: f64) -> bool {
        speed >= self.speed_from
            && speed < self.speed_to
            && direction >= self.direction_from
            && direction < self.direction_to
    }
}

/// Steps of `average_millis` in `range` whose averages lie inside `bounds`.
///
/// Steps start at `range.start()` and continue while the step start is
/// before `range.end()`; the last step may reach past the end. Steps without
/// data are never kept.
pub fn select_intervals<S: WindDataSource + ?Sized>(
    source: &S,
    range: &Interval,
    bounds: &FilterBounds,
    average_millis: i64,
    collapse_adjoining: bool,
    max_intervals: i64,
) -> Result<Vec<Interval>, AnalysisError> {
    if average_millis <= 0 {
        return Err(AnalysisError::InvalidAverageInterval(average_millis));
    }
    bounds.validate()?;
    let steps = range.duration_millis() / average_millis;
    if steps > max_intervals {
        return Err(AnalysisError::TooManyIntervals {
            count: steps,
            max: max_intervals,
        });
    }

    let mut selected: Vec<Interval> = Vec::new();
    let mut last_added_end: Option<i64> = None;
    let mut step_start = range.start();

    while step_start < range.end() {
        let step_end = step_start.saturating_add(average_millis);
        let speed = source.fetch_average(Signal::Speed, step_start, step_end)?;
        let direction = source.fetch_average(Signal::Direction, step_start, step_end)?;

        if let (Some(speed), Some(direction)) = (speed, direction) {
            if bounds.contains(speed, direction) {
                match selected.last_mut() {
                    Some(last) if collapse_adjoining && last_added_end == Some(step_start) => {
                        last.extend_to(step_end);
                    }
                    _ => selected.push(Interval::new(step_start, step_end)?),
                }
                last_added_end = Some(step_end);
            }
        }
        step_start = step_end;
    }

    tracing::debug!(
        range = %range,
        average_millis,
        steps,
        selected = selected.len(),
        "Selected intervals by average wind"
    );
    Ok(selected)
}

/// Fetch the samples of `signal` for each interval, keeping their order.
pub fn load_intervals<S: WindDataSource + ?Sized>(
    source: &S,
    intervals: &[Interval],
    signal: Signal,
) -> Result<Vec<IntervalWithSamples>, AnalysisError> {
    intervals
        .iter()
        .map(|interval| {
            let samples = source.fetch_ordered_samples(signal, interval.start(), interval.end())?;
            Ok(IntervalWithSamples::new(*interval, samples))
        })
        .collect()
}

/// The intervals an analysis runs on.
///
/// An inactive filter yields the whole range as one interval; otherwise the
/// matching `average_millis` steps, not merged.
pub fn gather_intervals<S: WindDataSource + ?Sized>(
    source: &S,
    range: &Interval,
    filter: &WindFilter,
    signal: Signal,
    average_millis: i64,
    selection: &SelectionConfig,
) -> Result<Vec<IntervalWithSamples>, AnalysisError> {
    if !filter.is_active() {
        return load_intervals(source, std::slice::from_ref(range), signal);
    }
    let bounds = filter.resolve(selection);
    let intervals = select_intervals(
        source,
        range,
        &bounds,
        average_millis,
        false,
        selection.max_intervals,
    )?;
    load_intervals(source, &intervals, signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryWindSource;
    use crate::types::WindRecord;

    const MINUTE: i64 = 60_000;

    /// One record per minute for three hours: 10 kn from 90° in the first
    /// and third hour, 20 kn from 200° in the second.
    fn source() -> MemoryWindSource {
        (0..180)
            .map(|m| {
                let (direction, speed) = if (60..120).contains(&m) { (200, 200) } else { (90, 100) };
                WindRecord::new(m * MINUTE, direction, speed)
            })
            .collect()
    }

    fn bounds(speed: (f64, f64), direction: (f64, f64)) -> FilterBounds {
        FilterBounds {
            speed_from: speed.0,
            speed_to: speed.1,
            direction_from: direction.0,
            direction_to: direction.1,
        }
    }

    #[test]
    fn test_selects_matching_steps() {
        let range = Interval::new(0, 180 * MINUTE).unwrap();
        let selected = select_intervals(
            &source(),
            &range,
            &bounds((5.0, 15.0), (0.0, 360.0)),
            30 * MINUTE,
            false,
            10_000,
        )
        .unwrap();
        let starts: Vec<i64> = selected.iter().map(|i| i.start() / MINUTE).collect();
        assert_eq!(starts, vec![0, 30, 120, 150]);
        assert!(selected.iter().all(|i| i.duration_millis() == 30 * MINUTE));
    }

    #[test]
    fn test_collapse_adjoining_steps() {
        let range = Interval::new(0, 180 * MINUTE).unwrap();
        let selected = select_intervals(
            &source(),
            &range,
            &bounds((5.0, 15.0), (0.0, 360.0)),
            30 * MINUTE,
            true,
            10_000,
        )
        .unwrap();
        assert_eq!(
            selected,
            vec![
                Interval::new(0, 60 * MINUTE).unwrap(),
                Interval::new(120 * MINUTE, 180 * MINUTE).unwrap(),
            ]
        );
    }

    #[test]
    fn test_collapse_at_epoch_start() {
        let src: MemoryWindSource = (0..4).map(|m| WindRecord::new(m * MINUTE, 10, 50)).collect();
        let range = Interval::new(0, 4 * MINUTE).unwrap();
        let selected = select_intervals(
            &src,
            &range,
            &bounds((0.0, 1000.0), (0.0, 360.0)),
            MINUTE,
            true,
            10_000,
        )
        .unwrap();
        assert_eq!(selected, vec![Interval::new(0, 4 * MINUTE).unwrap()]);
    }

    #[test]
    fn test_direction_bounds_apply() {
        let range = Interval::new(0, 180 * MINUTE).unwrap();
        let selected = select_intervals(
            &source(),
            &range,
            &bounds((0.0, 1000.0), (180.0, 220.0)),
            30 * MINUTE,
            true,
            10_000,
        )
        .unwrap();
        assert_eq!(selected, vec![Interval::new(60 * MINUTE, 120 * MINUTE).unwrap()]);
    }

    #[test]
    fn test_invalid_arguments() {
        let range = Interval::new(0, 180 * MINUTE).unwrap();
        let ok = bounds((0.0, 1000.0), (0.0, 360.0));
        assert!(matches!(
            select_intervals(&source(), &range, &ok, 0, false, 10_000),
            Err(AnalysisError::InvalidAverageInterval(0))
        ));
        assert!(matches!(
            select_intervals(&source(), &range, &bounds((10.0, 10.0), (0.0, 360.0)), MINUTE, false, 10_000),
            Err(AnalysisError::InvalidFilter(_))
        ));
        assert!(matches!(
            select_intervals(&source(), &range, &bounds((0.0, 10.0), (90.0, 10.0)), MINUTE, false, 10_000),
            Err(AnalysisError::InvalidFilter(_))
        ));
        assert!(matches!(
            select_intervals(&source(), &range, &ok, 1_000, false, 10_000),
            Err(AnalysisError::TooManyIntervals { count: 10_800, max: 10_000 })
        ));
    }

    #[test]
    fn test_filter_resolution() {
        let defaults = SelectionConfig::default();
        let filter = WindFilter::speed(Some(5.0), None);
        assert!(filter.is_active());
        assert!(!filter.has_speed_range());
        let bounds = filter.resolve(&defaults);
        assert_eq!(bounds.speed_from, 5.0);
        assert_eq!(bounds.speed_to, 1_000.0);
        assert_eq!(bounds.direction_to, 360.0);
        assert!(!WindFilter::default().is_active());
    }

    #[test]
    fn test_gather_without_filter_uses_whole_range() {
        let range = Interval::new(0, 10 * MINUTE).unwrap();
        let data = gather_intervals(
            &source(),
            &range,
            &WindFilter::default(),
            Signal::Speed,
            30 * MINUTE,
            &SelectionConfig::default(),
        )
        .unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].interval, range);
        // (start, end]: the record at t=0 is excluded, the one at 10 min included
        assert_eq!(data[0].samples.len(), 10);
    }
}
