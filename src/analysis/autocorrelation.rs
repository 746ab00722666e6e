//! Autocorrelation reports and the per-direction scan.

use serde::Serialize;
use tracing::info;

use super::intervals::{gather_intervals, WindFilter};
use crate::config::defaults::{
    DIRECTION_SCAN_SECTORS, DIRECTION_SCAN_SECTOR_DEG, DIRECTION_SHORT_TERM_LINE_LENGTH,
    DIRECTION_SHORT_TERM_OFFSET, SCAN_OFFSET_SCALE, SCAN_SLOPE_SCALE,
};
use crate::config::AnalyzerConfig;
use crate::processing::{
    autocorrelation, average_logarithmic, linear_values, AnalysisError, BiExponentialFitter,
    FitReport,
};
use crate::storage::WindDataSource;
use crate::types::{ChartCurve, Interval, IntervalWithSamples, Signal};

/// Everything needed to chart an autocorrelation and its fit.
#[derive(Debug, Clone, Serialize)]
pub struct AutocorrelationReport {
    pub signal: Signal,
    /// Number of intervals the curve was averaged over
    pub intervals: usize,
    /// Correlation per lag in seconds
    pub curve: Vec<f64>,
    /// `curve` bucket-averaged for display
    pub averaged_curve: ChartCurve,
    pub fit: FitReport,
    pub fitted_curve: Vec<f64>,
    /// `a + b·i` over the whole curve
    pub long_term_line: Vec<f64>,
    /// Initial tangent of the fit
    pub short_term_line: Vec<f64>,
    /// Lag where the long-term and short-term lines cross (seconds)
    pub characteristic_time: f64,
}

/// Correlate `intervals`, fit the result and derive the chart lines.
///
/// The speed short-term line runs up to the characteristic time (at most
/// the curve length, none when the time is not usable). The direction
/// short-term line starts at a fixed offset and has a fixed length.
pub fn analyze_autocorrelation(
    intervals: &[IntervalWithSamples],
    signal: Signal,
    config: &AnalyzerConfig,
) -> Result<AutocorrelationReport, AnalysisError> {
    let length = config.autocorrelation.correlation_length;
    let curve = autocorrelation(intervals, signal.kind(), length);

    let fit = BiExponentialFitter::new(config.autocorrelation.fit.max_iterations).fit(&curve);
    let params = fit.params;
    let characteristic_time = params.characteristic_time();

    let (long_offset, long_slope) = params.long_term_line();
    let (short_offset, short_slope) = params.short_term_line();
    let short_term_line = match signal {
        Signal::Speed => {
            let len = params.characteristic_length().unwrap_or(0).min(length);
            linear_values(short_offset, short_slope, len)
        }
        Signal::Direction => linear_values(
            DIRECTION_SHORT_TERM_OFFSET,
            short_slope,
            DIRECTION_SHORT_TERM_LINE_LENGTH,
        ),
    };

    let averaged_curve = average_logarithmic(
        &ChartCurve::from_values(&curve),
        config.chart.log_factor,
        config.chart.min_points_per_bucket,
    )?;

    info!(
        %signal,
        intervals = intervals.len(),
        a = params.a,
        b = params.b,
        c = params.c,
        d = params.d,
        characteristic_time,
        "Autocorrelation analysed"
    );

    Ok(AutocorrelationReport {
        signal,
        intervals: intervals.len(),
        fitted_curve: params.fitted_values(length),
        long_term_line: linear_values(long_offset, long_slope, length),
        short_term_line,
        averaged_curve,
        curve,
        fit,
        characteristic_time,
    })
}

/// Fit results per direction sector, indexed by sector start (degrees).
#[derive(Debug, Clone, Serialize)]
pub struct DirectionScan {
    /// Long-term offset `a`, scaled by 100
    pub long_term_offsets: ChartCurve,
    /// Negated long-term slope `-b`, scaled by 100 000
    pub long_term_slopes: ChartCurve,
    pub characteristic_times: ChartCurve,
}

/// Speed autocorrelation fit for each direction sector.
///
/// Each sector selects the intervals whose average direction lies inside
/// it (and whose average speed lies inside the given bounds). Sectors
/// without data report zeros.
pub fn scan_directions<S: WindDataSource + ?Sized>(
    source: &S,
    range: &Interval,
    speed_from: Option<f64>,
    speed_to: Option<f64>,
    config: &AnalyzerConfig,
) -> Result<DirectionScan, AnalysisError> {
    let fitter = BiExponentialFitter::new(config.autocorrelation.fit.max_iterations);
    let mut scan = DirectionScan {
        long_term_offsets: ChartCurve::with_capacity(DIRECTION_SCAN_SECTORS),
        long_term_slopes: ChartCurve::with_capacity(DIRECTION_SCAN_SECTORS),
        characteristic_times: ChartCurve::with_capacity(DIRECTION_SCAN_SECTORS),
    };

    for sector in 0..DIRECTION_SCAN_SECTORS {
        let direction = sector as f64 * DIRECTION_SCAN_SECTOR_DEG;
        let filter = WindFilter {
            speed_from,
            speed_to,
            direction_from: Some(direction),
            direction_to: Some(direction + DIRECTION_SCAN_SECTOR_DEG),
        };
        let intervals = gather_intervals(
            source,
            range,
            &filter,
            Signal::Speed,
            config.autocorrelation.average_interval_millis,
            &config.selection,
        )?;
        let curve = autocorrelation(
            &intervals,
            Signal::Speed.kind(),
            config.autocorrelation.correlation_length,
        );

        let (offset, slope, time) = match curve.first() {
            Some(&first) if first != 0.0 => {
                let params = fitter.fit(&curve).params;
                (
                    params.a * SCAN_OFFSET_SCALE,
                    -params.b * SCAN_SLOPE_SCALE,
                    params.characteristic_time(),
                )
            }
            _ => (0.0, 0.0, 0.0),
        };
        tracing::debug!(direction, intervals = intervals.len(), offset, slope, time, "Scanned sector");

        scan.long_term_offsets.push(direction, offset);
        scan.long_term_slopes.push(direction, slope);
        scan.characteristic_times.push(direction, time);
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryWindSource;
    use crate::types::{Sample, WindRecord};

    fn constant_interval(value: f64, seconds: i64) -> IntervalWithSamples {
        let samples = (0..=seconds).map(|s| Sample::new(s * 1_000, value)).collect();
        IntervalWithSamples::new(Interval::new(0, seconds * 1_000).unwrap(), samples)
    }

    #[test]
    fn test_report_shapes() {
        let config = AnalyzerConfig::default();
        let report =
            analyze_autocorrelation(&[constant_interval(8.0, 900)], Signal::Speed, &config).unwrap();

        assert_eq!(report.intervals, 1);
        assert_eq!(report.curve.len(), 300);
        assert_eq!(report.fitted_curve.len(), 300);
        assert_eq!(report.long_term_line.len(), 300);
        assert!(report.short_term_line.len() <= 300);
        assert!(!report.averaged_curve.is_empty());
        assert!(report.averaged_curve.len() < 300);
        assert!(report.curve.iter().all(|&c| (c - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_direction_short_term_line_is_fixed() {
        let config = AnalyzerConfig::default();
        let report =
            analyze_autocorrelation(&[constant_interval(45.0, 600)], Signal::Direction, &config)
                .unwrap();
        assert_eq!(report.short_term_line.len(), 50);
        assert_eq!(report.short_term_line[0], 1.0);
    }

    #[test]
    fn test_no_intervals_gives_zero_curve() {
        let report =
            analyze_autocorrelation(&[], Signal::Speed, &AnalyzerConfig::default()).unwrap();
        assert_eq!(report.intervals, 0);
        assert!(report.curve.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_scan_reports_every_sector() {
        // Two hours of steady wind from 100 degrees, one reading per second
        let source: MemoryWindSource = (0..7_200)
            .map(|s| WindRecord::new(s * 1_000, 100, 120 + (s % 7) as i32))
            .collect();
        let range = Interval::new(0, 7_200_000).unwrap();
        let scan = scan_directions(&source, &range, None, None, &AnalyzerConfig::default()).unwrap();

        assert_eq!(scan.long_term_offsets.len(), 18);
        assert_eq!(scan.long_term_offsets.x[5], 100.0);
        for (i, offset) in scan.long_term_offsets.y.iter().enumerate() {
            if i == 5 {
                assert!(
                    offset.is_finite() && *offset != 0.0,
                    "sector 100-120 should fit, got {offset}"
                );
            } else {
                assert_eq!(*offset, 0.0, "sector {i} has no data");
                assert_eq!(scan.characteristic_times.y[i], 0.0);
            }
        }
    }
}
