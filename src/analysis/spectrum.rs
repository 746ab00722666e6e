//! Averaged wind speed spectra.

use std::borrow::Cow;
use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use super::intervals::WindFilter;
use crate::config::defaults::{
    SPECTRUM_DISPLAY_MAX_FREQUENCY, SPECTRUM_DISPLAY_MIN_FREQUENCY_NUMERATOR, SPECTRUM_PEAK_COUNT,
};
use crate::config::AnalyzerConfig;
use crate::processing::{
    average_logarithmic, average_spectra, find_dominant_frequencies, interval_window_size,
    spectrum_curve, spectrum_rms, AnalysisError, SpectrumProcessor,
};
use crate::types::{ChartCurve, IntervalWithSamples};

/// Frequency window to display (Hz).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencyRange {
    pub from: f64,
    pub to: f64,
}

/// Averaged amplitude spectrum of one or more intervals.
#[derive(Debug, Clone, Serialize)]
pub struct SpectrumReport {
    /// Intervals that contributed a spectrum
    pub intervals: usize,
    /// FFT window in seconds
    pub window_size: usize,
    /// Leading bins of the averaged spectrum, `x` in Hz
    pub curve: ChartCurve,
    /// `curve` bucket-averaged for display
    pub averaged_curve: ChartCurve,
    /// Strongest local maxima of `curve` as `(frequency, amplitude)`
    pub dominant_frequencies: Vec<(f64, f64)>,
    pub rms: f64,
    /// Suggested display window, only when a speed range was filtered on
    pub display_range: Option<FrequencyRange>,
}

/// Spectrum of every interval with samples, averaged bin by bin.
///
/// Filtered sub-intervals keep their own duration as the window so that
/// equal steps share one. Without a filter the single interval is clipped
/// to the span of its samples first, so a wide query range does not pad the
/// data with held values. One transform is planned per window size.
///
/// Fails with [`AnalysisError::NoData`] when no interval has samples and with
/// [`AnalysisError::LengthMismatch`] when intervals need different windows.
pub fn analyze_spectrum(
    intervals: &[IntervalWithSamples],
    filter: &WindFilter,
    config: &AnalyzerConfig,
) -> Result<SpectrumReport, AnalysisError> {
    let clip = !filter.is_active();
    let prepared: Vec<Cow<'_, IntervalWithSamples>> = intervals
        .iter()
        .filter(|data| !data.samples.is_empty())
        .map(|data| {
            if clip {
                Cow::Owned(data.clipped_to_samples())
            } else {
                Cow::Borrowed(data)
            }
        })
        .collect();
    if prepared.is_empty() {
        return Err(AnalysisError::NoData(
            "no interval contains wind samples".to_string(),
        ));
    }

    let mut processors: BTreeMap<usize, SpectrumProcessor> = BTreeMap::new();
    for data in &prepared {
        processors
            .entry(interval_window_size(data))
            .or_insert_with_key(|&size| SpectrumProcessor::new(size));
    }
    tracing::debug!(
        intervals = prepared.len(),
        windows = ?processors.keys().collect::<Vec<_>>(),
        "Planned spectrum transforms"
    );

    let spectra: Vec<Vec<f64>> = prepared
        .par_iter()
        .map(|data| {
            processors
                .get(&interval_window_size(data))
                .map(|processor| processor.spectrum(data))
                .unwrap_or_default()
        })
        .collect();

    let averaged = average_spectra(&spectra)?;
    let curve = spectrum_curve(&averaged, config.spectrum.display_fraction);
    let averaged_curve = average_logarithmic(
        &curve,
        config.chart.log_factor,
        config.chart.min_points_per_bucket,
    )?;

    let display_range = filter.has_speed_range().then(|| FrequencyRange {
        from: SPECTRUM_DISPLAY_MIN_FREQUENCY_NUMERATOR
            / config.spectrum.average_interval_millis as f64,
        to: SPECTRUM_DISPLAY_MAX_FREQUENCY,
    });

    let report = SpectrumReport {
        intervals: spectra.len(),
        window_size: averaged.len(),
        dominant_frequencies: find_dominant_frequencies(&curve, SPECTRUM_PEAK_COUNT),
        rms: spectrum_rms(&averaged),
        curve,
        averaged_curve,
        display_range,
    };
    info!(
        intervals = report.intervals,
        window_size = report.window_size,
        rms = report.rms,
        "Spectrum analysed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Interval, Sample};
    use std::f64::consts::PI;

    fn sine_interval(start_s: i64, seconds: i64, period_s: f64) -> IntervalWithSamples {
        let samples = (0..seconds)
            .map(|s| {
                let t = (start_s + s) * 1_000;
                Sample::new(t, 10.0 + (2.0 * PI * s as f64 / period_s).sin())
            })
            .collect();
        IntervalWithSamples::new(
            Interval::new(start_s * 1_000, (start_s + seconds) * 1_000).unwrap(),
            samples,
        )
    }

    #[test]
    fn test_two_intervals_average() {
        let intervals = vec![sine_interval(0, 1_024, 32.0), sine_interval(5_000, 1_024, 32.0)];
        let report = analyze_spectrum(&intervals, &WindFilter::default(), &AnalyzerConfig::default())
            .unwrap();

        assert_eq!(report.intervals, 2);
        assert_eq!(report.window_size, 1_024);
        assert_eq!(report.curve.len(), 512);
        assert!(report.display_range.is_none());
        // The DC bin is excluded from peaks by definition (no left neighbour)
        let (frequency, _) = report.dominant_frequencies[0];
        assert!((frequency - 1.0 / 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_intervals_are_skipped() {
        let empty = IntervalWithSamples::new(Interval::new(0, 1_024_000).unwrap(), Vec::new());
        let intervals = vec![empty.clone(), sine_interval(0, 1_024, 16.0)];
        let report =
            analyze_spectrum(&intervals, &WindFilter::default(), &AnalyzerConfig::default()).unwrap();
        assert_eq!(report.intervals, 1);

        assert!(matches!(
            analyze_spectrum(&[empty], &WindFilter::default(), &AnalyzerConfig::default()),
            Err(AnalysisError::NoData(_))
        ));
    }

    #[test]
    fn test_unfiltered_window_follows_the_samples() {
        let data = sine_interval(0, 1_024, 32.0);
        let wide = IntervalWithSamples::new(
            Interval::new(0, 86_400_000).unwrap(),
            data.samples.clone(),
        );
        let config = AnalyzerConfig::default();

        let tight = analyze_spectrum(&[data], &WindFilter::default(), &config).unwrap();
        let padded = analyze_spectrum(&[wide.clone()], &WindFilter::default(), &config).unwrap();
        assert_eq!(padded.window_size, tight.window_size);
        assert_eq!(padded.curve, tight.curve);

        // A filtered sub-interval keeps its own duration as the window
        let filtered =
            analyze_spectrum(&[wide], &WindFilter::speed(Some(0.0), Some(20.0)), &config).unwrap();
        assert_eq!(filtered.window_size, 131_072);
    }

    #[test]
    fn test_mismatched_windows_fail() {
        let intervals = vec![sine_interval(0, 1_024, 32.0), sine_interval(0, 2_000, 32.0)];
        assert!(matches!(
            analyze_spectrum(&intervals, &WindFilter::default(), &AnalyzerConfig::default()),
            Err(AnalysisError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_display_range_with_speed_filter() {
        let filter = WindFilter::speed(Some(5.0), Some(10.0));
        let report = analyze_spectrum(
            &[sine_interval(0, 256, 8.0)],
            &filter,
            &AnalyzerConfig::default(),
        )
        .unwrap();
        let range = report.display_range.unwrap();
        assert!((range.from - 10_000.0 / 3_600_000.0).abs() < 1e-15);
        assert_eq!(range.to, 0.1);
    }
}
