//! FFT amplitude spectra using rustfft
//!
//! Wind records are resampled at 1 Hz onto a window padded up to the next
//! power of two, transformed with an unnormalized forward FFT, and reduced
//! to the magnitude of every bin. Spectra of several intervals are averaged
//! bin by bin, which requires every interval to produce the same window.
//!
//! # Example
//!
//! ```ignore
//! use wind_analyzer::processing::{average_spectra, spectrum};
//!
//! let spectra: Vec<Vec<f64>> = intervals.iter().map(spectrum).collect();
//! let mean = average_spectra(&spectra)?;
//! ```

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::resample::resample;
use super::AnalysisError;
use crate::types::{ChartCurve, IntervalWithSamples};

/// FFT window for a duration in whole seconds: the next power of two
/// `>= duration`, with a minimum of 1.
pub fn fft_window_size(duration_secs: i64) -> usize {
    usize::try_from(duration_secs)
        .unwrap_or(0)
        .max(1)
        .next_power_of_two()
}

// ============================================================================
// Spectrum Processor (pre-planned for repeated use)
// ============================================================================

/// FFT processor with a pre-planned forward transform.
///
/// Use this when computing many spectra of the same window size.
pub struct SpectrumProcessor {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
}

impl SpectrumProcessor {
    /// Create a processor for `size` bins (rounded up to a power of two).
    pub fn new(size: usize) -> Self {
        let actual_size = size.max(1).next_power_of_two();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(actual_size);
        Self {
            fft,
            size: actual_size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Magnitude of every bin of the forward transform of `signal`.
    ///
    /// `signal` must be exactly `size()` long; the result is symmetric about
    /// its midpoint for real input.
    pub fn amplitudes(&self, signal: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        if signal.len() != self.size {
            return Err(AnalysisError::LengthMismatch {
                expected: self.size,
                actual: signal.len(),
            });
        }

        let mut buffer: Vec<Complex<f64>> =
            signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.fft.process(&mut buffer);

        Ok(buffer.iter().map(|c| c.norm()).collect())
    }

    /// Amplitude spectrum of `data` resampled onto this processor's window.
    ///
    /// The window is not derived from the interval here, so callers pick it
    /// (see [`interval_window_size`]). No samples yields an empty spectrum.
    pub fn spectrum(&self, data: &IntervalWithSamples) -> Vec<f64> {
        let Some(signal) = resample(data, self.size) else {
            tracing::debug!(interval = %data.interval, "No samples for spectrum");
            return Vec::new();
        };
        // Length always matches: the signal was resampled onto this window
        self.amplitudes(&signal).unwrap_or_default()
    }
}

// ============================================================================
// Spectrum Functions
// ============================================================================

/// FFT window of one interval: its duration padded to a power of two.
pub fn interval_window_size(data: &IntervalWithSamples) -> usize {
    fft_window_size(data.interval.duration_secs())
}

/// Amplitude spectrum of one interval.
///
/// Plans a fresh transform; use [`SpectrumProcessor::spectrum`] when many
/// intervals share a window. An interval without samples yields an empty
/// spectrum.
pub fn spectrum(data: &IntervalWithSamples) -> Vec<f64> {
    SpectrumProcessor::new(interval_window_size(data)).spectrum(data)
}

/// Bin-wise mean of several spectra.
///
/// All spectra must have the same length; a mismatch means the intervals had
/// different window sizes and is reported rather than truncated.
pub fn average_spectra(spectra: &[Vec<f64>]) -> Result<Vec<f64>, AnalysisError> {
    let Some((first, rest)) = spectra.split_first() else {
        return Ok(Vec::new());
    };

    let mut sum = first.clone();
    for other in rest {
        if other.len() != sum.len() {
            return Err(AnalysisError::LengthMismatch {
                expected: sum.len(),
                actual: other.len(),
            });
        }
        for (acc, value) in sum.iter_mut().zip(other) {
            *acc += value;
        }
    }

    let n = spectra.len() as f64;
    for acc in &mut sum {
        *acc /= n;
    }
    Ok(sum)
}

/// Leading `fraction` of a spectrum as a chart curve with `x = i / n` (Hz).
pub fn spectrum_curve(amplitudes: &[f64], fraction: f64) -> ChartCurve {
    let n = amplitudes.len();
    let displayed = ((n as f64 * fraction.clamp(0.0, 1.0)).floor() as usize).min(n);

    let mut curve = ChartCurve::with_capacity(displayed);
    for (i, &amplitude) in amplitudes.iter().take(displayed).enumerate() {
        curve.push(i as f64 / n as f64, amplitude);
    }
    curve
}

/// Root mean square of the amplitudes.
pub fn spectrum_rms(amplitudes: &[f64]) -> f64 {
    if amplitudes.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = amplitudes.iter().map(|m| m * m).sum();
    (sum_squares / amplitudes.len() as f64).sqrt()
}

/// Find dominant frequencies in a spectrum curve using true peak detection.
///
/// Identifies local maxima (amplitude higher than both neighbours), then
/// returns the top `n_peaks` as `(frequency, amplitude)` sorted by amplitude
/// descending.
pub fn find_dominant_frequencies(curve: &ChartCurve, n_peaks: usize) -> Vec<(f64, f64)> {
    if curve.len() < 3 {
        return curve.points().collect();
    }

    let mut peaks: Vec<(f64, f64)> = curve
        .y
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, w)| (curve.x[i + 1], w[1]))
        .collect();

    peaks.sort_by(|a, b| b.1.total_cmp(&a.1));
    peaks.truncate(n_peaks);
    peaks
}

// ============================================================================
// Tests
// ============================================================================
