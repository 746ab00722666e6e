//! System-wide default constants.
//!
//! Centralises the numbers that shape every analysis. Grouped by subsystem
//! for easy discovery; the tunable ones are mirrored in [`AnalyzerConfig`].
//!
//! [`AnalyzerConfig`]: super::AnalyzerConfig

// ============================================================================
// Sensor Units
// ============================================================================

/// Stored speed unit in knots (the sensor reports 1/10 knot).
pub const SPEED_KNOTS_PER_UNIT: f64 = 0.1;

/// Full circle of the direction signal (degrees).
pub const FULL_CIRCLE_DEG: f64 = 360.0;

// ============================================================================
// Autocorrelation
// ============================================================================

/// Maximum lag of an autocorrelation curve (seconds).
pub const CORRELATION_LENGTH: usize = 300;

/// Width of the sub-intervals classified by average speed/direction when
/// building autocorrelation intervals (30 minutes).
pub const AUTOCORRELATION_AVERAGE_INTERVAL_MILLIS: i64 = 30 * 60 * 1000;

/// Length of the short-term line drawn for direction correlations (points).
pub const DIRECTION_SHORT_TERM_LINE_LENGTH: usize = 50;

/// Offset of the short-term line drawn for direction correlations.
pub const DIRECTION_SHORT_TERM_OFFSET: f64 = 1.0;

/// Number of sectors in the direction scan.
pub const DIRECTION_SCAN_SECTORS: usize = 18;

/// Width of one sector in the direction scan (degrees).
pub const DIRECTION_SCAN_SECTOR_DEG: f64 = FULL_CIRCLE_DEG / DIRECTION_SCAN_SECTORS as f64;

/// Scale applied to the long-term offset in the direction scan.
pub const SCAN_OFFSET_SCALE: f64 = 100.0;

/// Scale applied to the (negated) long-term slope in the direction scan.
pub const SCAN_SLOPE_SCALE: f64 = 100_000.0;

// ============================================================================
// Curve Fitting
// ============================================================================

/// Starting point `[a, b, c, d]` for the bi-exponential fit.
///
/// Suited to decaying correlations that start near 1. Changing it changes
/// historical results.
pub const FIT_INITIAL_GUESS: [f64; 4] = [0.8, 0.0, -0.05, 0.5];

/// Iteration cap for the least-squares solver.
pub const FIT_MAX_ITERATIONS: usize = 1_000;

// ============================================================================
// Spectrum
// ============================================================================

/// Width of the sub-intervals used for spectra when filtering (60 minutes).
pub const SPECTRUM_AVERAGE_INTERVAL_MILLIS: i64 = 60 * 60 * 1000;

/// Leading fraction of FFT bins kept for display.
///
/// The spectrum of a real signal is symmetric, so half holds everything.
pub const SPECTRUM_DISPLAY_FRACTION: f64 = 0.5;

/// Upper display frequency when a speed filter is active (Hz).
pub const SPECTRUM_DISPLAY_MAX_FREQUENCY: f64 = 0.1;

/// Numerator of the lower display frequency (`value / interval_millis`).
pub const SPECTRUM_DISPLAY_MIN_FREQUENCY_NUMERATOR: f64 = 10_000.0;

/// Number of dominant frequencies reported per spectrum.
pub const SPECTRUM_PEAK_COUNT: usize = 5;

// ============================================================================
// Chart Averaging
// ============================================================================

/// Growth factor of logarithmic chart buckets.
pub const LOG_AVERAGE_FACTOR: f64 = 1.05;

/// Minimum points per logarithmic chart bucket.
pub const LOG_AVERAGE_MIN_POINTS: usize = 5;

// ============================================================================
// Speed Graph
// ============================================================================

/// Number of averaged points in the speed-over-time graph.
pub const SPEED_GRAPH_STEPS: usize = 100;

// ============================================================================
// Histograms
// ============================================================================

/// Speed histogram bucket width (knots). Calm readings get their own bucket.
pub const HISTOGRAM_SPEED_BUCKET_KNOTS: f64 = 1.0;

/// Direction histogram bucket width (degrees).
pub const HISTOGRAM_DIRECTION_BUCKET_DEG: f64 = 20.0;

// ============================================================================
// Interval Selection
// ============================================================================

/// Maximum number of sub-intervals a single selection may examine.
pub const MAX_SELECTION_INTERVALS: i64 = 10_000;

/// Default lower speed bound when filtering (knots).
pub const DEFAULT_SPEED_FROM: f64 = 0.0;

/// Default upper speed bound when filtering (knots).
pub const DEFAULT_SPEED_TO: f64 = 1_000.0;

/// Step of the `find-times` search (10 minutes).
pub const FIND_TIMES_INTERVAL_MILLIS: i64 = 10 * 60 * 1000;

// ============================================================================
// Storage
// ============================================================================

/// Default sled database directory.
pub const DEFAULT_STORAGE_PATH: &str = "wind_data";
