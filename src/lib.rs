//! Wind Analyzer: time-series analysis of anemometer data
//!
//! Turns an irregularly sampled wind record (timestamp, speed, direction)
//! into chart-ready analyses.
//!
//! ## Architecture
//!
//! - **Processing**: 1 Hz resampling, speed/direction autocorrelation,
//!   bi-exponential Levenberg-Marquardt fit, FFT spectra, chart averaging
//! - **Storage**: the `WindDataSource` trait with in-memory and sled backends
//!   plus CSV import
//! - **Analysis**: interval selection by average wind and the reports built
//!   from the processing engines
//! - **Config**: TOML-tunable parameters with validation

pub mod analysis;
pub mod config;
pub mod processing;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::AnalyzerConfig;

// Re-export commonly used types
pub use types::{
    ChartCurve, Interval, IntervalWithSamples, Sample, Signal, SignalKind, ValueCount, WindRecord,
};

// Re-export processing entry points
pub use processing::{
    autocorrelation, average_fixed, average_logarithmic, average_spectra, fit, resample,
    spectrum, AnalysisError, FitParameters,
};

// Re-export storage
pub use storage::{MemoryWindSource, SledWindStore, StorageError, WindDataSource};

// Re-export analyses
pub use analysis::{
    analyze_autocorrelation, analyze_spectrum, scan_directions, select_intervals, speed_graph,
    AutocorrelationReport, DirectionScan, SpectrumReport, WindFilter,
};
