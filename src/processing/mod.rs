//! Signal processing - resampling, autocorrelation, curve fitting, FFT
//! spectra and chart bucket averaging.
//!
//! Every function here is synchronous and stateless: inputs are borrowed,
//! outputs are freshly allocated.

mod autocorrelation;
mod averaging;
mod fft;
mod fit;
mod resample;

pub use autocorrelation::*;
pub use averaging::*;
pub use fft::*;
pub use fit::*;
pub use resample::*;

use thiserror::Error;

use crate::storage::StorageError;

/// Errors in wind data analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("interval end {end} ms must be larger than or equal to start {start} ms")]
    InvalidInterval { start: i64, end: i64 },

    #[error("array with length {actual} cannot be combined with arrays of length {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("average factor must be larger than 1, got {0}")]
    InvalidAveragingFactor(f64),

    #[error("bucket size must be at least 1")]
    InvalidBucketSize,

    #[error("average interval must be larger than 0 ms, got {0}")]
    InvalidAverageInterval(i64),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("too many intervals: {count} (limit {max})")]
    TooManyIntervals { count: i64, max: i64 },

    #[error("could not parse date '{0}'")]
    InvalidDate(String),

    #[error("no data: {0}")]
    NoData(String),

    #[error("data source error: {0}")]
    Storage(#[from] StorageError),
}
