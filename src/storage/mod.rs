//! Wind Data Storage
//!
//! The analysis core reads wind records only through [`WindDataSource`].
//! Two implementations are provided:
//!
//! - [`MemoryWindSource`]: a sorted in-memory vector (tests, direct CSV use)
//! - [`SledWindStore`]: a persistent sled database keyed by timestamp
//!
//! Range conventions differ per query and match the stored-data queries of
//! the analyses: sample fetches cover `(start, end]`, averages, histograms
//! and counts cover `[start, end)`.

mod csv_import;
mod memory;
mod sled_store;

pub use csv_import::{load_csv, parse_csv_line, read_csv, CsvImport};
pub use memory::MemoryWindSource;
pub use sled_store::{SledWindStore, StoreStats};

use std::collections::BTreeMap;

use statrs::statistics::Statistics;
use thiserror::Error;

use crate::types::{Sample, Signal, ValueCount, WindRecord};

/// Error type for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("CSV error on line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Read access to stored wind records.
pub trait WindDataSource {
    /// Samples of `signal` with `start < time <= end`, ascending by time.
    fn fetch_ordered_samples(
        &self,
        signal: Signal,
        start: i64,
        end: i64,
    ) -> Result<Vec<Sample>, StorageError>;

    /// Mean of `signal` over `start <= time < end`, `None` without records.
    fn fetch_average(&self, signal: Signal, start: i64, end: i64)
        -> Result<Option<f64>, StorageError>;

    /// Occurrences of each stored value of `signal` over `start <= time < end`,
    /// ascending by value.
    fn fetch_value_histogram(
        &self,
        signal: Signal,
        start: i64,
        end: i64,
    ) -> Result<Vec<ValueCount>, StorageError>;

    /// Timestamps of the first and last stored record.
    fn time_bounds(&self) -> Result<Option<(i64, i64)>, StorageError>;

    /// Number of records with `start <= time < end`.
    fn count(&self, start: i64, end: i64) -> Result<usize, StorageError>;
}

// ============================================================================
// Shared Query Helpers
// ============================================================================

/// Mean of `signal` over the records, in the analysable unit.
///
/// Direction is averaged arithmetically, like the stored-data queries.
pub(crate) fn average_of<'a>(
    signal: Signal,
    records: impl Iterator<Item = &'a WindRecord>,
) -> Option<f64> {
    let values: Vec<f64> = records.map(|r| signal.value(r)).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Histogram of the raw stored values of `signal`, ascending.
pub(crate) fn histogram_of<'a>(
    signal: Signal,
    records: impl Iterator<Item = &'a WindRecord>,
) -> Vec<ValueCount> {
    let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
    for record in records {
        *counts.entry(signal.raw_value(record)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(raw, count)| ValueCount {
            value: signal.scale_raw(f64::from(raw)),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_empty_is_none() {
        assert_eq!(average_of(Signal::Speed, std::iter::empty()), None);
    }

    #[test]
    fn test_average_converts_speed_to_knots() {
        let records = [WindRecord::new(0, 90, 100), WindRecord::new(1, 270, 200)];
        let speed = average_of(Signal::Speed, records.iter()).unwrap();
        let direction = average_of(Signal::Direction, records.iter()).unwrap();
        assert!((speed - 15.0).abs() < 1e-12);
        assert!((direction - 180.0).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_groups_raw_values() {
        let records = [
            WindRecord::new(0, 10, 55),
            WindRecord::new(1, 10, 50),
            WindRecord::new(2, 20, 55),
        ];
        let speed = histogram_of(Signal::Speed, records.iter());
        assert_eq!(speed.len(), 2);
        assert!((speed[0].value - 5.0).abs() < 1e-12);
        assert_eq!(speed[0].count, 1);
        assert!((speed[1].value - 5.5).abs() < 1e-12);
        assert_eq!(speed[1].count, 2);

        let direction = histogram_of(Signal::Direction, records.iter());
        assert_eq!(
            direction,
            vec![
                ValueCount { value: 10.0, count: 2 },
                ValueCount { value: 20.0, count: 1 },
            ]
        );
    }
}
