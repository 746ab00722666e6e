//! In-memory wind data source.

use super::{average_of, histogram_of, StorageError, WindDataSource};
use crate::types::{Sample, Signal, ValueCount, WindRecord};

/// Wind records held in a vector sorted by time.
///
/// Records with equal timestamps keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryWindSource {
    records: Vec<WindRecord>,
}

impl MemoryWindSource {
    pub fn new(mut records: Vec<WindRecord>) -> Self {
        records.sort_by_key(|r| r.time_ms);
        Self { records }
    }

    pub fn records(&self) -> &[WindRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record, keeping the vector sorted.
    pub fn push(&mut self, record: WindRecord) {
        let at = self.records.partition_point(|r| r.time_ms <= record.time_ms);
        self.records.insert(at, record);
    }

    /// Records with `start <= time < end`.
    fn half_open(&self, start: i64, end: i64) -> &[WindRecord] {
        let lo = self.records.partition_point(|r| r.time_ms < start);
        let hi = self.records.partition_point(|r| r.time_ms < end).max(lo);
        &self.records[lo..hi]
    }

    /// Records with `start < time <= end`.
    fn left_open(&self, start: i64, end: i64) -> &[WindRecord] {
        let lo = self.records.partition_point(|r| r.time_ms <= start);
        let hi = self.records.partition_point(|r| r.time_ms <= end).max(lo);
        &self.records[lo..hi]
    }
}

impl FromIterator<WindRecord> for MemoryWindSource {
    fn from_iter<I: IntoIterator<Item = WindRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl WindDataSource for MemoryWindSource {
    fn fetch_ordered_samples(
        &self,
        signal: Signal,
        start: i64,
        end: i64,
    ) -> Result<Vec<Sample>, StorageError> {
        Ok(self
            .left_open(start, end)
            .iter()
            .map(|r| signal.sample(r))
            .collect())
    }

    fn fetch_average(
        &self,
        signal: Signal,
        start: i64,
        end: i64,
    ) -> Result<Option<f64>, StorageError> {
        Ok(average_of(signal, self.half_open(start, end).iter()))
    }

    fn fetch_value_histogram(
        &self,
        signal: Signal,
        start: i64,
        end: i64,
    ) -> Result<Vec<ValueCount>, StorageError> {
        Ok(histogram_of(signal, self.half_open(start, end).iter()))
    }

    fn time_bounds(&self) -> Result<Option<(i64, i64)>, StorageError> {
        Ok(match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.time_ms, last.time_ms)),
            _ => None,
        })
    }

    fn count(&self, start: i64, end: i64) -> Result<usize, StorageError> {
        Ok(self.half_open(start, end).len())
    }
}
