//! Persistent Wind Record Store
//!
//! Persists [`WindRecord`]s to a sled database.
//!
//! Key: 8-byte order-preserving timestamp followed by an 8-byte unique id,
//! both big-endian, so iteration is chronological and records sharing a
//! timestamp are all kept.
//! Value: JSON-serialized `WindRecord`.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::{average_of, histogram_of, StorageError, WindDataSource};
use crate::types::{Sample, Signal, ValueCount, WindRecord};

/// Order-preserving encoding of a signed timestamp.
fn time_prefix(time_ms: i64) -> [u8; 8] {
    ((time_ms as u64) ^ (1 << 63)).to_be_bytes()
}

fn decode_time(key: &[u8]) -> Option<i64> {
    let prefix: [u8; 8] = key.get(..8)?.try_into().ok()?;
    Some((u64::from_be_bytes(prefix) ^ (1 << 63)) as i64)
}

/// Summary of the stored data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub records: usize,
    pub size_bytes: u64,
    pub first_ms: Option<i64>,
    pub last_ms: Option<i64>,
}

/// Sled-backed wind record store
#[derive(Clone)]
pub struct SledWindStore {
    db: Arc<sled::Db>,
}

impl SledWindStore {
    /// Open or create the store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        tracing::debug!(path = %path_ref.display(), "Wind store opened");
        Ok(Self { db: Arc::new(db) })
    }

    fn record_key(&self, time_ms: i64) -> Result<[u8; 16], StorageError> {
        let id = self.db.generate_id()?;
        let mut key = [0u8; 16];
        key[..8].copy_from_slice(&time_prefix(time_ms));
        key[8..].copy_from_slice(&id.to_be_bytes());
        Ok(key)
    }

    /// Store a single record.
    ///
    /// Does not flush; sled persists in the background.
    pub fn insert(&self, record: &WindRecord) -> Result<(), StorageError> {
        let key = self.record_key(record.time_ms)?;
        let value = serde_json::to_vec(record)?;
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Store many records in one atomic batch and flush.
    pub fn insert_batch(&self, records: &[WindRecord]) -> Result<usize, StorageError> {
        let mut batch = sled::Batch::default();
        for record in records {
            let key = self.record_key(record.time_ms)?;
            batch.insert(&key[..], serde_json::to_vec(record)?);
        }
        self.db.apply_batch(batch)?;
        self.db.flush()?;
        tracing::debug!(count = records.len(), "Stored wind record batch");
        Ok(records.len())
    }

    /// Records with `start <= time < end`, ascending.
    pub fn records_between(&self, start: i64, end: i64) -> Result<Vec<WindRecord>, StorageError> {
        if end <= start {
            return Ok(Vec::new());
        }
        self.db
            .range(time_prefix(start)..time_prefix(end))
            .map(|item| {
                let (_key, value) = item?;
                Ok(serde_json::from_slice::<WindRecord>(&value)?)
            })
            .collect()
    }

    /// Total number of stored records
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Remove every record
    pub fn clear(&self) -> Result<(), StorageError> {
        self.db.clear()?;
        self.db.flush()?;
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats, StorageError> {
        let bounds = self.time_bounds()?;
        Ok(StoreStats {
            records: self.db.len(),
            size_bytes: self.db.size_on_disk().unwrap_or(0),
            first_ms: bounds.map(|(first, _)| first),
            last_ms: bounds.map(|(_, last)| last),
        })
    }
}

impl WindDataSource for SledWindStore {
    fn fetch_ordered_samples(
        &self,
        signal: Signal,
        start: i64,
        end: i64,
    ) -> Result<Vec<Sample>, StorageError> {
        // (start, end] is [start + 1, end + 1) on integer milliseconds
        let records = self.records_between(start.saturating_add(1), end.saturating_add(1))?;
        Ok(records.iter().map(|r| signal.sample(r)).collect())
    }

    fn fetch_average(
        &self,
        signal: Signal,
        start: i64,
        end: i64,
    ) -> Result<Option<f64>, StorageError> {
        let records = self.records_between(start, end)?;
        Ok(average_of(signal, records.iter()))
    }

    fn fetch_value_histogram(
        &self,
        signal: Signal,
        start: i64,
        end: i64,
    ) -> Result<Vec<ValueCount>, StorageError> {
        let records = self.records_between(start, end)?;
        Ok(histogram_of(signal, records.iter()))
    }

    fn time_bounds(&self) -> Result<Option<(i64, i64)>, StorageError> {
        let first = self.db.first()?.and_then(|(key, _)| decode_time(&key));
        let last = self.db.last()?.and_then(|(key, _)| decode_time(&key));
        Ok(first.zip(last))
    }

    fn count(&self, start: i64, end: i64) -> Result<usize, StorageError> {
        if end <= start {
            return Ok(0);
        }
        let mut count = 0;
        for item in self.db.range(time_prefix(start)..time_prefix(end)) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_time_prefix_preserves_order() {
        let times = [i64::MIN, -5_000, -1, 0, 1, 5_000, i64::MAX];
        for pair in times.windows(2) {
            assert!(time_prefix(pair[0]) < time_prefix(pair[1]));
        }
        for t in times {
            assert_eq!(decode_time(&time_prefix(t)), Some(t));
        }
    }

    #[test]
    fn test_store_and_query() {
        let dir = tempdir().unwrap();
        let store = SledWindStore::open(dir.path()).unwrap();

        store
            .insert_batch(&[
                WindRecord::new(3_000, 30, 300),
                WindRecord::new(1_000, 10, 100),
                WindRecord::new(2_000, 20, 200),
            ])
            .unwrap();
        store.insert(&WindRecord::new(2_000, 22, 220)).unwrap();

        assert_eq!(store.len(), 4);
        assert_eq!(store.time_bounds().unwrap(), Some((1_000, 3_000)));

        let samples = store
            .fetch_ordered_samples(Signal::Speed, 1_000, 3_000)
            .unwrap();
        let times: Vec<i64> = samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![2_000, 2_000, 3_000]);

        let avg = store.fetch_average(Signal::Speed, 1_000, 2_000).unwrap();
        assert!((avg.unwrap() - 10.0).abs() < 1e-12);
        assert_eq!(store.count(2_000, 3_000).unwrap(), 2);
    }

    #[test]
    fn test_reopen_persists_records() {
        let dir = tempdir().unwrap();
        {
            let store = SledWindStore::open(dir.path()).unwrap();
            store.insert_batch(&[WindRecord::new(42, 180, 55)]).unwrap();
        }
        let store = SledWindStore::open(dir.path()).unwrap();
        let records = store.records_between(0, 100).unwrap();
        assert_eq!(records, vec![WindRecord::new(42, 180, 55)]);
    }

    #[test]
    fn test_clear_and_stats() {
        let dir = tempdir().unwrap();
        let store = SledWindStore::open(dir.path()).unwrap();
        store.insert(&WindRecord::new(5, 1, 1)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.records, 1);
        assert_eq!(stats.first_ms, Some(5));

        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.stats().unwrap().first_ms, None);
    }
}
