//! Reading, history, and target state
//!
//! Plain in-memory containers with no synchronization of their own; the
//! controller serializes access. Readings keep only the latest value per
//! key, the history ring keeps a bounded trail of full ingestion batches,
//! and targets are replaced wholesale.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sensor observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

/// Latest reading per sensor key, overwritten on each ingestion
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    latest: HashMap<String, Reading>,
}

impl ReadingStore {
    /// Overwrite entries for every key in the batch; values are taken
    /// as-is, with no plausibility checks. Returns the number of keys.
    pub fn ingest(&mut self, readings: &HashMap<String, f64>) -> usize {
        let observed_at = Utc::now();
        for (key, value) in readings {
            self.latest.insert(
                key.clone(),
                Reading {
                    value: *value,
                    observed_at,
                },
            );
        }
        readings.len()
    }

    /// Latest value for a key, if it has ever reported
    pub fn get(&self, key: &str) -> Option<f64> {
        self.latest.get(key).map(|r| r.value)
    }

    /// Latest full reading for a key
    pub fn reading(&self, key: &str) -> Option<Reading> {
        self.latest.get(key).copied()
    }

    /// Snapshot of all latest values
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.latest.iter().map(|(k, r)| (k.clone(), r.value)).collect()
    }
}

/// One ingestion batch, immutable once appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub readings: HashMap<String, f64>,
}

/// Bounded FIFO ring of ingestion snapshots, oldest first
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// Append a snapshot, evicting the oldest entry beyond capacity
    pub fn append(&mut self, readings: HashMap<String, f64>) {
        self.entries.push_back(HistoryEntry {
            recorded_at: Utc::now(),
            readings,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// At most `limit` most-recent entries, oldest of them first
    ///
    /// `limit` is clamped to `[1, len]`; an empty log yields an empty vec.
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let limit = limit.clamp(1, self.entries.len());
        self.entries
            .iter()
            .skip(self.entries.len() - limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Desired value per sensor key, wholesale-replaceable
///
/// A key with no target is a valid state; the loop skips it.
#[derive(Debug, Clone, Default)]
pub struct TargetStore {
    targets: HashMap<String, f64>,
}

impl TargetStore {
    pub fn new(targets: HashMap<String, f64>) -> Self {
        Self { targets }
    }

    /// Replace the whole profile
    pub fn replace(&mut self, targets: HashMap<String, f64>) {
        self.targets = targets;
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.targets.get(key).copied()
    }

    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.targets.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_latest_wins() {
        let mut store = ReadingStore::default();
        assert_eq!(store.ingest(&batch(&[("co2_ppm", 900.0)])), 1);
        assert_eq!(store.ingest(&batch(&[("co2_ppm", 910.0), ("ph", 6.8)])), 2);
        assert_eq!(store.get("co2_ppm"), Some(910.0));
        assert_eq!(store.get("ph"), Some(6.8));
        assert_eq!(store.get("air_temp_c"), None);
    }

    #[test]
    fn test_out_of_range_values_accepted() {
        let mut store = ReadingStore::default();
        store.ingest(&batch(&[("ph", -40.0), ("humidity_pct", 900.0)]));
        assert_eq!(store.get("ph"), Some(-40.0));
        assert_eq!(store.get("humidity_pct"), Some(900.0));
    }

    #[test]
    fn test_history_eviction_at_capacity() {
        let mut log = HistoryLog::new(1000);
        for i in 0..1001 {
            log.append(batch(&[("co2_ppm", i as f64)]));
        }
        assert_eq!(log.len(), 1000);
        let entries = log.recent(1000);
        assert_eq!(entries.len(), 1000);
        // The very first batch (value 0.0) was evicted; 1..=1000 remain in order
        assert_eq!(entries[0].readings["co2_ppm"], 1.0);
        assert_eq!(entries[999].readings["co2_ppm"], 1000.0);
    }

    #[test]
    fn test_recent_clamps_limit() {
        let mut log = HistoryLog::new(10);
        for i in 0..3 {
            log.append(batch(&[("ph", i as f64)]));
        }
        // limit 0 clamps up to 1, returning only the newest entry
        let one = log.recent(0);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].readings["ph"], 2.0);
        // limit beyond len clamps down
        assert_eq!(log.recent(99).len(), 3);
    }

    #[test]
    fn test_empty_log_is_not_an_error() {
        let log = HistoryLog::new(10);
        assert!(log.recent(5).is_empty());
    }

    #[test]
    fn test_target_wholesale_replace() {
        let mut targets = TargetStore::default();
        targets.replace(batch(&[("co2_ppm", 600.0), ("ph", 6.8)]));
        assert_eq!(targets.get("co2_ppm"), Some(600.0));
        targets.replace(batch(&[("air_temp_c", 24.0)]));
        // Old keys are gone after a wholesale replace
        assert_eq!(targets.get("co2_ppm"), None);
        assert_eq!(targets.get("air_temp_c"), Some(24.0));
    }
}
