//! Snapshot and series merge rules
//!
//! Polling produces replacement snapshots; streaming merges inbound
//! batches into the existing series. Streamed series are kept sorted
//! ascending by timestamp and bounded to the newest
//! [`MAX_STREAM_POINTS`] points per key, so memory stays bounded no
//! matter how long a subscription lives.

use crate::api::TsPoint;

/// Upper bound on stored points per key in streaming mode
pub const MAX_STREAM_POINTS: usize = 500;

/// One keyed series of a feed snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub key: String,
    pub label: String,
    pub values: Vec<TsPoint>,
}

impl DataEntry {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            values: Vec::new(),
        }
    }

    /// Newest point of the series, if any
    pub fn latest(&self) -> Option<&TsPoint> {
        self.values.last()
    }
}

/// The continuously updated value set of one widget's data binding
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedSnapshot {
    pub entries: Vec<DataEntry>,
    pub loading: bool,
    pub error: Option<String>,
}

impl FeedSnapshot {
    pub fn entry(&self, key: &str) -> Option<&DataEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Newest value for a key, parsed as a number when possible
    pub fn latest_f64(&self, key: &str) -> Option<f64> {
        self.entry(key).and_then(|e| e.latest()).and_then(|p| p.as_f64())
    }

    /// Newest raw value for a key
    pub fn latest_value(&self, key: &str) -> Option<&str> {
        self.entry(key)
            .and_then(|e| e.latest())
            .map(|p| p.value.as_str())
    }

    /// First entry's newest value — the single-value widgets' view
    pub fn primary_latest(&self) -> Option<&TsPoint> {
        self.entries.first().and_then(|e| e.latest())
    }

    /// Merge one inbound streamed batch for `key` into this snapshot
    pub fn merge_stream_points(&mut self, key: &str, label: &str, points: Vec<TsPoint>) {
        if points.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.values.extend(points);
                entry.values.sort_by_key(|p| p.ts);
                if entry.values.len() > MAX_STREAM_POINTS {
                    let excess = entry.values.len() - MAX_STREAM_POINTS;
                    entry.values.drain(..excess);
                }
            }
            None => {
                let mut values = points;
                values.sort_by_key(|p| p.ts);
                if values.len() > MAX_STREAM_POINTS {
                    let excess = values.len() - MAX_STREAM_POINTS;
                    values.drain(..excess);
                }
                self.entries.push(DataEntry {
                    key: key.to_string(),
                    label: label.to_string(),
                    values,
                });
            }
        }
    }

    /// Replace this snapshot with a completed polling cycle.
    ///
    /// On a clean cycle the new entries replace everything. When the
    /// cycle raised an error, entries that went missing keep their
    /// previous values — stale-but-present beats blank.
    pub fn apply_cycle(&mut self, entries: Vec<DataEntry>, error: Option<String>) {
        if error.is_some() {
            let mut merged = entries;
            for old in self.entries.drain(..) {
                if !merged.iter().any(|e| e.key == old.key) {
                    merged.push(old);
                }
            }
            self.entries = merged;
        } else {
            self.entries = entries;
        }
        self.error = error;
        self.loading = false;
    }
}
