use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::sink::{OutputSink, ProbeContext};

/// One probe captured by a [`ProbeBuffer`]
#[derive(Clone, Debug)]
pub struct ProbeRecord {
    /// Unique sequential ID
    pub id: u64,

    /// When the probe reached the buffer
    pub received_at: DateTime<Utc>,

    /// Level label (`POST` for unconditional posts)
    pub level_name: String,

    /// Emitting namespace
    pub namespace: String,

    /// Fully formatted probe text
    pub text: String,
}

/// Thread-safe ring buffer of formatted probes, usable as an output sink
#[derive(Clone)]
pub struct ProbeBuffer {
    /// Internal storage
    entries: Arc<RwLock<VecDeque<ProbeRecord>>>,

    /// Maximum capacity
    capacity: usize,

    /// Next record ID
    next_id: Arc<AtomicU64>,
}

impl ProbeBuffer {
    /// Create a new probe buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Push a new probe, evicting the oldest if at capacity
    pub fn push(&self, text: &str, context: &ProbeContext) {
        let record = ProbeRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            received_at: Utc::now(),
            level_name: context.level_name.clone(),
            namespace: context.namespace.clone(),
            text: text.to_string(),
        };

        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
    }

    /// Get all records (cloned for rendering)
    pub fn all(&self) -> Vec<ProbeRecord> {
        self.entries.read().iter().cloned().collect()
    }

    /// Get records filtered by a predicate
    pub fn filtered<F>(&self, predicate: F) -> Vec<ProbeRecord>
    where
        F: Fn(&ProbeRecord) -> bool,
    {
        self.entries
            .read()
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// Get record count per level label
    pub fn level_counts(&self) -> LevelCounts {
        let entries = self.entries.read();
        let mut counts = LevelCounts::default();
        for record in entries.iter() {
            *counts.counts.entry(record.level_name.clone()).or_default() += 1;
        }
        counts
    }

    /// Total record count
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Maximum number of records kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all records
    pub fn clear(&self) {
        self.entries.write().clear();
        self.next_id.store(0, Ordering::SeqCst);
    }

    /// Most recent record, if any
    pub fn last(&self) -> Option<ProbeRecord> {
        self.entries.read().back().cloned()
    }
}

impl OutputSink for ProbeBuffer {
    fn emit(&self, probe: &str, context: &ProbeContext) {
        self.push(probe, context);
    }
}

/// Counts per level label
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    counts: BTreeMap<String, usize>,
}

impl LevelCounts {
    /// Count for one level label
    pub fn get(&self, level_name: &str) -> usize {
        self.counts.get(level_name).copied().unwrap_or(0)
    }

    /// Iterate (label, count) pairs in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtree_types::Rank;

    fn ctx(level_name: &str, namespace: &str) -> ProbeContext {
        ProbeContext {
            level: Rank::new(100),
            level_name: level_name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    #[test]
    fn test_evicts_oldest() {
        let buffer = ProbeBuffer::new(2);
        buffer.push("one", &ctx("INFO", "a"));
        buffer.push("two", &ctx("INFO", "a"));
        buffer.push("three", &ctx("INFO", "a"));

        let texts: Vec<String> = buffer.all().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["two", "three"]);
        assert_eq!(buffer.all()[1].id, 2);
    }

    #[test]
    fn test_level_counts() {
        let buffer = ProbeBuffer::new(10);
        buffer.emit("a", &ctx("DEBUG", "x"));
        buffer.emit("b", &ctx("DEBUG", "x"));
        buffer.emit("c", &ctx("ERROR", "y"));

        let counts = buffer.level_counts();
        assert_eq!(counts.get("DEBUG"), 2);
        assert_eq!(counts.get("ERROR"), 1);
        assert_eq!(counts.get("INFO"), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_filtered_last_clear() {
        let buffer = ProbeBuffer::new(10);
        for i in 0..5 {
            let namespace = if i % 2 == 0 { "even" } else { "odd" };
            buffer.push(&i.to_string(), &ctx("INFO", namespace));
        }
        let odd: Vec<String> = buffer
            .filtered(|r| r.namespace == "odd")
            .into_iter()
            .map(|r| r.text)
            .collect();
        assert_eq!(odd, vec!["1", "3"]);
        assert_eq!(buffer.last().unwrap().text, "4");

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.last().is_none());
        buffer.push("again", &ctx("INFO", "a"));
        assert_eq!(buffer.last().unwrap().id, 0);
    }
}
