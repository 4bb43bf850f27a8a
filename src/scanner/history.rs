// SPDX-License-Identifier: GPL-3.0-only

//! Unique scan history
//!
//! Keeps the distinct payloads seen during a scanning run, newest first.
//! Repeated payloads are reported as duplicates and not recorded again.
//! When the history is full the oldest entry is evicted and its payload
//! may be recorded again later.

use crate::constants::history::DEFAULT_CAPACITY;
use crate::frame_processor::ScanResult;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct ScanHistory {
    entries: VecDeque<HistoryEntry>,
    seen: HashSet<String>,
    capacity: usize,
    next_id: u64,
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ScanHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    /// Record a scan; returns `false` for a payload already in the history
    pub fn record(&mut self, result: &ScanResult) -> bool {
        if self.seen.contains(&result.text) {
            return false;
        }

        if self.entries.len() == self.capacity
            && let Some(evicted) = self.entries.pop_back()
        {
            self.seen.remove(&evicted.text);
        }

        self.seen.insert(result.text.clone());
        self.entries.push_front(HistoryEntry {
            id: self.next_id,
            text: result.text.clone(),
            format: result.format.clone(),
            timestamp: result.timestamp,
        });
        self.next_id += 1;
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.seen.contains(text)
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str, ts: i64) -> ScanResult {
        ScanResult::new(text, Some("code_128".to_string()), ts)
    }

    #[test]
    fn test_records_unique_scans_newest_first() {
        let mut history = ScanHistory::default();
        assert!(history.record(&scan("BAG-001", 1)));
        assert!(history.record(&scan("BAG-002", 2)));
        assert!(!history.record(&scan("BAG-001", 3)));

        let texts: Vec<&str> = history.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["BAG-002", "BAG-001"]);
        assert_eq!(history.latest().map(|e| e.id), Some(2));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = ScanHistory::with_capacity(2);
        history.record(&scan("A", 1));
        history.record(&scan("B", 2));
        history.record(&scan("C", 3));

        assert_eq!(history.len(), 2);
        assert!(!history.contains("A"));
        assert!(history.record(&scan("A", 4)));
        assert!(!history.contains("B"));
    }

    #[test]
    fn test_clear() {
        let mut history = ScanHistory::default();
        history.record(&scan("A", 1));
        history.clear();
        assert!(history.is_empty());
        assert!(history.record(&scan("A", 2)));
    }
}
