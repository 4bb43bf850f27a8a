// SPDX-License-Identifier: GPL-3.0-only

//! Duplicate suppression for decoded payloads
//!
//! Several consecutive frames usually contain the same physical code. A
//! decode is accepted when its text differs from the last accepted text, or
//! when the debounce window has elapsed since that acceptance. Anything else
//! is dropped without touching the state.

use crate::frame_processor::ScanResult;

#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    window_ms: u64,
    last_text: Option<String>,
    last_accepted_ms: i64,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_text: None,
            last_accepted_ms: 0,
        }
    }

    /// Text of the last accepted decode
    pub fn last_text(&self) -> Option<&str> {
        self.last_text.as_deref()
    }

    /// Would a decode of `text` at `now_ms` be accepted?
    pub fn admits(&self, text: &str, now_ms: i64) -> bool {
        match self.last_text.as_deref() {
            Some(last) if last == text => {
                let window = i64::try_from(self.window_ms).unwrap_or(i64::MAX);
                now_ms.saturating_sub(self.last_accepted_ms) >= window
            }
            _ => true,
        }
    }

    /// Accept a decode, returning the scan event to publish
    pub fn accept(
        &mut self,
        text: String,
        format: Option<String>,
        now_ms: i64,
    ) -> Option<ScanResult> {
        if !self.admits(&text, now_ms) {
            return None;
        }
        self.last_text = Some(text.clone());
        self.last_accepted_ms = now_ms;
        Some(ScanResult::new(text, format, now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qr() -> Option<String> {
        Some("qr_code".to_string())
    }

    #[test]
    fn test_identical_text_inside_window_is_dropped() {
        let mut debouncer = Debouncer::new(800);
        assert!(debouncer.accept("ABC123".into(), qr(), 1_000).is_some());
        assert!(debouncer.accept("ABC123".into(), qr(), 1_080).is_none());
        assert!(debouncer.accept("ABC123".into(), qr(), 1_799).is_none());
        // Drops leave the acceptance time untouched
        assert!(debouncer.accept("ABC123".into(), qr(), 1_800).is_some());
    }

    #[test]
    fn test_window_boundary_is_accepted() {
        let mut debouncer = Debouncer::new(800);
        debouncer.accept("X".into(), None, 0);
        assert!(!debouncer.admits("X", 799));
        assert!(debouncer.admits("X", 800));
    }

    #[test]
    fn test_huge_window_still_suppresses_duplicates() {
        let mut debouncer = Debouncer::new(u64::MAX);
        assert!(debouncer.accept("A".into(), None, 1_000).is_some());
        assert!(debouncer.accept("A".into(), None, 1_001).is_none());
        assert!(debouncer.accept("A".into(), None, i64::MAX).is_none());
        assert!(debouncer.accept("B".into(), None, 1_002).is_some());
    }

    #[test]
    fn test_distinct_text_always_accepted() {
        let mut debouncer = Debouncer::new(800);
        assert!(debouncer.accept("A".into(), None, 10).is_some());
        assert!(debouncer.accept("B".into(), None, 11).is_some());
        assert!(debouncer.accept("A".into(), None, 12).is_some());
        assert_eq!(debouncer.last_text(), Some("A"));
    }

    #[test]
    fn test_accepted_result_carries_timestamp_and_format() {
        let mut debouncer = Debouncer::new(0);
        let result = debouncer.accept("9001".into(), qr(), 42).unwrap();
        assert_eq!(result, ScanResult::new("9001", qr(), 42));
    }
}
