//! Bounded, deduplicating, most-recent-first list of sent messages.

use std::collections::VecDeque;

use crate::error::CoreError;

/// Labels longer than this are truncated for display.
const LABEL_MAX: usize = 30;
const LABEL_KEEP: usize = 27;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl MessageHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Decode a persisted history. Entries past `capacity` are dropped from the
    /// tail, duplicates keep their first (most recent) position.
    pub fn from_json(json: &str, capacity: usize, key: &str) -> Result<Self, CoreError> {
        let decoded: Vec<String> =
            serde_json::from_str(json).map_err(|source| CoreError::CorruptState {
                key: key.to_string(),
                source,
            })?;

        let mut history = Self::new(capacity);
        for message in decoded {
            if history.entries.len() >= capacity {
                break;
            }
            if !history.contains(&message) {
                history.entries.push_back(message);
            }
        }
        Ok(history)
    }

    pub fn to_json(&self) -> String {
        // A list of strings always serializes.
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Insert `message` at the front.
    ///
    /// Returns `false` and leaves the ring untouched when the exact message is
    /// already present. Otherwise the oldest entry is evicted once the ring is
    /// over capacity.
    pub fn record(&mut self, message: &str) -> bool {
        if self.contains(message) {
            return false;
        }
        self.entries.push_front(message.to_string());
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
        true
    }

    pub fn contains(&self, message: &str) -> bool {
        self.entries.iter().any(|m| m == message)
    }

    /// Messages, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn front(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Short label for a history entry, as shown in a picker.
pub fn history_label(message: &str) -> String {
    if message.chars().count() > LABEL_MAX {
        let head: String = message.chars().take(LABEL_KEEP).collect();
        format!("{}...", head)
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_record_is_noop() {
        let mut history = MessageHistory::new(10);
        assert!(history.record("ping"));
        assert!(history.record("pong"));
        let before = history.clone();

        assert!(!history.record("ping"));
        assert_eq!(history, before);
        assert_eq!(history.front(), Some("pong"));
    }

    #[test]
    fn eleventh_message_evicts_oldest() {
        let mut history = MessageHistory::new(10);
        for i in 0..10 {
            history.record(&format!("m{}", i));
        }
        assert_eq!(history.len(), 10);

        history.record("m10");

        assert_eq!(history.len(), 10);
        assert_eq!(history.front(), Some("m10"));
        assert!(!history.contains("m0"));
        assert!(history.contains("m1"));
    }

    #[test]
    fn json_keeps_most_recent_first() {
        let mut history = MessageHistory::new(10);
        history.record("a");
        history.record("b");
        assert_eq!(history.to_json(), r#"["b","a"]"#);

        let restored = MessageHistory::from_json(&history.to_json(), 10, "k").unwrap();
        assert_eq!(restored, history);
    }

    #[test]
    fn oversized_or_repeated_persisted_history_is_normalized() {
        let restored = MessageHistory::from_json(r#"["a","b","a","c"]"#, 2, "k").unwrap();
        assert_eq!(restored.to_vec(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn corrupt_json_is_reported_with_key() {
        let err = MessageHistory::from_json("{not json", 10, "ws_msg_history4").unwrap_err();
        match err {
            CoreError::CorruptState { key, .. } => assert_eq!(key, "ws_msg_history4"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn labels_are_truncated_past_thirty_chars() {
        assert_eq!(history_label("short"), "short");
        let exactly = "x".repeat(30);
        assert_eq!(history_label(&exactly), exactly);

        let long = "y".repeat(31);
        let label = history_label(&long);
        assert_eq!(label, format!("{}...", "y".repeat(27)));
    }
}
