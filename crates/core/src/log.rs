//! Per-connection, append-only text log.

use chrono::{Local, NaiveTime};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionLog {
    text: String,
    max_bytes: Option<usize>,
}

impl ConnectionLog {
    pub fn new(max_bytes: Option<usize>) -> Self {
        Self {
            text: String::new(),
            max_bytes,
        }
    }

    /// Restore a log from its persisted text.
    pub fn restore(text: String, max_bytes: Option<usize>) -> Self {
        let mut log = Self { text, max_bytes };
        log.enforce_cap();
        log
    }

    /// Append a line stamped with the current local time.
    pub fn append(&mut self, message: &str) {
        self.append_at(Local::now().time(), message);
    }

    pub fn append_at(&mut self, at: NaiveTime, message: &str) {
        self.text.push('[');
        self.text.push_str(&at.format("%H:%M:%S").to_string());
        self.text.push_str("] ");
        self.text.push_str(message);
        self.text.push('\n');
        self.enforce_cap();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Drop whole lines from the front until the log fits the cap. The
    /// newest line is always kept, even when it alone exceeds the cap.
    fn enforce_cap(&mut self) {
        let Some(max) = self.max_bytes else {
            return;
        };
        while self.text.len() > max {
            match self.text.find('\n') {
                Some(pos) if pos + 1 < self.text.len() => {
                    self.text.drain(..=pos);
                }
                _ => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 5).unwrap()
    }

    #[test]
    fn lines_are_timestamped() {
        let mut log = ConnectionLog::new(None);
        log.append_at(noon(), "🟢 Connected successfully");
        assert_eq!(log.as_str(), "[12:00:05] 🟢 Connected successfully\n");
    }

    #[test]
    fn unbounded_by_default() {
        let mut log = ConnectionLog::new(None);
        for i in 0..1000 {
            log.append_at(noon(), &format!("line {}", i));
        }
        assert_eq!(log.lines().count(), 1000);
    }

    #[test]
    fn cap_drops_oldest_lines() {
        let mut log = ConnectionLog::new(Some(40));
        log.append_at(noon(), "first");
        log.append_at(noon(), "second");
        log.append_at(noon(), "third");

        assert!(log.as_str().len() <= 40);
        assert!(!log.as_str().contains("first"));
        assert!(log.as_str().ends_with("third\n"));
    }

    #[test]
    fn newest_line_survives_a_tiny_cap() {
        let mut log = ConnectionLog::new(Some(20));
        log.append_at(noon(), "earlier");
        log.append_at(noon(), "🔴 Connection closed (code: 1006, reason: none)");

        assert_eq!(
            log.as_str(),
            "[12:00:05] 🔴 Connection closed (code: 1006, reason: none)\n"
        );
    }

    #[test]
    fn restore_keeps_last_line_over_cap() {
        let text = "[01:02:03] a\n[01:02:04] longer line\n".to_string();
        let log = ConnectionLog::restore(text, Some(5));
        assert_eq!(log.as_str(), "[01:02:04] longer line\n");
    }

    #[test]
    fn restore_keeps_text_verbatim() {
        let log = ConnectionLog::restore("[01:02:03] hi\n".to_string(), None);
        assert_eq!(log.as_str(), "[01:02:03] hi\n");
    }
}
