//! Export document for all connection logs.

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::record::ConnectionId;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExportEntry {
    pub url: String,
    pub log: String,
}

/// Logs of every tracked connection, keyed `"Connection {id}"` in tracked order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogExport {
    entries: Vec<(ConnectionId, ExportEntry)>,
}

impl LogExport {
    pub fn push(&mut self, id: ConnectionId, entry: ExportEntry) {
        self.entries.push((id, entry));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// File name the export is saved under, e.g. `websocket_logs_2024-05-01.json`.
    pub fn file_name(date: NaiveDate) -> String {
        format!("websocket_logs_{}.json", date.format("%Y-%m-%d"))
    }
}

impl Serialize for LogExport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, entry) in &self.entries {
            map.serialize_entry(&format!("Connection {}", id), entry)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_tracked_order() {
        let mut export = LogExport::default();
        for id in [10, 2] {
            export.push(
                ConnectionId(id),
                ExportEntry {
                    url: format!("ws://h/{}", id),
                    log: String::new(),
                },
            );
        }

        let json = serde_json::to_string(&export).unwrap();
        assert_eq!(
            json,
            r#"{"Connection 10":{"url":"ws://h/10","log":""},"Connection 2":{"url":"ws://h/2","log":""}}"#
        );
    }

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(LogExport::file_name(date), "websocket_logs_2024-05-01.json");
    }
}
