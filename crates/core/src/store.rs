//! Persistent key-value contract and the key names the console writes.
//!
//! The store is the only durability mechanism: every mutation that has to
//! survive a reload is written through explicitly. Structural changes always
//! write a complete snapshot (identifier list, counter) because backends offer
//! no atomic append or increment.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::record::ConnectionId;

/// Durable string-to-string storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, used for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Persisted key names.
pub mod keys {
    use super::ConnectionId;

    pub const AUTH_TOKEN: &str = "ws_auth_token";
    pub const CONNECTIONS: &str = "ws_connections";
    pub const COUNTER: &str = "ws_connection_counter";

    pub fn url(id: ConnectionId) -> String {
        format!("wsurl{}", id)
    }

    pub fn log(id: ConnectionId) -> String {
        format!("wslog{}", id)
    }

    pub fn history(id: ConnectionId) -> String {
        format!("ws_msg_history{}", id)
    }

    pub fn auto_reconnect(id: ConnectionId) -> String {
        format!("ws_auto_reconnect{}", id)
    }

    pub fn was_connected(id: ConnectionId) -> String {
        format!("ws_was_connected{}", id)
    }

    /// Every key owned by a single connection.
    pub fn per_connection(id: ConnectionId) -> [String; 5] {
        [
            url(id),
            log(id),
            history(id),
            auto_reconnect(id),
            was_connected(id),
        ]
    }
}

/// Encode a boolean the way it is persisted (`"true"` / `"false"`).
pub fn encode_flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Anything other than the literal `"true"` reads as false.
pub fn decode_flag(value: Option<String>) -> bool {
    value.as_deref() == Some("true")
}
