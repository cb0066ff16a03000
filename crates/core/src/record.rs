//! Connection identifiers and the per-connection record.

use serde::{Deserialize, Serialize};

/// Opaque identifier of one logical WebSocket session.
///
/// Allocated from a persisted, process-wide counter, so an identifier is never
/// handed out twice even across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u32);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-editable settings of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    /// Endpoint address. Only validated when a connect is attempted.
    pub url: String,
    pub auto_reconnect: bool,
    /// Connectedness captured by the last shutdown snapshot.
    pub last_connected: bool,
}

impl ConnectionRecord {
    pub fn new(id: ConnectionId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            auto_reconnect: false,
            last_connected: false,
        }
    }

    /// Whether this connection should be resumed right after a restore.
    pub fn should_resume(&self) -> bool {
        self.auto_reconnect && self.last_connected
    }
}
