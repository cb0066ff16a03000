//! Error types for the connection core.

use thiserror::Error;

use crate::record::ConnectionId;

/// Failure reported by a [`KeyValueStore`](crate::store::KeyValueStore) backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("storage error: {0}")]
pub struct StoreError(pub String);

/// Errors surfaced by console operations.
///
/// Every variant is also written to the affected connection's log before it is
/// returned, so callers are free to ignore it.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] url::ParseError),

    #[error("unsupported scheme '{0}', expected ws or wss")]
    UnsupportedScheme(String),

    #[error("message is blank")]
    BlankMessage,

    #[error("failed to format as JSON: {0}")]
    JsonFormat(#[source] serde_json::Error),

    #[error("socket not connected")]
    NotConnected,

    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("corrupt value under '{key}': {source}")]
    CorruptState {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("token is empty")]
    EmptyToken,

    #[error("no connection identifiers left")]
    IdentifiersExhausted,
}
