//! Connection core for the socketdeck WebSocket console.
//!
//! Tracks any number of independently addressable WebSocket sessions, each
//! with its own reconnect policy, message history and log, and keeps them in
//! sync with a persistent key-value store. The crate is free of I/O: socket
//! and timer work is requested through [`Effect`]s and reported back through
//! [`ConnectionSet::handle_socket_event`] and [`ConnectionSet::handle_timer`].

pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod history;
pub mod log;
pub mod manager;
pub mod record;
pub mod session;
pub mod store;

pub use config::ConsoleConfig;
pub use error::{CoreError, StoreError};
pub use export::{ExportEntry, LogExport};
pub use format::{format_outbound, render_inbound, resolve_target, MessageFormat};
pub use history::{history_label, MessageHistory};
pub use log::ConnectionLog;
pub use manager::{ConnectionEntry, ConnectionSet};
pub use record::{ConnectionId, ConnectionRecord};
pub use session::{
    Effect, SessionState, SocketEvent, SocketToken, TimerKind, TimerToken, TransportSession,
};
pub use store::{KeyValueStore, MemoryStore};
