//! WebSocket drivers for the connection console.
//!
//! The console core decides *when* a socket opens, sends or closes; this module
//! carries it out on the current platform and reports everything the socket
//! does back as [`ConsoleEvent::Socket`](crate::console::ConsoleEvent) values,
//! tagged with the socket's token so stale reports can be told apart.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │         Console (event loop)             │
//! │   owns ConnectionSet + socket handles    │
//! └──────────────────────────────────────────┘
//!        │ open/send/close        ▲ SocketEvent
//!        ▼                        │
//!   ┌────────────┐  ┌────────────┐  ┌────────────┐
//!   │SocketHandle│  │SocketHandle│  │SocketHandle│
//!   │  (conn 1)  │  │  (conn 2)  │  │  (conn 5)  │
//!   └────────────┘  └────────────┘  └────────────┘
//! ```

mod connection;

pub use connection::{open, SocketHandle};
