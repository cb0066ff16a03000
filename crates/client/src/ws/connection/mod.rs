//! Per-socket drivers.
//!
//! This module provides the shared plumbing and conditionally includes
//! the platform-specific implementation.

use futures_channel::mpsc::UnboundedSender;
use socketdeck_core::{ConnectionId, SocketEvent, SocketToken};

use crate::console::ConsoleEvent;

/// Close code reported when a socket drops without a close frame.
pub(crate) const ABNORMAL_CLOSURE: u16 = 1006;

/// Tags socket events with their connection and token.
#[derive(Clone)]
pub(crate) struct EventSink {
    id: ConnectionId,
    socket: SocketToken,
    events: UnboundedSender<ConsoleEvent>,
}

impl EventSink {
    pub(crate) fn new(
        id: ConnectionId,
        socket: SocketToken,
        events: UnboundedSender<ConsoleEvent>,
    ) -> Self {
        Self { id, socket, events }
    }

    pub(crate) fn emit(&self, event: SocketEvent) {
        let event = ConsoleEvent::Socket {
            id: self.id,
            socket: self.socket,
            event,
        };
        if self.events.unbounded_send(event).is_err() {
            crate::log_debug!("[conn {}] console gone, dropping socket event", self.id);
        }
    }

    /// Report a failure followed by the abnormal close that ends the socket.
    pub(crate) fn fail(&self, detail: String) {
        self.emit(SocketEvent::Error(detail));
        self.emit(SocketEvent::Closed {
            code: ABNORMAL_CLOSURE,
            reason: String::new(),
        });
    }
}

// Include platform-specific implementation
#[cfg(target_arch = "wasm32")]
mod connection_wasm;
#[cfg(target_arch = "wasm32")]
pub use connection_wasm::{open, SocketHandle};

#[cfg(not(target_arch = "wasm32"))]
mod connection_native;
#[cfg(not(target_arch = "wasm32"))]
pub use connection_native::{open, SocketHandle};
