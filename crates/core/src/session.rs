//! Per-connection transport state machine.
//!
//! A [`TransportSession`] never touches a socket or a timer itself. It records
//! which socket and which timer are current, and asks the driver to act by
//! pushing [`Effect`]s into an [`Outbox`]. Every socket and timer carries a
//! fresh token; events that arrive with a token that is no longer current are
//! stale and cannot start a reconnect or a connect.

use std::time::Duration;

use url::Url;

use crate::error::CoreError;
use crate::format::render_inbound;
use crate::log::ConnectionLog;
use crate::record::ConnectionId;

/// Close code sent for a user initiated disconnect.
pub const NORMAL_CLOSURE: u16 = 1000;
pub const USER_DISCONNECT_REASON: &str = "User initiated disconnect";
const REPLACED_REASON: &str = "Replaced by new connection";

/// Identifies one socket instance opened by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketToken(pub u64);

/// Identifies one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Recurring retry after an unexpected close.
    Reconnect,
    /// One-shot resume of a connection that was live at the last shutdown.
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    ReconnectPending,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "Disconnected",
            SessionState::Connecting => "Connecting",
            SessionState::Connected => "Connected",
            SessionState::ReconnectPending => "Reconnecting",
        }
    }
}

/// Side effect the driver has to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenSocket {
        id: ConnectionId,
        socket: SocketToken,
        url: Url,
    },
    SendFrame {
        id: ConnectionId,
        socket: SocketToken,
        frame: String,
    },
    CloseSocket {
        id: ConnectionId,
        socket: SocketToken,
        code: u16,
        reason: String,
    },
    StartTimer {
        id: ConnectionId,
        timer: TimerToken,
        kind: TimerKind,
        delay: Duration,
        repeat: bool,
    },
    CancelTimer {
        id: ConnectionId,
        timer: TimerToken,
    },
}

/// Something a socket reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Text(String),
    Binary(usize),
    Closed { code: u16, reason: String },
    Error(String),
}

/// Pending effects plus the token allocator shared by all sessions.
#[derive(Debug, Default)]
pub struct Outbox {
    effects: Vec<Effect>,
    next_token: u64,
}

impl Outbox {
    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn drain(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    fn next(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn socket_token(&mut self) -> SocketToken {
        SocketToken(self.next())
    }

    fn timer_token(&mut self) -> TimerToken {
        TimerToken(self.next())
    }
}

#[derive(Debug, Clone, Copy)]
struct LiveSocket {
    token: SocketToken,
    open: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    token: TimerToken,
    kind: TimerKind,
}

/// Reconnect policy applied when the live socket goes away.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub interval: Duration,
}

#[derive(Debug)]
pub struct TransportSession {
    id: ConnectionId,
    socket: Option<LiveSocket>,
    /// Sockets we asked to close whose close event is still expected.
    retired: Vec<SocketToken>,
    timer: Option<PendingTimer>,
}

impl TransportSession {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            socket: None,
            retired: Vec::new(),
            timer: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        match (self.socket, self.timer) {
            (Some(socket), _) if socket.open => SessionState::Connected,
            (Some(_), _) => SessionState::Connecting,
            (None, Some(_)) => SessionState::ReconnectPending,
            (None, None) => SessionState::Disconnected,
        }
    }

    pub fn socket(&self) -> Option<SocketToken> {
        self.socket.map(|s| s.token)
    }

    pub fn pending_timer(&self) -> Option<(TimerToken, TimerKind)> {
        self.timer.map(|t| (t.token, t.kind))
    }

    /// Start a connect attempt against `target`.
    ///
    /// Any pending timer is cancelled and any live socket is closed first, so
    /// a session never holds more than one socket or timer.
    pub fn connect(
        &mut self,
        target: Result<Url, CoreError>,
        log: &mut ConnectionLog,
        out: &mut Outbox,
    ) -> Result<SocketToken, CoreError> {
        self.cancel_timer(out);
        self.retire_socket(NORMAL_CLOSURE, REPLACED_REASON, out);

        let url = match target {
            Ok(url) => url,
            Err(e) => {
                log.append(&format!("❌ Error: {}", e));
                return Err(e);
            }
        };

        let token = out.socket_token();
        tracing::debug!(id = %self.id, socket = token.0, %url, "opening socket");
        out.push(Effect::OpenSocket {
            id: self.id,
            socket: token,
            url,
        });
        self.socket = Some(LiveSocket { token, open: false });
        Ok(token)
    }

    /// User initiated disconnect.
    pub fn disconnect(&mut self, log: &mut ConnectionLog, out: &mut Outbox) {
        self.cancel_timer(out);
        if !self.retire_socket(NORMAL_CLOSURE, USER_DISCONNECT_REASON, out) {
            log.append("⚠️ No active connection to disconnect");
        }
    }

    /// Tear down everything the session owns without logging.
    pub fn release(&mut self, out: &mut Outbox) {
        self.cancel_timer(out);
        self.retire_socket(NORMAL_CLOSURE, USER_DISCONNECT_REASON, out);
    }

    /// Queue a frame on the open socket.
    pub fn send(
        &mut self,
        frame: String,
        log: &mut ConnectionLog,
        out: &mut Outbox,
    ) -> Result<(), CoreError> {
        match self.socket {
            Some(LiveSocket { token, open: true }) => {
                log.append(&format!("📤 {}", frame));
                out.push(Effect::SendFrame {
                    id: self.id,
                    socket: token,
                    frame,
                });
                Ok(())
            }
            _ => {
                log.append("⚠️ Socket not connected. Message not sent.");
                Err(CoreError::NotConnected)
            }
        }
    }

    /// Schedule a one-shot connect after `delay`.
    pub fn schedule_resume(&mut self, delay: Duration, out: &mut Outbox) {
        self.cancel_timer(out);
        self.start_timer(TimerKind::Resume, delay, false, out);
    }

    /// Apply a socket event. Returns `true` when the event belonged to this
    /// session's current or retired socket.
    pub fn on_socket_event(
        &mut self,
        socket: SocketToken,
        event: SocketEvent,
        policy: ReconnectPolicy,
        log: &mut ConnectionLog,
        out: &mut Outbox,
    ) -> bool {
        let current = self.socket.filter(|s| s.token == socket);

        if current.is_none() {
            return self.on_retired_event(socket, event, log);
        }

        match event {
            SocketEvent::Opened => {
                self.socket = Some(LiveSocket {
                    token: socket,
                    open: true,
                });
                log.append("🟢 Connected successfully");
            }
            SocketEvent::Text(text) => {
                log.append(&format!("📩 {}", render_inbound(&text)));
            }
            SocketEvent::Binary(len) => {
                log.append(&format!("📩 <binary {} bytes>", len));
            }
            SocketEvent::Closed { code, reason } => {
                self.socket = None;
                log.append(&close_line(code, &reason));
                self.apply_policy(policy, log, out);
            }
            SocketEvent::Error(detail) => {
                tracing::warn!(id = %self.id, socket = socket.0, %detail, "socket error");
                // The close that follows an error is only logged.
                self.socket = None;
                self.retired.push(socket);
                log.append("❌ Connection error occurred");
                self.apply_policy(policy, log, out);
            }
        }
        true
    }

    /// A timer fired. Returns its kind when it is the current timer, in which
    /// case the caller must start a connect attempt.
    pub fn on_timer(&mut self, timer: TimerToken, log: &mut ConnectionLog) -> Option<TimerKind> {
        let pending = self.timer.filter(|t| t.token == timer)?;
        match pending.kind {
            TimerKind::Reconnect => {
                // Left in place: the connect that follows cancels it.
                log.append("🔄 Reconnecting...");
            }
            TimerKind::Resume => {
                self.timer = None;
            }
        }
        Some(pending.kind)
    }

    fn on_retired_event(
        &mut self,
        socket: SocketToken,
        event: SocketEvent,
        log: &mut ConnectionLog,
    ) -> bool {
        let Some(pos) = self.retired.iter().position(|t| *t == socket) else {
            tracing::debug!(id = %self.id, socket = socket.0, "ignoring event from unknown socket");
            return false;
        };
        if let SocketEvent::Closed { code, reason } = event {
            self.retired.remove(pos);
            log.append(&close_line(code, &reason));
        }
        true
    }

    fn apply_policy(&mut self, policy: ReconnectPolicy, log: &mut ConnectionLog, out: &mut Outbox) {
        if !policy.enabled || self.timer.is_some() {
            return;
        }
        log.append(&format!(
            "⏱️ Attempting to reconnect in {} seconds...",
            policy.interval.as_secs()
        ));
        self.start_timer(TimerKind::Reconnect, policy.interval, true, out);
    }

    fn start_timer(&mut self, kind: TimerKind, delay: Duration, repeat: bool, out: &mut Outbox) {
        let token = out.timer_token();
        out.push(Effect::StartTimer {
            id: self.id,
            timer: token,
            kind,
            delay,
            repeat,
        });
        self.timer = Some(PendingTimer { token, kind });
    }

    fn cancel_timer(&mut self, out: &mut Outbox) {
        if let Some(timer) = self.timer.take() {
            out.push(Effect::CancelTimer {
                id: self.id,
                timer: timer.token,
            });
        }
    }

    fn retire_socket(&mut self, code: u16, reason: &str, out: &mut Outbox) -> bool {
        let Some(socket) = self.socket.take() else {
            return false;
        };
        self.retired.push(socket.token);
        out.push(Effect::CloseSocket {
            id: self.id,
            socket: socket.token,
            code,
            reason: reason.to_string(),
        });
        true
    }
}

fn close_line(code: u16, reason: &str) -> String {
    let reason = if reason.is_empty() { "none" } else { reason };
    format!("🔴 Connection closed (code: {}, reason: {})", code, reason)
}
