//! The console event loop.
//!
//! All state changes happen here, one event at a time: user commands, socket
//! reports and timer firings arrive on a single channel, are applied to the
//! [`ConnectionSet`], and the effects it asks for are carried out before the
//! next event is taken. Presentation code only sees [`ConsoleView`] snapshots.

use std::collections::HashMap;
use std::future::Future;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::StreamExt;
use socketdeck_core::{
    ConnectionId, ConnectionSet, ConsoleConfig, Effect, KeyValueStore, LogExport, MessageFormat,
    SessionState, SocketEvent, SocketToken, TimerToken,
};

use crate::timers::{self, TimerHandle};
use crate::ws::{self, SocketHandle};

/// A user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddConnection,
    RemoveConnection(ConnectionId),
    Connect(ConnectionId),
    Disconnect(ConnectionId),
    Send {
        id: ConnectionId,
        text: String,
        format: MessageFormat,
    },
    SaveToHistory {
        id: ConnectionId,
        text: String,
    },
    ClearLog(ConnectionId),
    SetUrl {
        id: ConnectionId,
        url: String,
    },
    SetAutoReconnect {
        id: ConnectionId,
        enabled: bool,
    },
    SaveToken(String),
    ExportLogs,
}

#[derive(Debug)]
pub enum ConsoleEvent {
    Command(Command),
    Socket {
        id: ConnectionId,
        socket: SocketToken,
        event: SocketEvent,
    },
    Timer {
        id: ConnectionId,
        timer: TimerToken,
    },
}

/// What the UI renders for one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionView {
    pub id: ConnectionId,
    pub url: String,
    pub auto_reconnect: bool,
    pub state: SessionState,
    pub log: String,
    pub history: Vec<String>,
}

/// Snapshot of the whole console.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsoleView {
    pub token: Option<String>,
    pub connections: Vec<ConnectionView>,
    /// Outcome of the last token save or export, for a status line.
    pub notice: Option<String>,
}

/// Cheap, cloneable sender of user commands.
#[derive(Clone)]
pub struct ConsoleHandle {
    events: UnboundedSender<ConsoleEvent>,
}

impl ConsoleHandle {
    pub fn send(&self, command: Command) {
        if self
            .events
            .unbounded_send(ConsoleEvent::Command(command))
            .is_err()
        {
            crate::log_error!("console loop has stopped, command dropped");
        }
    }
}

/// Create a console and the future that runs it.
///
/// `on_change` receives a fresh view after startup and after every event.
pub fn launch<S: KeyValueStore + 'static>(
    store: S,
    config: ConsoleConfig,
    on_change: impl FnMut(ConsoleView) + 'static,
) -> (ConsoleHandle, impl Future<Output = ()>) {
    let (tx, rx) = unbounded();
    let console = Console::new(store, config, tx.clone());
    (ConsoleHandle { events: tx }, console.run(rx, on_change))
}

pub struct Console<S: KeyValueStore> {
    set: ConnectionSet<S>,
    sockets: HashMap<SocketToken, SocketHandle>,
    timers: HashMap<TimerToken, (TimerHandle, bool)>,
    events: UnboundedSender<ConsoleEvent>,
    notice: Option<String>,
}

impl<S: KeyValueStore> Console<S> {
    pub fn new(store: S, config: ConsoleConfig, events: UnboundedSender<ConsoleEvent>) -> Self {
        Self {
            set: ConnectionSet::new(store, config),
            sockets: HashMap::new(),
            timers: HashMap::new(),
            events,
            notice: None,
        }
    }

    pub async fn run(
        mut self,
        mut events: UnboundedReceiver<ConsoleEvent>,
        mut on_change: impl FnMut(ConsoleView),
    ) {
        self.start();
        on_change(self.view());
        while let Some(event) = events.next().await {
            self.dispatch(event);
            on_change(self.view());
        }
        crate::log_info!("console loop finished");
    }

    /// Restore persisted connections and start any pending resumes.
    pub fn start(&mut self) {
        let ids = self.set.restore_all();
        crate::log_info!("restored {} connection(s)", ids.len());
        self.execute();
    }

    pub fn dispatch(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Command(command) => self.apply(command),
            ConsoleEvent::Socket { id, socket, event } => {
                let closed = matches!(event, SocketEvent::Closed { .. });
                self.set.handle_socket_event(id, socket, event);
                if closed {
                    self.sockets.remove(&socket);
                }
                // Keep the resume flags current; there is no reliable shutdown hook.
                self.set.snapshot();
            }
            ConsoleEvent::Timer { id, timer } => {
                if matches!(self.timers.get(&timer), Some((_, false))) {
                    self.timers.remove(&timer);
                }
                self.set.handle_timer(id, timer);
            }
        }
        self.execute();
    }

    fn apply(&mut self, command: Command) {
        // Failures are written to the connection log by the core.
        let result = match command {
            Command::AddConnection => {
                let result = self.set.add_connection().map(|_| ());
                if let Err(e) = &result {
                    self.notice = Some(format!("Cannot add connection: {}", e));
                }
                result
            }
            Command::RemoveConnection(id) => {
                self.set.remove_connection(id);
                Ok(())
            }
            Command::Connect(id) => self.set.connect(id),
            Command::Disconnect(id) => self.set.disconnect(id),
            Command::Send { id, text, format } => self.set.send(id, &text, format),
            Command::SaveToHistory { id, text } => self.set.save_to_history(id, &text).map(|_| ()),
            Command::ClearLog(id) => self.set.clear_log(id),
            Command::SetUrl { id, url } => self.set.set_url(id, url),
            Command::SetAutoReconnect { id, enabled } => self.set.set_auto_reconnect(id, enabled),
            Command::SaveToken(token) => {
                let result = self.set.save_token(&token);
                self.notice = Some(match &result {
                    Ok(()) => "Token saved successfully!".to_string(),
                    Err(_) => "Please enter a token first".to_string(),
                });
                result
            }
            Command::ExportLogs => {
                self.export();
                Ok(())
            }
        };
        if let Err(e) = result {
            crate::log_debug!("command rejected: {}", e);
        }
    }

    fn export(&mut self) {
        let export = self.set.export_logs();
        let date = chrono::Utc::now().date_naive();
        self.notice = Some(match crate::export::save(&export, &LogExport::file_name(date)) {
            Ok(location) => format!("Logs exported to {}", location),
            Err(e) => {
                crate::log_error!("export failed: {:#}", e);
                format!("Export failed: {}", e)
            }
        });
    }

    /// Carry out every effect the core has queued.
    fn execute(&mut self) {
        for effect in self.set.drain_effects() {
            match effect {
                Effect::OpenSocket { id, socket, url } => {
                    if let Some(handle) = ws::open(id, socket, url, self.events.clone()) {
                        self.sockets.insert(socket, handle);
                    }
                }
                Effect::SendFrame { socket, frame, .. } => match self.sockets.get(&socket) {
                    Some(handle) => handle.send(frame),
                    None => crate::log_warn!("no driver for socket {}", socket.0),
                },
                Effect::CloseSocket {
                    socket,
                    code,
                    reason,
                    ..
                } => {
                    if let Some(handle) = self.sockets.get(&socket) {
                        handle.close(code, reason);
                    }
                }
                Effect::StartTimer {
                    id,
                    timer,
                    delay,
                    repeat,
                    ..
                } => {
                    let handle = timers::start(id, timer, delay, repeat, self.events.clone());
                    self.timers.insert(timer, (handle, repeat));
                }
                Effect::CancelTimer { timer, .. } => {
                    // Dropping the handle cancels it.
                    self.timers.remove(&timer);
                }
            }
        }
    }

    pub fn view(&self) -> ConsoleView {
        let connections = self
            .set
            .ids()
            .iter()
            .filter_map(|id| self.set.entry(*id))
            .map(|entry| ConnectionView {
                id: entry.record.id,
                url: entry.record.url.clone(),
                auto_reconnect: entry.record.auto_reconnect,
                state: entry.session.state(),
                log: entry.log.as_str().to_string(),
                history: entry.history.to_vec(),
            })
            .collect();
        ConsoleView {
            token: self.set.token().map(str::to_string),
            connections,
            notice: self.notice.clone(),
        }
    }

    pub fn connections(&self) -> &ConnectionSet<S> {
        &self.set
    }

    pub fn live_sockets(&self) -> usize {
        self.sockets.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use socketdeck_core::store::{encode_flag, keys};
    use socketdeck_core::MemoryStore;

    fn console(store: MemoryStore) -> (Console<MemoryStore>, UnboundedReceiver<ConsoleEvent>) {
        let (tx, rx) = unbounded();
        (Console::new(store, ConsoleConfig::default(), tx), rx)
    }

    fn command(c: Command) -> ConsoleEvent {
        ConsoleEvent::Command(c)
    }

    #[tokio::test]
    async fn fresh_start_shows_one_disconnected_connection() {
        let (mut console, _rx) = console(MemoryStore::new());
        console.start();

        let view = console.view();
        assert_eq!(view.connections.len(), 1);
        let first = &view.connections[0];
        assert_eq!(first.id, ConnectionId(1));
        assert_eq!(first.url, "ws://localhost:8090/websocket/conn1");
        assert_eq!(first.state, SessionState::Disconnected);
        assert!(view.token.is_none());
    }

    #[tokio::test]
    async fn add_and_remove_update_the_view() {
        let (mut console, _rx) = console(MemoryStore::new());
        console.start();

        console.dispatch(command(Command::AddConnection));
        assert_eq!(console.view().connections.len(), 2);

        console.dispatch(command(Command::RemoveConnection(ConnectionId(1))));
        let view = console.view();
        assert_eq!(view.connections.len(), 1);
        assert_eq!(view.connections[0].id, ConnectionId(2));
    }

    #[tokio::test]
    async fn token_save_reports_outcome() {
        let (mut console, _rx) = console(MemoryStore::new());
        console.start();

        console.dispatch(command(Command::SaveToken("   ".into())));
        assert_eq!(console.view().notice.as_deref(), Some("Please enter a token first"));
        assert!(console.view().token.is_none());

        console.dispatch(command(Command::SaveToken(" abc ".into())));
        let view = console.view();
        assert_eq!(view.notice.as_deref(), Some("Token saved successfully!"));
        assert_eq!(view.token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn rejected_connect_opens_no_socket() {
        let (mut console, _rx) = console(MemoryStore::new());
        console.start();

        console.dispatch(command(Command::SetUrl {
            id: ConnectionId(1),
            url: "http://example.com".into(),
        }));
        console.dispatch(command(Command::Connect(ConnectionId(1))));

        assert_eq!(console.live_sockets(), 0);
        assert_eq!(console.view().connections[0].state, SessionState::Disconnected);
    }

    #[tokio::test]
    async fn resume_timer_fires_into_a_connect() {
        let mut store = MemoryStore::new();
        store.set(keys::CONNECTIONS, "[1]").unwrap();
        store.set(keys::COUNTER, "1").unwrap();
        store.set(&keys::url(ConnectionId(1)), "ws://127.0.0.1:9/resume").unwrap();
        store.set(&keys::auto_reconnect(ConnectionId(1)), encode_flag(true)).unwrap();
        store.set(&keys::was_connected(ConnectionId(1)), encode_flag(true)).unwrap();

        let (mut console, _rx) = console(store);
        console.start();
        assert_eq!(console.pending_timers(), 1);

        let (timer, _) = console
            .connections()
            .entry(ConnectionId(1))
            .and_then(|e| e.session.pending_timer())
            .expect("resume scheduled");
        console.dispatch(ConsoleEvent::Timer {
            id: ConnectionId(1),
            timer,
        });

        assert_eq!(console.pending_timers(), 0);
        assert_eq!(console.live_sockets(), 1);
        assert_eq!(console.view().connections[0].state, SessionState::Connecting);
    }

    #[tokio::test]
    async fn closed_socket_releases_its_driver() {
        let (mut console, _rx) = console(MemoryStore::new());
        console.start();
        console.dispatch(command(Command::SetUrl {
            id: ConnectionId(1),
            url: "ws://127.0.0.1:9/closed".into(),
        }));
        console.dispatch(command(Command::Connect(ConnectionId(1))));
        assert_eq!(console.live_sockets(), 1);

        let socket = console
            .connections()
            .entry(ConnectionId(1))
            .and_then(|e| e.session.socket())
            .expect("socket open");
        console.dispatch(ConsoleEvent::Socket {
            id: ConnectionId(1),
            socket,
            event: SocketEvent::Closed {
                code: 1006,
                reason: String::new(),
            },
        });

        assert_eq!(console.live_sockets(), 0);
        assert_eq!(console.view().connections[0].state, SessionState::Disconnected);
    }
}
