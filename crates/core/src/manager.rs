//! The connection set: authoritative owner of every connection's state.
//!
//! Each identifier indexes a single [`ConnectionEntry`] holding its record,
//! transport session, message history and log, so the pieces cannot drift
//! apart. Presentation layers read from here and never act as the source of
//! truth for which connections exist.

use std::collections::HashMap;

use crate::config::ConsoleConfig;
use crate::error::{CoreError, StoreError};
use crate::export::{ExportEntry, LogExport};
use crate::format::{format_outbound, resolve_target, MessageFormat};
use crate::history::MessageHistory;
use crate::log::ConnectionLog;
use crate::record::{ConnectionId, ConnectionRecord};
use crate::session::{
    Effect, Outbox, ReconnectPolicy, SessionState, SocketEvent, SocketToken, TimerKind,
    TimerToken, TransportSession,
};
use crate::store::{decode_flag, encode_flag, keys, KeyValueStore};

/// Everything tracked for one connection.
#[derive(Debug)]
pub struct ConnectionEntry {
    pub record: ConnectionRecord,
    pub session: TransportSession,
    pub history: MessageHistory,
    pub log: ConnectionLog,
}

pub struct ConnectionSet<S: KeyValueStore> {
    store: S,
    config: ConsoleConfig,
    token: Option<String>,
    counter: u32,
    order: Vec<ConnectionId>,
    entries: HashMap<ConnectionId, ConnectionEntry>,
    outbox: Outbox,
}

impl<S: KeyValueStore> ConnectionSet<S> {
    pub fn new(store: S, config: ConsoleConfig) -> Self {
        let token = store.get(keys::AUTH_TOKEN).filter(|t| !t.is_empty());
        Self {
            store,
            config,
            token,
            counter: 0,
            order: Vec::new(),
            entries: HashMap::new(),
            outbox: Outbox::default(),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Identifiers in display order.
    pub fn ids(&self) -> &[ConnectionId] {
        &self.order
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn entry(&self, id: ConnectionId) -> Option<&ConnectionEntry> {
        self.entries.get(&id)
    }

    pub fn state(&self, id: ConnectionId) -> Option<SessionState> {
        self.entries.get(&id).map(|e| e.session.state())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Saved messages of `id`, most recent first.
    pub fn history(&self, id: ConnectionId) -> Option<Vec<String>> {
        self.entries.get(&id).map(|e| e.history.to_vec())
    }

    /// Effects produced since the last call, in order.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        self.outbox.drain()
    }

    /// Rebuild the connection set from the store.
    ///
    /// With nothing persisted yet a first connection is created. Connections
    /// that had auto-reconnect on and were live at the last shutdown get a
    /// delayed connect attempt.
    pub fn restore_all(&mut self) -> Vec<ConnectionId> {
        self.counter = self
            .store
            .get(keys::COUNTER)
            .and_then(|raw| match raw.trim().parse::<u32>() {
                Ok(n) => Some(n),
                Err(e) => {
                    tracing::warn!(%raw, error = %e, "ignoring corrupt connection counter");
                    None
                }
            })
            .unwrap_or(0);

        let persisted = self.store.get(keys::CONNECTIONS).and_then(|raw| {
            match serde_json::from_str::<Vec<ConnectionId>>(&raw) {
                Ok(ids) => Some(ids),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load saved connections");
                    None
                }
            }
        });

        let Some(ids) = persisted else {
            return self.add_connection().into_iter().collect();
        };

        for id in ids {
            if self.entries.contains_key(&id) {
                continue;
            }
            // Never hand out an identifier that is already in use.
            self.counter = self.counter.max(id.0);
            self.restore_entry(id);
        }

        self.persist_metadata();
        tracing::info!(count = self.order.len(), "restored connections");
        self.order.clone()
    }

    fn restore_entry(&mut self, id: ConnectionId) {
        let url = self
            .store
            .get(&keys::url(id))
            .unwrap_or_else(|| self.config.default_url(id));

        let mut record = ConnectionRecord::new(id, url);
        record.auto_reconnect = decode_flag(self.store.get(&keys::auto_reconnect(id)));
        record.last_connected = decode_flag(self.store.get(&keys::was_connected(id)));

        let mut log = ConnectionLog::restore(
            self.store.get(&keys::log(id)).unwrap_or_default(),
            self.config.max_log_bytes,
        );

        let history = match self.load_history(id) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(%id, error = %e, "failed to restore message history");
                log.append(&format!("⚠️ Failed to restore message history: {}", e));
                MessageHistory::new(self.config.history_capacity)
            }
        };

        let mut session = TransportSession::new(id);
        if record.should_resume() {
            tracing::debug!(%id, "scheduling resume");
            session.schedule_resume(self.config.resume_delay, &mut self.outbox);
        }

        self.order.push(id);
        self.entries.insert(
            id,
            ConnectionEntry {
                record,
                session,
                history,
                log,
            },
        );
    }

    /// Read the persisted message history of `id`. A missing key yields an
    /// empty history.
    pub fn load_history(&self, id: ConnectionId) -> Result<MessageHistory, CoreError> {
        let key = keys::history(id);
        match self.store.get(&key) {
            Some(json) => MessageHistory::from_json(&json, self.config.history_capacity, &key),
            None => Ok(MessageHistory::new(self.config.history_capacity)),
        }
    }

    /// Allocate a new connection with the default URL.
    ///
    /// Fails once the counter has reached `u32::MAX`; identifiers are never
    /// reused, so nothing is allocated.
    pub fn add_connection(&mut self) -> Result<ConnectionId, CoreError> {
        let Some(next) = self.counter.checked_add(1) else {
            tracing::warn!(counter = self.counter, "connection identifiers exhausted");
            return Err(CoreError::IdentifiersExhausted);
        };
        self.counter = next;
        let id = ConnectionId(next);

        let record = ConnectionRecord::new(id, self.config.default_url(id));
        self.order.push(id);
        self.entries.insert(
            id,
            ConnectionEntry {
                record,
                session: TransportSession::new(id),
                history: MessageHistory::new(self.config.history_capacity),
                log: ConnectionLog::new(self.config.max_log_bytes),
            },
        );

        self.persist_metadata();
        tracing::info!(%id, "added connection");
        Ok(id)
    }

    /// Drop a connection, closing its socket and cancelling its timer first.
    /// Unknown identifiers are ignored.
    pub fn remove_connection(&mut self, id: ConnectionId) {
        let Some(mut entry) = self.entries.remove(&id) else {
            return;
        };
        entry.session.release(&mut self.outbox);
        self.order.retain(|other| *other != id);

        for key in keys::per_connection(id) {
            remove(&mut self.store, &key);
        }
        self.persist_metadata();
        tracing::info!(%id, "removed connection");
    }

    pub fn connect(&mut self, id: ConnectionId) -> Result<(), CoreError> {
        let token = self
            .token
            .clone()
            .or_else(|| self.store.get(keys::AUTH_TOKEN))
            .filter(|t| !t.is_empty());
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(CoreError::UnknownConnection(id))?;

        write(&mut self.store, &keys::url(id), &entry.record.url);

        let target = resolve_target(&entry.record.url, token.as_deref());
        let result = entry
            .session
            .connect(target, &mut entry.log, &mut self.outbox)
            .map(|_| ());
        write(&mut self.store, &keys::log(id), entry.log.as_str());
        result
    }

    pub fn disconnect(&mut self, id: ConnectionId) -> Result<(), CoreError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(CoreError::UnknownConnection(id))?;
        entry.session.disconnect(&mut entry.log, &mut self.outbox);
        write(&mut self.store, &keys::log(id), entry.log.as_str());
        Ok(())
    }

    /// Send `text` on the connection's open socket.
    ///
    /// Blank input, a closed socket, or a JSON formatting failure abort the
    /// send with a logged warning and no other effect.
    pub fn send(
        &mut self,
        id: ConnectionId,
        text: &str,
        format: MessageFormat,
    ) -> Result<(), CoreError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(CoreError::UnknownConnection(id))?;

        let result = send_on(entry, text, format, &mut self.outbox);
        if result.is_ok() {
            write(&mut self.store, &keys::history(id), &entry.history.to_json());
        }
        write(&mut self.store, &keys::log(id), entry.log.as_str());
        result
    }

    /// Remember `text` without sending it. Blank input is ignored.
    pub fn save_to_history(&mut self, id: ConnectionId, text: &str) -> Result<bool, CoreError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(CoreError::UnknownConnection(id))?;
        if text.trim().is_empty() || !entry.history.record(text) {
            return Ok(false);
        }
        write(&mut self.store, &keys::history(id), &entry.history.to_json());
        Ok(true)
    }

    pub fn clear_log(&mut self, id: ConnectionId) -> Result<(), CoreError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(CoreError::UnknownConnection(id))?;
        entry.log.clear();
        write(&mut self.store, &keys::log(id), "");
        Ok(())
    }

    /// Edit the URL. It is persisted on the next connect attempt.
    pub fn set_url(&mut self, id: ConnectionId, url: impl Into<String>) -> Result<(), CoreError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(CoreError::UnknownConnection(id))?;
        entry.record.url = url.into();
        Ok(())
    }

    pub fn set_auto_reconnect(&mut self, id: ConnectionId, enabled: bool) -> Result<(), CoreError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(CoreError::UnknownConnection(id))?;
        entry.record.auto_reconnect = enabled;
        write(&mut self.store, &keys::auto_reconnect(id), encode_flag(enabled));
        Ok(())
    }

    /// Persist the shared credential attached to every connect.
    pub fn save_token(&mut self, token: &str) -> Result<(), CoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CoreError::EmptyToken);
        }
        self.store.set(keys::AUTH_TOKEN, token)?;
        self.token = Some(token.to_string());
        Ok(())
    }

    /// Capture connectedness and auto-reconnect flags ahead of shutdown.
    pub fn snapshot(&mut self) {
        for id in &self.order {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };
            let connected = entry.session.state().is_connected();
            entry.record.last_connected = connected;
            write(&mut self.store, &keys::was_connected(*id), encode_flag(connected));
            write(
                &mut self.store,
                &keys::auto_reconnect(*id),
                encode_flag(entry.record.auto_reconnect),
            );
        }
        tracing::debug!(count = self.order.len(), "snapshot written");
    }

    pub fn export_logs(&self) -> LogExport {
        let mut export = LogExport::default();
        for id in &self.order {
            if let Some(entry) = self.entries.get(id) {
                export.push(
                    *id,
                    ExportEntry {
                        url: entry.record.url.clone(),
                        log: entry.log.as_str().to_string(),
                    },
                );
            }
        }
        export
    }

    /// Feed a socket event from the driver.
    pub fn handle_socket_event(
        &mut self,
        id: ConnectionId,
        socket: SocketToken,
        event: SocketEvent,
    ) {
        let Some(entry) = self.entries.get_mut(&id) else {
            tracing::debug!(%id, socket = socket.0, "event for removed connection");
            return;
        };
        let policy = ReconnectPolicy {
            enabled: entry.record.auto_reconnect,
            interval: self.config.reconnect_interval,
        };
        if entry
            .session
            .on_socket_event(socket, event, policy, &mut entry.log, &mut self.outbox)
        {
            write(&mut self.store, &keys::log(id), entry.log.as_str());
        }
    }

    /// Feed a timer firing from the driver. Stale timers are ignored.
    pub fn handle_timer(&mut self, id: ConnectionId, timer: TimerToken) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        let Some(kind) = entry.session.on_timer(timer, &mut entry.log) else {
            tracing::debug!(%id, timer = timer.0, "ignoring stale timer");
            return;
        };
        tracing::debug!(%id, ?kind, "timer fired");
        if kind == TimerKind::Reconnect {
            write(&mut self.store, &keys::log(id), entry.log.as_str());
        }
        // Failures are already in the connection log.
        let _ = self.connect(id);
    }

    /// Write the identifier list and counter as one complete snapshot.
    fn persist_metadata(&mut self) {
        let ids = serde_json::to_string(&self.order).unwrap_or_else(|_| "[]".to_string());
        write(&mut self.store, keys::CONNECTIONS, &ids);
        write(&mut self.store, keys::COUNTER, &self.counter.to_string());
    }
}

fn send_on(
    entry: &mut ConnectionEntry,
    text: &str,
    format: MessageFormat,
    out: &mut Outbox,
) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        entry.log.append("⚠️ Please enter a message to send");
        return Err(CoreError::BlankMessage);
    }
    if !entry.session.state().is_connected() {
        entry.log.append("⚠️ Socket not connected. Message not sent.");
        return Err(CoreError::NotConnected);
    }
    let frame = match format_outbound(text, format) {
        Ok(frame) => frame,
        Err(e) => {
            entry.log.append(&format!("⚠️ Failed to format as JSON: {}", e));
            return Err(e);
        }
    };
    entry.session.send(frame.clone(), &mut entry.log, out)?;
    entry.history.record(&frame);
    Ok(())
}

fn write<S: KeyValueStore>(store: &mut S, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        log_store_failure(key, &e);
    }
}

fn remove<S: KeyValueStore>(store: &mut S, key: &str) {
    if let Err(e) = store.remove(key) {
        log_store_failure(key, &e);
    }
}

fn log_store_failure(key: &str, error: &StoreError) {
    tracing::warn!(%key, %error, "store write failed");
}
