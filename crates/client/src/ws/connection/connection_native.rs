//! Native/Desktop WebSocket implementation using tokio-tungstenite.

use std::time::Duration;

use futures_channel::mpsc::UnboundedSender;
use futures_util::{SinkExt, StreamExt};
use socketdeck_core::{ConnectionId, SocketEvent, SocketToken};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::{EventSink, ABNORMAL_CLOSURE};
use crate::console::ConsoleEvent;

/// How long to wait for the peer to answer our close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(5);
/// Placeholder deadline until a close is requested.
const IDLE_DEADLINE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

enum Outbound {
    Text(String),
    Close { code: u16, reason: String },
}

/// Handle to one live socket task (Native implementation)
pub struct SocketHandle {
    sender: mpsc::UnboundedSender<Outbound>,
    task: tokio::task::JoinHandle<()>,
}

impl SocketHandle {
    pub fn send(&self, frame: String) {
        if self.sender.send(Outbound::Text(frame)).is_err() {
            crate::log_warn!("send on a finished socket dropped");
        }
    }

    pub fn close(&self, code: u16, reason: String) {
        let _ = self.sender.send(Outbound::Close { code, reason });
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Open a socket in a background tokio task.
pub fn open(
    id: ConnectionId,
    socket: SocketToken,
    url: Url,
    events: UnboundedSender<ConsoleEvent>,
) -> Option<SocketHandle> {
    let (sender, receiver) = mpsc::unbounded_channel();
    let sink = EventSink::new(id, socket, events);
    let task = tokio::spawn(run_socket(url, receiver, sink));
    Some(SocketHandle { sender, task })
}

async fn run_socket(url: Url, mut outbound: mpsc::UnboundedReceiver<Outbound>, sink: EventSink) {
    crate::log_info!("Connecting to {}", url);

    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, response)) => {
            crate::log_info!("WebSocket connected to {} (status: {})", url, response.status());
            stream
        }
        Err(e) => {
            crate::log_error!("WebSocket error for {}: {}", url, e);
            sink.fail(e.to_string());
            return;
        }
    };
    sink.emit(SocketEvent::Opened);

    let (mut write, mut read) = ws_stream.split();
    let mut requested: Option<(u16, String)> = None;
    let close_deadline = tokio::time::sleep(IDLE_DEADLINE);
    tokio::pin!(close_deadline);

    let (code, reason) = loop {
        tokio::select! {
            cmd = outbound.recv(), if requested.is_none() => match cmd {
                Some(Outbound::Text(frame)) => {
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        crate::log_error!("Send failed: {}", e);
                        sink.emit(SocketEvent::Error(e.to_string()));
                        break (ABNORMAL_CLOSURE, String::new());
                    }
                }
                Some(Outbound::Close { code, reason }) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.clone().into(),
                    };
                    if let Err(e) = write.send(Message::Close(Some(frame))).await {
                        crate::log_debug!("Close frame not delivered: {}", e);
                        break (code, reason);
                    }
                    requested = Some((code, reason));
                    close_deadline
                        .as_mut()
                        .reset(tokio::time::Instant::now() + CLOSE_GRACE);
                }
                None => {
                    // Handle dropped
                    break (ABNORMAL_CLOSURE, String::new());
                }
            },
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => sink.emit(SocketEvent::Text(text.to_string())),
                Some(Ok(Message::Binary(data))) => sink.emit(SocketEvent::Binary(data.len())),
                Some(Ok(Message::Close(frame))) => {
                    break frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .or_else(|| requested.clone())
                        .unwrap_or((1005, String::new()));
                }
                Some(Ok(_)) => {
                    // Ping/pong are answered by tungstenite
                }
                Some(Err(e)) => {
                    crate::log_error!("WebSocket read error: {}", e);
                    sink.emit(SocketEvent::Error(e.to_string()));
                    break (ABNORMAL_CLOSURE, String::new());
                }
                None => break requested.clone().unwrap_or((ABNORMAL_CLOSURE, String::new())),
            },
            _ = &mut close_deadline, if requested.is_some() => {
                crate::log_debug!("Peer did not answer close in time");
                break requested.clone().unwrap_or((ABNORMAL_CLOSURE, String::new()));
            }
        }
    };

    crate::log_info!("WebSocket to {} closed ({})", url, code);
    sink.emit(SocketEvent::Closed { code, reason });
}
