//! WASM/Web-specific WebSocket implementation using web_sys::WebSocket.

use futures_channel::mpsc::UnboundedSender;
use socketdeck_core::{ConnectionId, SocketEvent, SocketToken};
use url::Url;
use wasm_bindgen::prelude::*;
use web_sys::{js_sys, BinaryType, CloseEvent, Event, MessageEvent, WebSocket};

use super::EventSink;
use crate::console::ConsoleEvent;

/// Handle to one browser socket (WASM implementation)
///
/// The callbacks live as long as the handle; the console keeps it until the
/// socket's close event has been delivered.
pub struct SocketHandle {
    ws: WebSocket,
    _onopen: Closure<dyn FnMut(Event)>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
    _onerror: Closure<dyn FnMut(Event)>,
}

impl SocketHandle {
    pub fn send(&self, frame: String) {
        if let Err(e) = self.ws.send_with_str(&frame) {
            crate::log_error!("Send failed: {:?}", e);
        }
    }

    pub fn close(&self, code: u16, reason: String) {
        if let Err(e) = self.ws.close_with_code_and_reason(code, &reason) {
            crate::log_error!("Close failed: {:?}", e);
        }
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
        self.ws.set_onerror(None);
    }
}

/// Open a browser socket. Construction failures are reported through the
/// event channel and yield no handle.
pub fn open(
    id: ConnectionId,
    socket: SocketToken,
    url: Url,
    events: UnboundedSender<ConsoleEvent>,
) -> Option<SocketHandle> {
    let sink = EventSink::new(id, socket, events);

    let ws = match WebSocket::new(url.as_str()) {
        Ok(ws) => ws,
        Err(e) => {
            crate::log_error!("Failed to create WebSocket for {}: {:?}", url, e);
            sink.fail(format!("{:?}", e));
            return None;
        }
    };
    ws.set_binary_type(BinaryType::Arraybuffer);

    let sink_open = sink.clone();
    let onopen = Closure::wrap(Box::new(move |_: Event| {
        sink_open.emit(SocketEvent::Opened);
    }) as Box<dyn FnMut(Event)>);
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

    let sink_message = sink.clone();
    let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
        let data = e.data();
        if let Some(text) = data.dyn_ref::<js_sys::JsString>() {
            sink_message.emit(SocketEvent::Text(String::from(text)));
        } else if let Some(buffer) = data.dyn_ref::<js_sys::ArrayBuffer>() {
            sink_message.emit(SocketEvent::Binary(buffer.byte_length() as usize));
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

    let sink_close = sink.clone();
    let onclose = Closure::wrap(Box::new(move |e: CloseEvent| {
        sink_close.emit(SocketEvent::Closed {
            code: e.code(),
            reason: e.reason(),
        });
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

    let sink_error = sink;
    let onerror = Closure::wrap(Box::new(move |_: Event| {
        sink_error.emit(SocketEvent::Error("WebSocket error".to_string()));
    }) as Box<dyn FnMut(Event)>);
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

    Some(SocketHandle {
        ws,
        _onopen: onopen,
        _onmessage: onmessage,
        _onclose: onclose,
        _onerror: onerror,
    })
}
