//! Browser WebSocket transport.

use std::cell::RefCell;
use std::rc::Rc;
use topsync_client::{ConnectionId, Endpoint, Transport, TransportEvent};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

type Sink = Rc<RefCell<Option<Box<dyn Fn(ConnectionId, TransportEvent)>>>>;

/// Where transport events go. Set once the client exists.
#[derive(Clone, Default)]
pub struct Dispatcher {
    sink: Sink,
}

impl Dispatcher {
    /// Creates a dispatcher with no sink; events are dropped until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the event sink.
    pub fn set(&self, sink: impl Fn(ConnectionId, TransportEvent) + 'static) {
        *self.sink.borrow_mut() = Some(Box::new(sink));
    }

    fn dispatch(&self, conn: ConnectionId, event: TransportEvent) {
        if let Some(sink) = self.sink.borrow().as_ref() {
            sink(conn, event);
        }
    }
}

struct Socket {
    ws: WebSocket,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl Socket {
    fn open(url: &str, conn: ConnectionId, dispatcher: &Dispatcher) -> Result<Self, JsValue> {
        let ws = WebSocket::new(url)?;

        let d = dispatcher.clone();
        let on_open = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            d.dispatch(conn, TransportEvent::Open);
        });
        let d = dispatcher.clone();
        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
            // binary frames are not part of the protocol
            if let Some(text) = ev.data().as_string() {
                d.dispatch(conn, TransportEvent::Message(text));
            }
        });
        let d = dispatcher.clone();
        let on_error = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            d.dispatch(conn, TransportEvent::Error(ev.type_()));
        });
        let d = dispatcher.clone();
        let on_close = Closure::<dyn FnMut(CloseEvent)>::new(move |ev: CloseEvent| {
            let reason = Some(ev.reason()).filter(|r| !r.is_empty());
            d.dispatch(conn, TransportEvent::Close(reason));
        });

        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Ok(Self {
            ws,
            _on_open: on_open,
            _on_message: on_message,
            _on_error: on_error,
            _on_close: on_close,
        })
    }

    fn shut(self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        let _ = self.ws.close();
    }
}

/// A [`Transport`] over `web_sys::WebSocket`.
///
/// Events are delivered through the [`Dispatcher`] from browser callbacks,
/// never from inside a [`Transport`] call. A socket that cannot be
/// constructed reports `Error` then `Close` from a spawned task.
pub struct BrowserTransport {
    dispatcher: Dispatcher,
    last: ConnectionId,
    socket: Option<Socket>,
}

impl BrowserTransport {
    /// Creates a transport that delivers events through `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            last: ConnectionId::default(),
            socket: None,
        }
    }

    /// Returns the current socket's ready state, if any.
    pub fn ready_state(&self) -> Option<u16> {
        self.socket.as_ref().map(|s| s.ws.ready_state())
    }
}

impl Transport for BrowserTransport {
    fn connect(&mut self, endpoint: &Endpoint) -> ConnectionId {
        if let Some(old) = self.socket.take() {
            old.shut();
        }
        self.last = self.last.next();
        let conn = self.last;

        match Socket::open(endpoint.url(), conn, &self.dispatcher) {
            Ok(socket) => self.socket = Some(socket),
            Err(e) => {
                let detail = e.as_string().unwrap_or_else(|| format!("{e:?}"));
                let dispatcher = self.dispatcher.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    dispatcher.dispatch(conn, TransportEvent::Error(detail));
                    dispatcher.dispatch(conn, TransportEvent::Close(None));
                });
            }
        }
        conn
    }

    fn send(&mut self, message: String) {
        let Some(socket) = &self.socket else {
            return;
        };
        if let Err(e) = socket.ws.send_with_str(&message) {
            web_sys::console::warn_2(&"send failed".into(), &e);
        }
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.shut();
        }
    }
}

impl Drop for BrowserTransport {
    fn drop(&mut self) {
        self.close();
    }
}
