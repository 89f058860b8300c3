//! Transport layer abstraction.

use crate::endpoint::Endpoint;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Handle for one logical connection.
///
/// Each [`Transport::connect`] returns a fresh id; lifecycle events carry
/// the id of the connection they belong to so the client can ignore events
/// from a superseded connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a connection id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the next id.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns the raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Connection lifecycle as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// A connect attempt is in flight.
    Connecting,
    /// The channel is open.
    Open,
    /// No connection (never opened, lost, or explicitly closed).
    #[default]
    Closed,
}

/// A lifecycle callback from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The channel opened.
    Open,
    /// A text frame arrived.
    Message(String),
    /// A channel-level error occurred.
    Error(String),
    /// The channel closed, with an optional reason.
    Close(Option<String>),
}

/// A duplex message channel.
///
/// Failures never surface as errors to the caller: implementations report
/// them as [`TransportEvent::Error`] / [`TransportEvent::Close`] delivered
/// to the client.
pub trait Transport {
    /// Opens a connection, superseding any previous one.
    fn connect(&mut self, endpoint: &Endpoint) -> ConnectionId;

    /// Sends a text frame on the current connection.
    fn send(&mut self, message: String);

    /// Closes the current connection.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self, endpoint: &Endpoint) -> ConnectionId {
        (**self).connect(endpoint)
    }

    fn send(&mut self, message: String) {
        (**self).send(message)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

#[derive(Debug, Default)]
struct MockState {
    current: ConnectionId,
    connects: Vec<Endpoint>,
    sent: Vec<String>,
    closes: usize,
}

/// A transport that records calls, for tests.
///
/// Clones share state, so a test can keep one handle while the client owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `connect` calls so far.
    pub fn connect_count(&self) -> usize {
        self.state.lock().connects.len()
    }

    /// Endpoints passed to `connect`, in order.
    pub fn connects(&self) -> Vec<Endpoint> {
        self.state.lock().connects.clone()
    }

    /// Id of the most recent connection.
    pub fn current(&self) -> ConnectionId {
        self.state.lock().current
    }

    /// Messages sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    /// Drains the sent messages.
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().sent)
    }

    /// Number of `close` calls so far.
    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, endpoint: &Endpoint) -> ConnectionId {
        let mut state = self.state.lock();
        state.current = state.current.next();
        state.connects.push(endpoint.clone());
        state.current
    }

    fn send(&mut self, message: String) {
        self.state.lock().sent.push(message);
    }

    fn close(&mut self) {
        self.state.lock().closes += 1;
    }
}
