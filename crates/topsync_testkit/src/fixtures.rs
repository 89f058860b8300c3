//! Test fixtures and a scripted client harness.
//!
//! [`Harness`] wires a [`SyncClient`] to a mock transport, a manual timer and
//! a recording notifier, and keeps handles to all three so tests can play
//! the server's side of a conversation.

use topsync_client::{
    ClientConfig, ConnectionId, Endpoint, FieldStatus, ManualTimer, MemoryDocument,
    MockTransport, RecordingNotifier, SyncClient,
};
use topsync_protocol::{encode_instructions, Instruction, NodeId};

/// A form with three fields, a panel and a list.
pub const FORM_MARKUP: &str = concat!(
    r#"<form id="form">"#,
    r#"<input id="a"><input id="b"><input id="c">"#,
    r#"<div id="panel"></div>"#,
    r#"<ul id="list"></ul>"#,
    "</form>"
);

/// Endpoint used by test configurations.
pub const TEST_ENDPOINT: &str = "ws://localhost:3000/";

/// Client configuration pointing at [`TEST_ENDPOINT`].
pub fn test_config() -> ClientConfig {
    ClientConfig::new(Endpoint::new(TEST_ENDPOINT))
}

/// The client type driven by [`Harness`].
pub type TestClient = SyncClient<MockTransport, MemoryDocument>;

/// A client plus handles to its mock capabilities.
pub struct Harness {
    /// The client under test.
    pub client: TestClient,
    /// Transport handle (shares state with the client's transport).
    pub transport: MockTransport,
    /// Timer handle.
    pub timer: ManualTimer,
    /// Notifier handle.
    pub notices: RecordingNotifier,
}

impl Harness {
    /// Creates a harness over [`FORM_MARKUP`]. Not connected.
    pub fn new() -> Self {
        Self::with_markup(FORM_MARKUP)
    }

    /// Creates a harness over the given markup. Not connected.
    pub fn with_markup(markup: &str) -> Self {
        Self::with_config(test_config(), markup)
    }

    /// Creates a harness with a custom configuration. Not connected.
    pub fn with_config(config: ClientConfig, markup: &str) -> Self {
        let transport = MockTransport::new();
        let timer = ManualTimer::new();
        let notices = RecordingNotifier::new();
        let document = MemoryDocument::from_markup(markup).expect("Invalid fixture markup");
        let client = SyncClient::new(config, transport.clone(), document, timer.clone())
            .with_notifier(notices.clone());
        Self {
            client,
            transport,
            timer,
            notices,
        }
    }

    /// Creates a harness over [`FORM_MARKUP`] with an open connection.
    pub fn connected() -> Self {
        let mut harness = Self::new();
        harness.open();
        harness
    }

    /// The current connection id.
    pub fn conn(&self) -> ConnectionId {
        self.client.connection().expect("Harness has no connection")
    }

    /// Opens the current connection, connecting first if needed.
    pub fn open(&mut self) -> ConnectionId {
        let conn = match self.client.connection() {
            Some(conn) => conn,
            None => self.client.connect(),
        };
        self.client.on_open(conn);
        conn
    }

    /// Delivers a raw inbound message on the current connection.
    pub fn receive(&mut self, raw: &str) {
        let conn = self.conn();
        self.client.on_message(conn, raw);
    }

    /// Delivers instructions as one array message.
    pub fn receive_all(&mut self, instructions: &[Instruction]) {
        let raw = encode_instructions(instructions).expect("Failed to encode instructions");
        self.receive(&raw);
    }

    /// Closes the current connection from the server side.
    pub fn drop_connection(&mut self, reason: Option<&str>) {
        let conn = self.conn();
        self.client.on_close(conn, reason.map(str::to_string));
    }

    /// Reports a transport error on the current connection.
    pub fn fail_connection(&mut self, detail: &str) {
        let conn = self.conn();
        self.client.on_error(conn, detail);
    }

    /// Fires the retry timer if it is armed. Returns true if the client
    /// reconnected.
    pub fn fire_timer(&mut self) -> bool {
        self.timer.fire().is_some() && self.client.on_retry_timer()
    }

    /// Messages the client has sent.
    pub fn sent(&self) -> Vec<String> {
        self.transport.sent()
    }

    /// Status of a field.
    pub fn status(&self, id: &str) -> FieldStatus {
        self.client.status(&NodeId::from(id))
    }

    /// The document.
    pub fn document(&self) -> &MemoryDocument {
        self.client.document()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topsync_client::ConnectionState;

    #[test]
    fn connected_harness_is_open() {
        let harness = Harness::connected();
        assert_eq!(harness.client.state(), ConnectionState::Open);
        assert_eq!(harness.transport.connect_count(), 1);
    }

    #[test]
    fn form_markup_has_all_ids() {
        let harness = Harness::new();
        for id in crate::generators::FORM_IDS {
            assert!(harness.document().element(id).is_some(), "missing {id}");
        }
    }
}
