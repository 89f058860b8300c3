//! The sync client: wires transport, codecs, applier, field tracker and
//! reconnection policy together.

use crate::applier::PatchApplier;
use crate::config::ClientConfig;
use crate::document::Document;
use crate::error::{DocumentError, SyncError, SyncResult};
use crate::notice::{LogNotifier, Notice, Notifier};
use crate::reconnect::{Reconnector, RetryTimer};
use crate::status::{FieldStatus, FieldTracker};
use crate::transport::{ConnectionId, ConnectionState, Transport, TransportEvent};
use std::time::Duration;
use topsync_protocol::{decode_instructions, Action, Instruction, NodeId};
use tracing::{debug, info, trace, warn};

/// Counters about client activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Actions sent to the server.
    pub actions_sent: u64,
    /// Inbound messages received on the current connection lineage.
    pub messages_received: u64,
    /// Instructions applied successfully.
    pub instructions_applied: u64,
    /// Instructions skipped because their target was gone.
    pub targets_missing: u64,
    /// Messages dropped because they could not be decoded.
    pub decode_failures: u64,
    /// Instructions skipped for other document errors.
    pub apply_failures: u64,
    /// `invalid` acknowledgments received.
    pub rejections: u64,
    /// Transport error events.
    pub transport_errors: u64,
    /// Reconnect attempts made by the retry timer.
    pub reconnect_attempts: u64,
    /// Events ignored because they belonged to a superseded connection.
    pub stale_events: u64,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Client-side agent keeping a document in sync with the server.
///
/// Single-threaded and callback-driven: the owner feeds transport events in
/// through [`SyncClient::handle`] (or the `on_*` methods) and fires
/// [`SyncClient::on_retry_timer`] when the retry timer elapses. Every call
/// runs to completion.
///
/// # Example
///
/// ```
/// use topsync_client::{
///     ClientConfig, Endpoint, ManualTimer, MemoryDocument, MockTransport, SyncClient,
///     TransportEvent,
/// };
///
/// let transport = MockTransport::new();
/// let config = ClientConfig::new(Endpoint::new("ws://localhost:3000/"));
/// let document = MemoryDocument::from_markup(r#"<div id="panel"></div>"#).unwrap();
/// let mut client = SyncClient::new(config, transport.clone(), document, ManualTimer::new());
///
/// let conn = client.connect();
/// client.handle(conn, TransportEvent::Open);
/// client.press("submit").unwrap();
/// client.handle(
///     conn,
///     TransportEvent::Message(r#"{"replace":{"id":"panel","html":"<p>ok</p>"}}"#.into()),
/// );
///
/// assert_eq!(transport.sent(), vec![r#"{"press":{"id":"submit"}}"#]);
/// assert_eq!(client.document().inner_html("panel").unwrap(), "<p>ok</p>");
/// ```
pub struct SyncClient<T: Transport, D: Document> {
    config: ClientConfig,
    transport: T,
    document: D,
    applier: PatchApplier,
    fields: FieldTracker,
    reconnector: Reconnector,
    timer: Box<dyn RetryTimer>,
    notifier: Box<dyn Notifier>,
    state: ConnectionState,
    connection: Option<ConnectionId>,
    closed_by_user: bool,
    lost: bool,
    stats: ClientStats,
}

impl<T: Transport, D: Document> SyncClient<T, D> {
    /// Creates a client. Nothing is sent until [`SyncClient::connect`].
    pub fn new(
        config: ClientConfig,
        transport: T,
        document: D,
        timer: impl RetryTimer + 'static,
    ) -> Self {
        Self {
            applier: PatchApplier::from_config(&config),
            reconnector: Reconnector::new(config.reconnect.clone()),
            config,
            transport,
            document,
            fields: FieldTracker::new(),
            timer: Box::new(timer),
            notifier: Box::new(LogNotifier),
            state: ConnectionState::Closed,
            connection: None,
            closed_by_user: false,
            lost: false,
            stats: ClientStats::default(),
        }
    }

    /// Sets the notifier for user-visible connection notices.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the current connection id.
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// Returns the status of a field.
    pub fn status(&self, id: &NodeId) -> FieldStatus {
        self.fields.status(id)
    }

    /// Returns the field's status, or [`SyncError::ServerRejection`] if the
    /// server rejected its latest value.
    pub fn field_result(&self, id: &NodeId) -> SyncResult<FieldStatus> {
        match self.fields.status(id) {
            FieldStatus::Failed => Err(SyncError::ServerRejection { id: id.clone() }),
            status => Ok(status),
        }
    }

    /// Returns the field tracker.
    pub fn fields(&self) -> &FieldTracker {
        &self.fields
    }

    /// Returns the document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Returns the document mutably.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the transport mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Returns the activity counters.
    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// Returns the delay of the pending retry, if one is scheduled.
    pub fn pending_retry(&self) -> Option<Duration> {
        self.reconnector.pending()
    }

    /// Opens a connection, superseding any previous one and any pending retry.
    pub fn connect(&mut self) -> ConnectionId {
        self.closed_by_user = false;
        if self.reconnector.cancel() {
            self.timer.cancel();
        }
        self.open_connection()
    }

    /// Closes the connection. No reconnect is scheduled.
    pub fn close(&mut self) {
        self.closed_by_user = true;
        if self.reconnector.cancel() {
            self.timer.cancel();
        }
        if self.connection.take().is_some() {
            self.transport.close();
        }
        self.state = ConnectionState::Closed;
        info!("connection closed by client");
    }

    /// Sends a field update. The field turns `syncing` before the message
    /// is handed to the transport.
    pub fn update(&mut self, id: impl Into<NodeId>, value: impl Into<String>) -> SyncResult<()> {
        self.send(Action::update(id, value))
    }

    /// Sends a button press.
    pub fn press(&mut self, id: impl Into<NodeId>) -> SyncResult<()> {
        self.send(Action::press(id))
    }

    /// Sends an action.
    pub fn send(&mut self, action: Action) -> SyncResult<()> {
        if self.state != ConnectionState::Open {
            return Err(SyncError::NotConnected);
        }
        let message = action.encode()?;

        if let Action::Update { id, .. } = &action {
            let status = self.fields.begin_sync(id);
            self.mirror(id, status);
        }

        self.transport.send(message);
        self.stats.actions_sent += 1;
        debug!(kind = action.tag(), id = %action.id(), "sent action");
        Ok(())
    }

    /// Dispatches a transport event.
    pub fn handle(&mut self, conn: ConnectionId, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.on_open(conn),
            TransportEvent::Message(raw) => self.on_message(conn, &raw),
            TransportEvent::Error(detail) => self.on_error(conn, &detail),
            TransportEvent::Close(reason) => self.on_close(conn, reason),
        }
    }

    /// The connection opened.
    pub fn on_open(&mut self, conn: ConnectionId) {
        if self.is_stale(conn) {
            return;
        }
        self.state = ConnectionState::Open;
        self.reconnector.on_open();
        info!(%conn, "connected");
        if std::mem::take(&mut self.lost) {
            self.notifier.notify(Notice::Reconnected);
        }
    }

    /// A text frame arrived.
    ///
    /// Decode and apply failures are logged and contained; instructions
    /// are applied in message order.
    pub fn on_message(&mut self, conn: ConnectionId, raw: &str) {
        if self.is_stale(conn) {
            return;
        }
        self.stats.messages_received += 1;
        trace!(%conn, raw, "received");

        let instructions = match decode_instructions(raw) {
            Ok(instructions) => instructions,
            Err(e) => {
                warn!(error = %e, "dropping undecodable message");
                self.stats.decode_failures += 1;
                self.stats.last_error = Some(e.to_string());
                return;
            }
        };

        for instruction in &instructions {
            match self.apply_instruction(instruction) {
                Ok(()) => self.stats.instructions_applied += 1,
                Err(e) if e.is_target_missing() => {
                    debug!(error = %e, "instruction target gone, skipping");
                    self.stats.targets_missing += 1;
                }
                Err(e) => {
                    warn!(error = %e, "instruction skipped");
                    self.stats.apply_failures += 1;
                    self.stats.last_error = Some(e.to_string());
                }
            }
        }
    }

    /// A channel-level error occurred.
    pub fn on_error(&mut self, conn: ConnectionId, detail: &str) {
        if self.is_stale(conn) {
            return;
        }
        let error = SyncError::transport(detail);
        warn!(%conn, %error, "transport error");
        self.stats.transport_errors += 1;
        self.stats.last_error = Some(error.to_string());
        self.connection_lost(Notice::ConnectionFailed);
    }

    /// The connection closed.
    pub fn on_close(&mut self, conn: ConnectionId, reason: Option<String>) {
        if self.is_stale(conn) {
            return;
        }
        info!(%conn, reason = reason.as_deref().unwrap_or(""), "lost connection");
        self.connection_lost(Notice::ConnectionLost { reason });
    }

    /// The retry timer elapsed. Returns true if a reconnect was issued.
    pub fn on_retry_timer(&mut self) -> bool {
        if !self.reconnector.on_timer_fired() {
            return false;
        }
        self.stats.reconnect_attempts += 1;
        debug!(attempt = self.reconnector.attempts(), "reconnecting");
        self.open_connection();
        true
    }

    /// Applies one decoded instruction.
    pub fn apply_instruction(&mut self, instruction: &Instruction) -> SyncResult<()> {
        match instruction {
            Instruction::Valid { id } => self.acknowledge(id, true),
            Instruction::Invalid { id } => self.acknowledge(id, false),
            structural => {
                self.applier.apply(&mut self.document, structural)?;
                let document = &self.document;
                self.fields.retain(|id| document.contains(id));
                // a re-rendered field comes back without its marker
                for (id, status) in self.fields.iter() {
                    if let Err(e) = self.config.markers.apply(&mut self.document, id, status) {
                        debug!(error = %e, %id, "could not restore field status");
                    }
                }
                Ok(())
            }
        }
    }

    fn acknowledge(&mut self, id: &NodeId, accepted: bool) -> SyncResult<()> {
        if !self.document.contains(id) {
            self.fields.forget(id);
            return Err(DocumentError::TargetMissing(id.clone()).into());
        }
        let status = self.fields.acknowledge(id, accepted);
        if !accepted {
            self.stats.rejections += 1;
            debug!(error = %SyncError::ServerRejection { id: id.clone() }, "field marked failed");
        }
        self.config
            .markers
            .apply(&mut self.document, id, status)
            .map_err(Into::into)
    }

    fn mirror(&mut self, id: &NodeId, status: FieldStatus) {
        if let Err(e) = self.config.markers.apply(&mut self.document, id, status) {
            debug!(error = %e, "could not mirror field status");
        }
    }

    fn open_connection(&mut self) -> ConnectionId {
        self.state = ConnectionState::Connecting;
        let conn = self.transport.connect(&self.config.endpoint);
        self.connection = Some(conn);
        info!(%conn, endpoint = %self.config.endpoint, "connecting");
        conn
    }

    fn connection_lost(&mut self, notice: Notice) {
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::Closed;
            self.lost = true;
            self.notifier.notify(notice);
        }
        if self.closed_by_user {
            return;
        }
        if let Some(delay) = self.reconnector.on_disconnect() {
            debug!(?delay, "reconnect scheduled");
            self.timer.schedule(delay);
        }
    }

    fn is_stale(&mut self, conn: ConnectionId) -> bool {
        if self.connection == Some(conn) {
            return false;
        }
        trace!(%conn, current = ?self.connection, "ignoring event from superseded connection");
        self.stats.stale_events += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconnectConfig;
    use crate::endpoint::Endpoint;
    use crate::memory::MemoryDocument;
    use crate::notice::RecordingNotifier;
    use crate::reconnect::ManualTimer;
    use crate::status::StatusMarkers;
    use crate::transport::MockTransport;

    struct Fixture {
        client: SyncClient<MockTransport, MemoryDocument>,
        transport: MockTransport,
        timer: ManualTimer,
        notices: RecordingNotifier,
        conn: ConnectionId,
    }

    fn fixture_with(config: ClientConfig, markup: &str) -> Fixture {
        let transport = MockTransport::new();
        let timer = ManualTimer::new();
        let notices = RecordingNotifier::new();
        let document = MemoryDocument::from_markup(markup).unwrap();
        let mut client = SyncClient::new(config, transport.clone(), document, timer.clone())
            .with_notifier(notices.clone());
        let conn = client.connect();
        client.on_open(conn);
        Fixture {
            client,
            transport,
            timer,
            notices,
            conn,
        }
    }

    fn fixture(markup: &str) -> Fixture {
        fixture_with(ClientConfig::new(Endpoint::new("ws://test/")), markup)
    }

    const FORM: &str = r#"<form id="form"><input id="a"><input id="b"><div id="panel"></div></form>"#;

    #[test]
    fn update_marks_syncing_before_round_trip() {
        let mut f = fixture(FORM);
        f.client.update("a", "hello").unwrap();

        assert_eq!(f.client.status(&"a".into()), FieldStatus::Syncing);
        assert_eq!(f.client.document().attribute("a", "syncing"), Some(""));
        assert_eq!(f.transport.sent(), vec![r#"{"update":{"id":"a","value":"hello"}}"#]);
    }

    #[test]
    fn acknowledgments_resolve_status() {
        let mut f = fixture(FORM);
        f.client.update("a", "1").unwrap();
        f.client.update("b", "2").unwrap();

        f.client.on_message(f.conn, r#"{"valid":{"id":"a"}}"#);
        f.client.on_message(f.conn, r#"{"invalid":{"id":"b"}}"#);

        assert_eq!(f.client.status(&"a".into()), FieldStatus::Synced);
        assert_eq!(f.client.status(&"b".into()), FieldStatus::Failed);
        let doc = f.client.document();
        assert_eq!(doc.attribute("a", "syncing"), None);
        assert_eq!(doc.attribute("a", "synced"), Some(""));
        assert_eq!(doc.attribute("b", "failed"), Some(""));
        assert_eq!(f.client.stats().rejections, 1);
        assert!(matches!(
            f.client.field_result(&"b".into()),
            Err(SyncError::ServerRejection { .. })
        ));
    }

    #[test]
    fn unrelated_ack_leaves_status() {
        let mut f = fixture(FORM);
        f.client.update("a", "1").unwrap();
        f.client.on_message(f.conn, r#"{"valid":{"id":"b"}}"#);
        assert_eq!(f.client.status(&"a".into()), FieldStatus::Syncing);
    }

    #[test]
    fn last_write_wins_within_message() {
        let mut f = fixture(FORM);
        f.client.update("a", "1").unwrap();
        f.client
            .on_message(f.conn, r#"[{"valid":{"id":"a"}},{"invalid":{"id":"a"}}]"#);
        assert_eq!(f.client.status(&"a".into()), FieldStatus::Failed);
        assert_eq!(f.client.document().attribute("a", "synced"), None);
    }

    #[test]
    fn stale_ack_is_applied() {
        let mut f = fixture(FORM);
        f.client.update("a", "1").unwrap();
        f.client.update("a", "12").unwrap();
        // ack for the first edit lands while the second is in flight
        f.client.on_message(f.conn, r#"{"valid":{"id":"a"}}"#);
        assert_eq!(f.client.status(&"a".into()), FieldStatus::Synced);
    }

    #[test]
    fn class_markers() {
        let config = ClientConfig::new(Endpoint::new("ws://test/")).with_markers(StatusMarkers::classes());
        let mut f = fixture_with(config, r#"<input id="a" class="input">"#);
        f.client.update("a", "x").unwrap();
        assert!(f.client.document().has_class("a", "is-loading"));
        f.client.on_message(f.conn, r#"{"invalid":{"id":"a"}}"#);
        assert!(!f.client.document().has_class("a", "is-loading"));
        assert!(f.client.document().has_class("a", "is-danger"));
        assert!(f.client.document().has_class("a", "input"));
    }

    #[test]
    fn press_then_replace() {
        let mut f = fixture(FORM);
        f.client.press("submit").unwrap();
        assert_eq!(f.transport.sent(), vec![r#"{"press":{"id":"submit"}}"#]);

        f.client
            .on_message(f.conn, r#"{"replace":{"id":"panel","html":"<p>ok</p>"}}"#);
        assert_eq!(f.client.document().inner_html("panel").unwrap(), "<p>ok</p>");
    }

    #[test]
    fn not_connected_leaves_status_idle() {
        let mut f = fixture(FORM);
        f.client.on_close(f.conn, None);
        assert!(matches!(f.client.update("a", "x"), Err(SyncError::NotConnected)));
        assert_eq!(f.client.status(&"a".into()), FieldStatus::Idle);
        assert!(f.transport.sent().is_empty());
    }

    #[test]
    fn malformed_message_is_dropped() {
        let mut f = fixture(FORM);
        let before = f.client.document().clone();
        f.client.on_message(f.conn, "{not json");
        assert_eq!(f.client.stats().decode_failures, 1);
        assert_eq!(f.client.document(), &before);
        assert_eq!(f.client.state(), ConnectionState::Open);
    }

    #[test]
    fn replay_is_harmless() {
        let mut f = fixture(FORM);
        let message = r#"[{"remove":{"id":"b"}},{"replace":{"id":"panel","html":"<i>1</i>"}}]"#;
        f.client.on_message(f.conn, message);
        let once = f.client.document().clone();
        f.client.on_message(f.conn, message);
        assert_eq!(f.client.document(), &once);
        assert_eq!(f.client.stats().targets_missing, 1);
    }

    #[test]
    fn removed_fields_are_forgotten() {
        let mut f = fixture(FORM);
        f.client.update("a", "x").unwrap();
        f.client.update("b", "y").unwrap();
        f.client.on_message(f.conn, r#"{"remove":{"id":"a"}}"#);
        assert_eq!(f.client.fields().len(), 1);

        f.client.on_message(f.conn, r#"{"valid":{"id":"a"}}"#);
        assert_eq!(f.client.status(&"a".into()), FieldStatus::Idle);
        assert_eq!(f.client.stats().targets_missing, 1);
    }

    #[test]
    fn rerendered_field_keeps_its_marker() {
        let mut f = fixture(FORM);
        f.client.update("a", "x").unwrap();
        f.client.on_message(
            f.conn,
            r#"{"replace":{"id":"form","html":"<input id=\"a\"><input id=\"b\">"}}"#,
        );
        assert_eq!(f.client.status(&"a".into()), FieldStatus::Syncing);
        assert_eq!(f.client.document().attribute("a", "syncing"), Some(""));
        assert_eq!(f.client.document().attribute("b", "syncing"), None);

        f.client.on_message(f.conn, r#"{"invalid":{"id":"a"}}"#);
        f.client.on_message(f.conn, r#"{"replace":{"id":"form","html":"<input id=\"a\">"}}"#);
        assert_eq!(f.client.status(&"a".into()), FieldStatus::Failed);
        assert_eq!(f.client.document().attribute("a", "failed"), Some(""));
        assert_eq!(f.client.document().attribute("a", "syncing"), None);
    }

    #[test]
    fn close_schedules_one_retry() {
        let mut f = fixture(FORM);
        f.client.on_close(f.conn, Some("bye".into()));
        f.client.on_error(f.conn, "after close");
        assert_eq!(f.timer.scheduled(), vec![Duration::from_secs(1)]);
        assert_eq!(f.transport.connect_count(), 1);

        f.timer.fire();
        assert!(f.client.on_retry_timer());
        assert!(!f.client.on_retry_timer());
        assert_eq!(f.transport.connect_count(), 2);
        assert_eq!(f.client.state(), ConnectionState::Connecting);
    }

    #[test]
    fn error_then_close_notifies_once() {
        let mut f = fixture(FORM);
        f.client.on_error(f.conn, "reset");
        f.client.on_close(f.conn, None);
        assert_eq!(f.notices.notices(), vec![Notice::ConnectionFailed]);
        assert_eq!(f.timer.scheduled().len(), 1);
    }

    #[test]
    fn reconnect_resets_and_notifies() {
        let mut f = fixture(FORM);
        f.client.on_close(f.conn, None);
        f.client.on_retry_timer();
        let conn = f.client.connection().unwrap();
        assert_ne!(conn, f.conn);
        f.client.on_open(conn);

        assert_eq!(f.client.state(), ConnectionState::Open);
        assert_eq!(
            f.notices.notices(),
            vec![Notice::ConnectionLost { reason: None }, Notice::Reconnected]
        );
        assert_eq!(f.client.stats().reconnect_attempts, 1);
    }

    #[test]
    fn superseded_connection_events_are_ignored() {
        let mut f = fixture(FORM);
        let old = f.conn;
        let new = f.client.connect();
        f.client.on_open(new);

        f.client.on_close(old, None);
        f.client.on_message(old, r#"{"remove":{"id":"panel"}}"#);
        assert_eq!(f.client.state(), ConnectionState::Open);
        assert!(f.client.document().element("panel").is_some());
        assert_eq!(f.client.stats().stale_events, 2);
        assert!(f.timer.scheduled().is_empty());
    }

    #[test]
    fn disabled_policy_never_retries() {
        let config =
            ClientConfig::new(Endpoint::new("ws://test/")).with_reconnect(ReconnectConfig::disabled());
        let mut f = fixture_with(config, FORM);
        f.client.on_close(f.conn, None);
        assert!(f.timer.scheduled().is_empty());
        assert!(!f.client.on_retry_timer());
        assert_eq!(f.transport.connect_count(), 1);
    }

    #[test]
    fn explicit_close_cancels_retry() {
        let mut f = fixture(FORM);
        f.client.on_error(f.conn, "reset");
        assert!(f.client.pending_retry().is_some());

        f.client.close();
        assert_eq!(f.client.pending_retry(), None);
        assert_eq!(f.timer.armed(), None);
        assert_eq!(f.transport.close_count(), 1);
        assert!(!f.client.on_retry_timer());
    }

    #[test]
    fn failed_reconnect_schedules_again() {
        let mut f = fixture(FORM);
        f.client.on_close(f.conn, None);
        f.timer.fire();
        f.client.on_retry_timer();
        let conn = f.client.connection().unwrap();
        f.client.on_error(conn, "refused");
        f.client.on_close(conn, None);
        assert_eq!(f.timer.scheduled().len(), 2);
        assert_eq!(
            f.notices.notices(),
            vec![Notice::ConnectionLost { reason: None }, Notice::ConnectionFailed]
        );
    }

    #[test]
    fn new_content_refreshes_root() {
        let config = ClientConfig::new(Endpoint::new("ws://test/")).with_root_id("app");
        let mut f = fixture_with(config, r#"<div id="app"><p>loading</p></div>"#);
        f.client
            .on_message(f.conn, r#"{"newContent":{"content":"<input id=\"n\">"}}"#);
        assert_eq!(f.client.document().inner_html("app").unwrap(), r#"<input id="n">"#);
    }
}
