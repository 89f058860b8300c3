//! Event loop driving a [`SyncClient`] over [`WsTransport`].

use crate::timer::TokioTimer;
use crate::transport::{EventReceiver, WsTransport};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use topsync_client::{ClientConfig, ConnectionState, Document, Notifier, SyncClient};
use topsync_protocol::Action;
use tracing::{debug, warn};

/// Client type driven by a [`Session`].
pub type WsClient<D> = SyncClient<WsTransport, D>;

/// Owns a client, its transport events and its retry timer.
///
/// The loop serializes every callback onto one task, so the client's
/// handlers never overlap.
pub struct Session<D: Document> {
    client: WsClient<D>,
    events: EventReceiver,
    timer: TokioTimer,
    held: VecDeque<Action>,
}

impl<D: Document> Session<D> {
    /// Creates a session. Nothing happens until it runs.
    pub fn new(config: ClientConfig, document: D) -> Self {
        let (transport, events) = WsTransport::new();
        let timer = TokioTimer::new();
        let client = SyncClient::new(config, transport, document, timer.clone());
        Self {
            client,
            events,
            timer,
            held: VecDeque::new(),
        }
    }

    /// Sets the notifier for connection notices.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.client = self.client.with_notifier(notifier);
        self
    }

    /// Returns the client.
    pub fn client(&self) -> &WsClient<D> {
        &self.client
    }

    /// Number of actions waiting for the connection to open.
    pub fn held(&self) -> usize {
        self.held.len()
    }

    /// Returns the client mutably.
    pub fn client_mut(&mut self) -> &mut WsClient<D> {
        &mut self.client
    }

    /// Runs until `actions` closes, then closes the connection.
    pub async fn run(&mut self, actions: &mut mpsc::Receiver<Action>) {
        self.run_until(actions, |_| false).await
    }

    /// Runs until `done` returns true after some event, or `actions` closes.
    ///
    /// Connects first if the client has never connected. Actions that
    /// arrive while the connection is not open are held and sent once it
    /// opens. When `actions` closes the client is closed, whatever the
    /// connection state, and held actions are dropped.
    pub async fn run_until(
        &mut self,
        actions: &mut mpsc::Receiver<Action>,
        mut done: impl FnMut(&WsClient<D>) -> bool,
    ) {
        if self.client.connection().is_none() {
            self.client.connect();
        }

        loop {
            if self.client.state() == ConnectionState::Open {
                while let Some(action) = self.held.pop_front() {
                    self.send(action);
                }
            }
            if done(&self.client) {
                return;
            }
            let deadline = self.timer.deadline();

            tokio::select! {
                Some((conn, event)) = self.events.recv() => self.client.handle(conn, event),
                action = actions.recv() => match action {
                    Some(action) if self.client.state() == ConnectionState::Open => self.send(action),
                    Some(action) => {
                        debug!(kind = action.tag(), id = %action.id(), "holding action until connected");
                        self.held.push_back(action);
                    }
                    None => {
                        if !self.held.is_empty() {
                            warn!(dropped = self.held.len(), "session ended before actions were sent");
                            self.held.clear();
                        }
                        debug!("action channel closed, ending session");
                        self.client.close();
                        return;
                    }
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)),
                    if deadline.is_some() =>
                {
                    self.timer.clear();
                    self.client.on_retry_timer();
                }
            }
        }
    }

    fn send(&mut self, action: Action) {
        if let Err(e) = self.client.send(action) {
            warn!(error = %e, "action dropped");
        }
    }
}
