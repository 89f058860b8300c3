//! WebSocket transport over tokio-tungstenite.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use topsync_client::{ConnectionId, Endpoint, Transport, TransportEvent};
use tracing::{debug, trace};

/// A lifecycle event tagged with the connection it belongs to.
pub type Event = (ConnectionId, TransportEvent);

/// Receiving side of the transport's event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// A [`Transport`] backed by a tokio task per connection.
///
/// Each `connect` aborts the previous connection task and spawns a new one.
/// Events are delivered on the receiver returned by [`WsTransport::new`].
/// Must be used inside a tokio runtime.
pub struct WsTransport {
    events: mpsc::UnboundedSender<Event>,
    last: ConnectionId,
    outgoing: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

impl WsTransport {
    /// Creates a transport and its event receiver.
    pub fn new() -> (Self, EventReceiver) {
        let (events, rx) = mpsc::unbounded_channel();
        let transport = Self {
            events,
            last: ConnectionId::default(),
            outgoing: None,
            task: None,
        };
        (transport, rx)
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Transport for WsTransport {
    fn connect(&mut self, endpoint: &Endpoint) -> ConnectionId {
        self.abort_task();
        self.last = self.last.next();
        let conn = self.last;

        let (outgoing, rx) = mpsc::unbounded_channel();
        self.outgoing = Some(outgoing);
        self.task = Some(tokio::spawn(run_connection(
            conn,
            endpoint.url().to_owned(),
            rx,
            self.events.clone(),
        )));
        conn
    }

    fn send(&mut self, message: String) {
        let delivered = self
            .outgoing
            .as_ref()
            .is_some_and(|tx| tx.send(message).is_ok());
        if !delivered {
            debug!("connection task gone, dropping outbound message");
        }
    }

    fn close(&mut self) {
        // dropping the sender makes the task send a close frame and exit
        self.outgoing = None;
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.abort_task();
    }
}

async fn run_connection(
    conn: ConnectionId,
    url: String,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<Event>,
) {
    let emit = |event: TransportEvent| {
        let _ = events.send((conn, event));
    };

    let mut ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            emit(TransportEvent::Error(e.to_string()));
            emit(TransportEvent::Close(None));
            return;
        }
    };
    debug!(%conn, url = %url, "websocket open");
    emit(TransportEvent::Open);

    loop {
        tokio::select! {
            out = outgoing.recv() => match out {
                Some(text) => {
                    if let Err(e) = ws.send(Message::Text(text.into())).await {
                        emit(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    let _ = ws.close(None).await;
                    break;
                }
            },
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    emit(TransportEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.as_str().to_owned())
                        .filter(|r| !r.is_empty());
                    emit(TransportEvent::Close(reason));
                    return;
                }
                Some(Ok(other)) => trace!(%conn, ?other, "ignoring non-text frame"),
                Some(Err(e)) => {
                    emit(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => break,
            },
        }
    }
    emit(TransportEvent::Close(None));
}
