//! # topsync WebSocket
//!
//! Tokio runtime bindings for the topsync client.
//!
//! This crate provides:
//! - `WsTransport`, a [`Transport`](topsync_client::Transport) over tokio-tungstenite
//! - `TokioTimer`, a deadline-based retry timer
//! - `Session`, the loop that feeds transport events, user actions and
//!   retry deadlines to a [`SyncClient`](topsync_client::SyncClient)

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod session;
mod timer;
mod transport;

pub use session::{Session, WsClient};
pub use timer::TokioTimer;
pub use transport::{Event, EventReceiver, WsTransport};
