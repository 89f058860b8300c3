//! # topsync Client
//!
//! Client-side sync agent for topsync live documents.
//!
//! This crate provides:
//! - Connection lifecycle state machine (connecting → open → closed)
//! - Patch application (replace, append, remove, newContent)
//! - Per-field sync status (idle → syncing → synced / failed)
//! - Reconnection with a single pending retry
//! - Capability traits for the document, transport, timer and notifier
//! - In-memory document and mock transport for tests and tooling
//!
//! ## Architecture
//!
//! The client is sans-IO. It owns a [`Transport`], a [`Document`] and a
//! [`RetryTimer`], and is driven entirely by callbacks:
//! 1. User actions call [`SyncClient::update`] / [`SyncClient::press`]
//! 2. Transport events are fed to [`SyncClient::handle`]
//! 3. The retry timer calls [`SyncClient::on_retry_timer`]
//!
//! ## Key Invariants
//!
//! - Server is authoritative over the document
//! - Instructions apply in message order, within and across messages
//! - A missing target is a no-op, so replays are harmless
//! - At most one reconnect is pending at a time
//! - Events from a superseded connection are ignored

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod applier;
mod client;
mod config;
mod document;
mod endpoint;
mod error;
mod memory;
mod notice;
mod reconnect;
mod status;
mod transport;

pub use applier::PatchApplier;
pub use client::{ClientStats, SyncClient};
pub use config::{ClientConfig, ReconnectConfig, ReplaceMode, DEFAULT_ROOT_ID};
pub use document::{Document, Flag};
pub use endpoint::{Endpoint, EndpointPath};
pub use error::{DocumentError, SyncError, SyncResult};
pub use memory::{parse_fragment, Element, MemoryDocument, Node, MAX_DEPTH};
pub use notice::{LogNotifier, Notice, Notifier, RecordingNotifier};
pub use reconnect::{ManualTimer, Reconnector, RetryTimer};
pub use status::{FieldStatus, FieldTracker, StatusMarkers};
pub use transport::{ConnectionId, ConnectionState, MockTransport, Transport, TransportEvent};

pub use topsync_protocol::{Action, Instruction, NodeId};
