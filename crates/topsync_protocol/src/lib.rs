//! # topsync Protocol
//!
//! Wire types and JSON codecs for the topsync live-document protocol.
//!
//! This crate provides:
//! - `NodeId` for addressing document elements
//! - `Action` for outbound user actions (field updates, button presses)
//! - `Instruction` for inbound patch instructions
//! - JSON encoding/decoding for both directions
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Wire format
//!
//! Outbound, one message per user action:
//!
//! ```text
//! {"update": {"id": "<field-id>", "value": "<string>"}}
//! {"press":  {"id": "<button-id>"}}
//! ```
//!
//! Inbound, a single object, an array of objects, or an `Ok`/`Err` envelope
//! around either. See [`decode_instructions`] for the accepted tags.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod error;
mod id;
mod instruction;

pub use action::Action;
pub use error::{ProtocolError, ProtocolResult};
pub use id::NodeId;
pub use instruction::{decode_instructions, encode_instructions, Instruction, InstructionKind};
