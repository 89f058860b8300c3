//! # topsync Testkit
//!
//! Test utilities for topsync.
//!
//! This crate provides:
//! - A scripted client harness over mock capabilities
//! - Property-based test generators using proptest
//! - Wire test vectors shared with other implementations
//! - Fuzz testing harnesses
//!
//! ## Usage
//!
//! ```rust
//! use topsync_testkit::prelude::*;
//! use topsync_client::FieldStatus;
//!
//! let mut harness = Harness::connected();
//! harness.client.update("a", "hello").unwrap();
//! harness.receive(r#"{"valid":{"id":"a"}}"#);
//! assert_eq!(harness.status("a"), FieldStatus::Synced);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use vectors::*;
