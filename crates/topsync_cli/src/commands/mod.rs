//! CLI command implementations.

pub mod connect;
pub mod decode;
pub mod encode;
