//! Error types for WASM bindings.

use thiserror::Error;
use topsync_client::SyncError;
use wasm_bindgen::prelude::*;

/// Errors that can occur in the WASM bindings.
#[derive(Debug, Error)]
pub enum WasmError {
    /// The sync client refused the operation.
    #[error("sync error: {0}")]
    Sync(String),

    /// A browser global (`window`, `document`) is unavailable.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// JavaScript error occurred.
    #[error("JS error: {0}")]
    JsError(String),

    /// The client is busy handling an event.
    #[error("client is busy")]
    Busy,
}

impl From<WasmError> for JsValue {
    fn from(err: WasmError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<JsValue> for WasmError {
    fn from(val: JsValue) -> Self {
        WasmError::JsError(val.as_string().unwrap_or_else(|| format!("{:?}", val)))
    }
}

impl From<SyncError> for WasmError {
    fn from(err: SyncError) -> Self {
        WasmError::Sync(err.to_string())
    }
}

/// Result type for WASM operations.
pub type WasmResult<T> = Result<T, WasmError>;
