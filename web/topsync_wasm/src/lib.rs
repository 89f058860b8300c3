//! # topsync WASM
//!
//! Browser bindings for topsync live documents.
//!
//! The sync client runs against the page's own DOM:
//! - [`DomDocument`] applies patches with `innerHTML`, `outerHTML`,
//!   `insertAdjacentHTML` and `Element.remove()`
//! - [`BrowserTransport`] talks to the server over a `WebSocket`
//! - [`BrowserTimer`] schedules reconnects with `setTimeout`
//! - [`AlertNotifier`] tells the user about lost connections
//!
//! ## Usage
//!
//! ```javascript
//! import init, { LiveView } from 'topsync_wasm';
//!
//! await init();
//! const view = new LiveView("/ws", 1000, false);
//! view.connect();
//!
//! document.getElementById("name")
//!     .addEventListener("change", (ev) => view.updateInput(ev.target));
//! document.getElementById("submit")
//!     .addEventListener("click", () => view.press("submit"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dom;
mod error;
mod notifier;
mod timer;
mod transport;
mod utils;

pub use dom::DomDocument;
pub use error::*;
pub use notifier::AlertNotifier;
pub use timer::BrowserTimer;
pub use transport::{BrowserTransport, Dispatcher};

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use topsync_client::{
    ClientConfig, ConnectionState, Endpoint, EndpointPath, FieldStatus, ReconnectConfig,
    StatusMarkers, SyncClient,
};
use topsync_protocol::NodeId;
use wasm_bindgen::prelude::*;
use web_sys::HtmlInputElement;

type BrowserClient = SyncClient<BrowserTransport, DomDocument>;

/// Initialize the WASM module.
///
/// This sets up panic hooks for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    utils::set_panic_hook();
}

/// A live document bound to the current page.
#[wasm_bindgen]
pub struct LiveView {
    client: Rc<RefCell<BrowserClient>>,
}

#[wasm_bindgen]
impl LiveView {
    /// Creates a view for the current page.
    ///
    /// `fixedPath` selects the server path (the page's own path when
    /// omitted). `retryMs` is the fixed reconnect delay; pass `0` to never
    /// reconnect. `classMarkers` mirrors field status as classes instead of
    /// attributes.
    #[wasm_bindgen(constructor)]
    pub fn new(
        fixed_path: Option<String>,
        retry_ms: Option<u32>,
        class_markers: Option<bool>,
    ) -> Result<LiveView, JsValue> {
        Ok(Self::build(fixed_path, retry_ms, class_markers.unwrap_or(false))?)
    }

    /// Opens the connection, superseding any previous one.
    pub fn connect(&self) -> Result<(), JsValue> {
        self.with_client(|client| {
            client.connect();
        })?;
        Ok(())
    }

    /// Closes the connection. No reconnect follows.
    pub fn close(&self) -> Result<(), JsValue> {
        self.with_client(BrowserClient::close)?;
        Ok(())
    }

    /// Sends a field update.
    pub fn update(&self, id: &str, value: &str) -> Result<(), JsValue> {
        self.with_client(|client| client.update(id, value))?
            .map_err(WasmError::from)?;
        Ok(())
    }

    /// Sends an update with the input's id and current value.
    #[wasm_bindgen(js_name = updateInput)]
    pub fn update_input(&self, input: &HtmlInputElement) -> Result<(), JsValue> {
        self.update(&input.id(), &input.value())
    }

    /// Sends a button press.
    pub fn press(&self, id: &str) -> Result<(), JsValue> {
        self.with_client(|client| client.press(id))?
            .map_err(WasmError::from)?;
        Ok(())
    }

    /// Returns a field's status: `idle`, `syncing`, `synced` or `failed`.
    pub fn status(&self, id: &str) -> Result<String, JsValue> {
        let status = self.with_client(|client| client.status(&NodeId::from(id)))?;
        Ok(status_name(status).to_string())
    }

    /// Returns the connection state: `connecting`, `open` or `closed`.
    pub fn state(&self) -> Result<String, JsValue> {
        let state = self.with_client(|client| client.state())?;
        Ok(state_name(state).to_string())
    }
}

impl LiveView {
    fn build(
        fixed_path: Option<String>,
        retry_ms: Option<u32>,
        class_markers: bool,
    ) -> WasmResult<Self> {
        let window = utils::window().ok_or_else(|| WasmError::NotSupported("window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| WasmError::NotSupported("document".into()))?;
        let href = window.location().href()?;

        let path = fixed_path.map_or(EndpointPath::SamePath, EndpointPath::Fixed);
        let endpoint = Endpoint::from_page(&href, path)?;
        let reconnect = match retry_ms {
            Some(0) => ReconnectConfig::disabled(),
            Some(ms) => ReconnectConfig::fixed(Duration::from_millis(ms.into())),
            None => ReconnectConfig::default(),
        };
        let markers = if class_markers {
            StatusMarkers::classes()
        } else {
            StatusMarkers::attributes()
        };
        let config = ClientConfig::new(endpoint)
            .with_reconnect(reconnect)
            .with_markers(markers);

        let dispatcher = Dispatcher::new();
        let timer = BrowserTimer::new(window.clone());
        let fire = Rc::new(RefCell::new(None::<Weak<RefCell<BrowserClient>>>));
        {
            let fire = fire.clone();
            timer.on_fire(move || {
                if let Some(client) = fire.borrow().as_ref().and_then(Weak::upgrade) {
                    match client.try_borrow_mut() {
                        Ok(mut client) => {
                            client.on_retry_timer();
                        }
                        Err(_) => web_sys::console::warn_1(&"retry fired while busy".into()),
                    }
                }
            });
        }

        let client = SyncClient::new(
            config,
            BrowserTransport::new(dispatcher.clone()),
            DomDocument::new(document),
            timer,
        )
        .with_notifier(AlertNotifier::new(window));
        let client = Rc::new(RefCell::new(client));
        *fire.borrow_mut() = Some(Rc::downgrade(&client));

        let weak = Rc::downgrade(&client);
        dispatcher.set(move |conn, event| {
            let Some(client) = weak.upgrade() else {
                return;
            };
            match client.try_borrow_mut() {
                Ok(mut client) => client.handle(conn, event),
                Err(_) => web_sys::console::warn_1(&"transport event while busy".into()),
            };
        });

        Ok(Self { client })
    }

    fn with_client<R>(&self, f: impl FnOnce(&mut BrowserClient) -> R) -> WasmResult<R> {
        let mut client = self.client.try_borrow_mut().map_err(|_| WasmError::Busy)?;
        Ok(f(&mut client))
    }
}

fn status_name(status: FieldStatus) -> &'static str {
    match status {
        FieldStatus::Idle => "idle",
        FieldStatus::Syncing => "syncing",
        FieldStatus::Synced => "synced",
        FieldStatus::Failed => "failed",
    }
}

fn state_name(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connecting => "connecting",
        ConnectionState::Open => "open",
        ConnectionState::Closed => "closed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_markers() {
        assert_eq!(status_name(FieldStatus::Syncing), "syncing");
        assert_eq!(status_name(FieldStatus::Failed), "failed");
        assert_eq!(state_name(ConnectionState::Open), "open");
    }
}
