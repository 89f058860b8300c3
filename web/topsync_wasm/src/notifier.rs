//! Browser notices.

use topsync_client::{Notice, Notifier};

/// Shows failures and losses with `window.alert`; logs reconnects to the
/// console.
#[derive(Debug, Clone)]
pub struct AlertNotifier {
    window: web_sys::Window,
}

impl AlertNotifier {
    /// Creates a notifier for the given window.
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }
}

impl Notifier for AlertNotifier {
    fn notify(&mut self, notice: Notice) {
        let text = notice.to_string();
        match notice {
            Notice::Reconnected => web_sys::console::log_1(&text.into()),
            _ => {
                web_sys::console::warn_1(&text.as_str().into());
                if self.window.alert_with_message(&text).is_err() {
                    web_sys::console::error_1(&"alert failed".into());
                }
            }
        }
    }
}
