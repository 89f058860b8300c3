//! Utility functions for WASM setup.

/// Sets up the panic hook for better error messages.
///
/// Called when the module initializes. Redirects Rust panic messages to the
/// browser console.
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Returns the global `window`.
pub fn window() -> Option<web_sys::Window> {
    web_sys::window()
}
