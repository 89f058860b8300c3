//! `setTimeout`-based retry timer.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use topsync_client::RetryTimer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

type Fire = Rc<RefCell<Option<Box<dyn FnMut()>>>>;

/// A [`RetryTimer`] backed by `window.setTimeout`.
///
/// One callback closure lives as long as the timer and is reused for every
/// schedule, so firing never drops the closure that is running.
pub struct BrowserTimer {
    window: web_sys::Window,
    handle: Rc<RefCell<Option<i32>>>,
    fire: Fire,
    callback: Closure<dyn FnMut()>,
}

impl BrowserTimer {
    /// Creates an unarmed timer.
    pub fn new(window: web_sys::Window) -> Self {
        let handle: Rc<RefCell<Option<i32>>> = Rc::default();
        let fire: Fire = Rc::default();
        let callback = {
            let handle = handle.clone();
            let fire = fire.clone();
            Closure::<dyn FnMut()>::new(move || {
                handle.borrow_mut().take();
                if let Some(f) = fire.borrow_mut().as_mut() {
                    f();
                }
            })
        };
        Self {
            window,
            handle,
            fire,
            callback,
        }
    }

    /// Sets what runs when the timer fires.
    pub fn on_fire(&self, f: impl FnMut() + 'static) {
        *self.fire.borrow_mut() = Some(Box::new(f));
    }

    /// Returns true while a timeout is armed.
    pub fn is_armed(&self) -> bool {
        self.handle.borrow().is_some()
    }
}

impl RetryTimer for BrowserTimer {
    fn schedule(&mut self, delay: Duration) {
        self.cancel();
        let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                self.callback.as_ref().unchecked_ref(),
                ms,
            ) {
            Ok(id) => *self.handle.borrow_mut() = Some(id),
            Err(e) => web_sys::console::error_2(&"failed to arm retry timer".into(), &e),
        }
    }

    fn cancel(&mut self) {
        if let Some(id) = self.handle.borrow_mut().take() {
            self.window.clear_timeout_with_handle(id);
        }
    }
}

impl Drop for BrowserTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
