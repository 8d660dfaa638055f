//! [`Scheduler`] backed by `window.setTimeout`.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::{ScheduleError, Scheduler};

pub struct WindowScheduler {
    window: Window,
}

impl WindowScheduler {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Scheduler for WindowScheduler {
    /// Browser timeout id.
    type Handle = i32;

    fn arm(&mut self, delay_ms: u32, fire: Box<dyn FnOnce()>) -> Result<i32, ScheduleError> {
        // Frees itself after the single call.
        let callback = Closure::once_into_js(move || fire());
        let timeout = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), timeout)
            .map_err(|err| ScheduleError::Unavailable(format!("setTimeout failed: {err:?}")))
    }

    fn disarm(&mut self, handle: i32) {
        self.window.clear_timeout_with_handle(handle);
    }
}
