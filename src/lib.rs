//! Cinematic intro loader: a scripted word sequence, then zoom, split and
//! hand-off to the landing page.
//!
//! The timeline itself is platform independent and runs against any
//! [`Scheduler`]; on wasm32 the `wasm` module drives it from browser timers
//! and renders it into the page.

pub mod config;
pub mod loader;
pub mod scheduler;
pub mod script;
pub mod style;
pub mod timeline;

pub use config::PhaseDelays;
pub use loader::Loader;
pub use scheduler::{ManualClock, ScheduleError, Scheduler};
pub use script::{Script, ScriptError, Step};
pub use timeline::{Fired, Phase, Ticket, TimelineController, TimelineSnapshot, Timer};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    //! Browser glue: timers, console logging and the DOM presenter.

    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement};

    use crate::{Loader, PhaseDelays, Script};

    mod console;
    mod presenter;
    mod timers;

    pub use presenter::Presenter;
    pub use timers::WindowScheduler;

    const MOUNT_ID: &str = "loader";
    const HOME_ID: &str = "home";
    const DELAY_KEYS: [&str; 3] = ["preZoomMs", "preSplitMs", "preCompleteMs"];

    thread_local! {
        // Keeps the running loader alive until it hands off.
        static ACTIVE: RefCell<Option<Loader<WindowScheduler>>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console::init();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let Some(mount) = document.get_element_by_id(MOUNT_ID) else {
            log::info!("no #{MOUNT_ID} element, skipping the intro");
            return Ok(());
        };
        let mount = mount.dyn_into::<HtmlElement>()?;

        let on_complete = {
            let document = document.clone();
            move || {
                if let Err(err) = hand_off(&document) {
                    log::error!("loader hand-off failed: {err:?}");
                }
                ACTIVE.with(|active| active.borrow_mut().take());
            }
        };
        let loader = mount_loader(&document, &mount, on_complete)?;
        ACTIVE.with(|active| *active.borrow_mut() = Some(loader));
        Ok(())
    }

    /// Renders the reference intro into `mount` and starts it.
    ///
    /// Delay overrides come from the element's `data-pre-zoom-ms`,
    /// `data-pre-split-ms` and `data-pre-complete-ms` attributes.
    pub fn mount_loader<F>(
        document: &Document,
        mount: &HtmlElement,
        on_complete: F,
    ) -> Result<Loader<WindowScheduler>, JsValue>
    where
        F: FnOnce() + 'static,
    {
        let window = web_sys::window().ok_or("no window")?;
        let dataset = mount.dataset();
        let overrides: Vec<(&str, String)> = DELAY_KEYS
            .iter()
            .filter_map(|&key| dataset.get(key).map(|value| (key, value)))
            .collect();
        let delays = PhaseDelays::default()
            .with_overrides(overrides.iter().map(|(k, v)| (*k, v.as_str())));

        let mut presenter = presenter::Presenter::mount(document, mount)?;
        let loader = Loader::new(delays, WindowScheduler::new(window));
        loader.subscribe(move |snapshot| {
            if let Err(err) = presenter.render(snapshot) {
                log::error!("loader render failed: {err:?}");
            }
        });
        loader.start_script(Script::reference(), on_complete);
        Ok(loader)
    }

    /// Stops the intro early, e.g. when the host navigates away.
    #[wasm_bindgen]
    pub fn cancel_loader() {
        if let Some(loader) = ACTIVE.with(|active| active.borrow_mut().take()) {
            loader.cancel();
        }
    }

    fn hand_off(document: &Document) -> Result<(), JsValue> {
        if let Some(mount) = document.get_element_by_id(MOUNT_ID) {
            mount.remove();
        }
        if let Some(home) = document.get_element_by_id(HOME_ID) {
            home.remove_attribute("hidden")?;
        }
        log::info!("loader handed off to the landing page");
        Ok(())
    }
}
