//! Drives a [`TimelineController`] from a [`Scheduler`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, error};

use crate::config::PhaseDelays;
use crate::scheduler::Scheduler;
use crate::script::{Script, ScriptError, Step};
use crate::timeline::{Fired, Phase, Ticket, TimelineController, TimelineSnapshot, Timer};

struct Shared<S: Scheduler> {
    timeline: TimelineController,
    scheduler: S,
    // At most one timer is outstanding at any time.
    armed: Option<S::Handle>,
}

/// Cloneable handle to a running loader timeline.
///
/// Timer callbacks only hold a weak reference: once every `Loader` handle
/// is dropped, late timers find nothing to drive and do nothing.
pub struct Loader<S: Scheduler> {
    shared: Rc<RefCell<Shared<S>>>,
}

impl<S: Scheduler> Clone for Loader<S> {
    fn clone(&self) -> Self {
        Self { shared: Rc::clone(&self.shared) }
    }
}

impl<S: Scheduler + 'static> Loader<S> {
    pub fn new(delays: PhaseDelays, scheduler: S) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                timeline: TimelineController::new(delays),
                scheduler,
                armed: None,
            })),
        }
    }

    /// Registers a presenter callback.
    ///
    /// Subscribers run while the loader is busy updating: they get the new
    /// snapshot as an argument and must not call back into this loader.
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: FnMut(&TimelineSnapshot) + 'static,
    {
        self.shared.borrow_mut().timeline.subscribe(subscriber);
    }

    /// Validates `steps` and arms the first hold.
    pub fn start<F>(&self, steps: Vec<Step>, on_complete: F) -> Result<(), ScriptError>
    where
        F: FnOnce() + 'static,
    {
        let script = Script::new(steps)?;
        self.start_script(script, on_complete);
        Ok(())
    }

    pub fn start_script<F>(&self, script: Script, on_complete: F)
    where
        F: FnOnce() + 'static,
    {
        let timer = {
            let mut shared = self.shared.borrow_mut();
            if let Some(handle) = shared.armed.take() {
                shared.scheduler.disarm(handle);
            }
            shared.timeline.start_script(script, on_complete)
        };
        arm(&self.shared, timer);
    }

    /// Stops for good; the completion callback will not run.
    pub fn cancel(&self) {
        let mut shared = self.shared.borrow_mut();
        shared.timeline.cancel();
        if let Some(handle) = shared.armed.take() {
            debug!("disarming loader timer {handle:?}");
            shared.scheduler.disarm(handle);
        }
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        self.shared.borrow().timeline.snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.shared.borrow().timeline.phase()
    }

    /// Delays the timeline was configured with.
    pub fn delays(&self) -> PhaseDelays {
        self.shared.borrow().timeline.delays()
    }

    /// Completed or cancelled.
    pub fn is_finished(&self) -> bool {
        self.phase().is_terminal()
    }
}

fn arm<S: Scheduler + 'static>(shared: &Rc<RefCell<Shared<S>>>, timer: Timer) {
    let weak: Weak<RefCell<Shared<S>>> = Rc::downgrade(shared);
    let ticket = timer.ticket;
    let fallback = {
        let mut guard = shared.borrow_mut();
        let armed = guard.scheduler.arm(
            timer.delay_ms,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    on_timer(&shared, ticket);
                }
            }),
        );
        match armed {
            Ok(handle) => {
                guard.armed = Some(handle);
                None
            }
            // Without a timer the chain would stall; skip to the hand-off.
            Err(err) => {
                error!("{err}; finishing the loader early");
                guard.timeline.finish_now()
            }
        }
    };
    if let Some(on_complete) = fallback {
        on_complete();
    }
}

fn on_timer<S: Scheduler + 'static>(shared: &Rc<RefCell<Shared<S>>>, ticket: Ticket) {
    let fired = {
        let mut guard = shared.borrow_mut();
        let fired = guard.timeline.fire(ticket);
        if !matches!(fired, Fired::Stale) {
            guard.armed = None;
        }
        fired
    };
    match fired {
        Fired::Stale => {}
        Fired::Next(timer) => arm(shared, timer),
        // Run outside the borrow: the host usually tears the loader down here.
        Fired::Completed(Some(on_complete)) => on_complete(),
        Fired::Completed(None) => {}
    }
}
