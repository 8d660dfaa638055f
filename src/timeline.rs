//! Loader timeline state machine.
//!
//! The controller never touches a clock. Every transition hands back the
//! next one-shot [`Timer`] the caller has to arm; when it expires the caller
//! passes its [`Ticket`] to [`TimelineController::fire`]. Tickets carry the
//! generation and phase they were issued for, so a timer that outlives a
//! `cancel` (or a restart) is recognised and dropped.
//!
//! Phase order:
//!
//! ```text
//! Advancing(0) -> .. -> Advancing(n-1) -> PreZoom -> PreSplit -> PreComplete -> Completed
//! ```

use log::{debug, info, trace};

use crate::config::PhaseDelays;
use crate::script::{Script, ScriptError, Step};

/// Where the timeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started yet.
    Idle,
    /// Showing the step at this index, waiting for its hold to elapse.
    Advancing(usize),
    /// Every hold has elapsed; waiting to trigger the zoom.
    PreZoom,
    /// Zoom triggered; waiting to trigger the split.
    PreSplit,
    /// Split triggered; waiting to complete.
    PreComplete,
    Completed,
    Cancelled,
}

impl Phase {
    /// No timer will ever move the timeline out of this phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Cancelled)
    }
}

/// Identifies the transition a timer was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    phase: Phase,
}

impl Ticket {
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// A one-shot timer the caller must arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub delay_ms: u32,
    pub ticket: Ticket,
}

pub type CompletionFn = Box<dyn FnOnce()>;
pub type SubscriberFn = Box<dyn FnMut(&TimelineSnapshot)>;

/// Result of handing a ticket to [`TimelineController::fire`].
pub enum Fired {
    /// The ticket belonged to a superseded schedule; nothing changed.
    Stale,
    /// One transition happened; arm this timer next.
    Next(Timer),
    /// The timeline just completed. The caller invokes the callback, once,
    /// after releasing whatever borrow it holds on the controller.
    Completed(Option<CompletionFn>),
}

impl std::fmt::Debug for Fired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fired::Stale => f.write_str("Stale"),
            Fired::Next(timer) => f.debug_tuple("Next").field(timer).finish(),
            Fired::Completed(cb) => f.debug_tuple("Completed").field(&cb.is_some()).finish(),
        }
    }
}

/// What the presenter gets to see.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSnapshot {
    /// Word on screen. Stays on the final word through zoom and split.
    ///
    /// `None` once completed. The only other `None` is the idle snapshot of
    /// a controller that was never started, which has no script to show;
    /// from `start` until completion a step is always present.
    pub current_step: Option<Step>,
    /// Cursor into the script; `None` before start and once past the end.
    pub active_index: Option<usize>,
    pub zoom_triggered: bool,
    pub split_triggered: bool,
    pub completed: bool,
    /// Share of words revealed so far, 0 to 100.
    pub progress_percent: f32,
}

/// Owns the timeline state; see the module docs for the driving protocol.
pub struct TimelineController {
    delays: PhaseDelays,
    script: Option<Script>,
    phase: Phase,
    generation: u64,
    // Equals the script length once every hold has elapsed.
    cursor: usize,
    zoom_triggered: bool,
    split_triggered: bool,
    completed: bool,
    on_complete: Option<CompletionFn>,
    subscribers: Vec<SubscriberFn>,
}

impl TimelineController {
    pub fn new(delays: PhaseDelays) -> Self {
        Self {
            delays,
            script: None,
            phase: Phase::Idle,
            generation: 0,
            cursor: 0,
            zoom_triggered: false,
            split_triggered: false,
            completed: false,
            on_complete: None,
            subscribers: Vec::new(),
        }
    }

    /// Validates `steps` and starts the schedule.
    ///
    /// A malformed script is rejected before anything changes.
    pub fn start<F>(&mut self, steps: Vec<Step>, on_complete: F) -> Result<Timer, ScriptError>
    where
        F: FnOnce() + 'static,
    {
        let script = Script::new(steps)?;
        Ok(self.start_script(script, on_complete))
    }

    /// Starts the schedule from the first step and returns its hold timer.
    ///
    /// The controller is single use; calling this again restarts from
    /// scratch and orphans every outstanding ticket.
    pub fn start_script<F>(&mut self, script: Script, on_complete: F) -> Timer
    where
        F: FnOnce() + 'static,
    {
        info!(
            "loader timeline starting: {} steps, {}ms of holds",
            script.len(),
            script.total_hold_ms()
        );
        self.generation += 1;
        self.script = Some(script);
        self.cursor = 0;
        self.zoom_triggered = false;
        self.split_triggered = false;
        self.completed = false;
        self.on_complete = Some(Box::new(on_complete));
        self.phase = Phase::Advancing(0);
        self.notify();
        self.timer_for_phase()
    }

    /// Handles an expired timer.
    pub fn fire(&mut self, ticket: Ticket) -> Fired {
        if ticket.generation != self.generation || ticket.phase != self.phase {
            trace!("dropping stale loader timer {ticket:?} (now {:?})", self.phase);
            return Fired::Stale;
        }

        let len = self.script.as_ref().map_or(0, Script::len);
        self.phase = match self.phase {
            Phase::Advancing(index) => {
                self.cursor = index + 1;
                if self.cursor < len {
                    Phase::Advancing(self.cursor)
                } else {
                    Phase::PreZoom
                }
            }
            Phase::PreZoom => {
                self.zoom_triggered = true;
                Phase::PreSplit
            }
            Phase::PreSplit => {
                self.split_triggered = true;
                Phase::PreComplete
            }
            Phase::PreComplete => {
                self.completed = true;
                Phase::Completed
            }
            // A terminal or idle phase never issues tickets.
            Phase::Idle | Phase::Completed | Phase::Cancelled => return Fired::Stale,
        };
        debug!("loader timeline -> {:?}", self.phase);
        self.notify();

        if self.phase == Phase::Completed {
            info!("loader timeline completed");
            Fired::Completed(self.on_complete.take())
        } else {
            Fired::Next(self.timer_for_phase())
        }
    }

    /// Stops the timeline for good without running the completion callback.
    ///
    /// Every ticket issued so far becomes stale. The observable state stays
    /// as it was at the moment of cancellation.
    pub fn cancel(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        info!("loader timeline cancelled in {:?}", self.phase);
        self.generation += 1;
        self.phase = Phase::Cancelled;
        self.on_complete = None;
    }

    /// Jumps straight to `Completed` when the schedule cannot go on, e.g.
    /// because the clock refused to arm the next timer.
    ///
    /// Sets every remaining flag in order, notifies subscribers once and
    /// hands back the completion callback so the host still gets its
    /// hand-off. Outstanding tickets become stale. Returns `None` when idle
    /// or already terminal.
    pub fn finish_now(&mut self) -> Option<CompletionFn> {
        if self.script.is_none() || self.phase.is_terminal() {
            return None;
        }
        info!("loader timeline finishing early from {:?}", self.phase);
        self.generation += 1;
        self.cursor = self.script.as_ref().map_or(0, Script::len);
        self.zoom_triggered = true;
        self.split_triggered = true;
        self.completed = true;
        self.phase = Phase::Completed;
        self.notify();
        self.on_complete.take()
    }

    /// Calls `subscriber` after every observable change.
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&TimelineSnapshot) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn delays(&self) -> PhaseDelays {
        self.delays
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        let Some(script) = self.script.as_ref() else {
            return TimelineSnapshot {
                current_step: None,
                active_index: None,
                zoom_triggered: false,
                split_triggered: false,
                completed: false,
                progress_percent: 0.0,
            };
        };

        let len = script.len();
        let active_index = (self.cursor < len).then_some(self.cursor);
        let current_step = if self.completed {
            None
        } else {
            // Past the end the final word stays up for the zoom and split.
            script.get(self.cursor.min(len - 1)).cloned()
        };
        let revealed = (self.cursor + 1).min(len);

        TimelineSnapshot {
            current_step,
            active_index,
            zoom_triggered: self.zoom_triggered,
            split_triggered: self.split_triggered,
            completed: self.completed,
            progress_percent: revealed as f32 * 100.0 / len as f32,
        }
    }

    fn timer_for_phase(&self) -> Timer {
        let delay_ms = match self.phase {
            Phase::Advancing(index) => self
                .script
                .as_ref()
                .and_then(|s| s.get(index))
                .map_or(0, |step| step.hold_ms),
            Phase::PreZoom => self.delays.pre_zoom_ms,
            Phase::PreSplit => self.delays.pre_split_ms,
            Phase::PreComplete => self.delays.pre_complete_ms,
            Phase::Idle | Phase::Completed | Phase::Cancelled => 0,
        };
        Timer {
            delay_ms,
            ticket: Ticket { generation: self.generation, phase: self.phase },
        }
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for subscriber in &mut self.subscribers {
            subscriber(&snapshot);
        }
    }
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new(PhaseDelays::default())
    }
}
