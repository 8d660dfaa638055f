//! One-shot timer seam between the timeline and a clock.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

/// The clock refused to arm a callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("timer unavailable: {0}")]
    Unavailable(String),
}

/// Something that can run a callback once after a delay.
pub trait Scheduler {
    /// Identifies an armed callback so it can be disarmed.
    type Handle: Copy + std::fmt::Debug;

    /// Runs `fire` once, `delay_ms` from now. Never runs it synchronously.
    ///
    /// On error `fire` is dropped unrun.
    fn arm(&mut self, delay_ms: u32, fire: Box<dyn FnOnce()>)
        -> Result<Self::Handle, ScheduleError>;

    /// Drops the callback if it has not run yet; otherwise does nothing.
    fn disarm(&mut self, handle: Self::Handle);
}

#[derive(Default)]
struct ClockState {
    now_ms: u64,
    next_seq: u64,
    // Keyed by (deadline, arm order) so equal deadlines run first-in first-out.
    pending: BTreeMap<(u64, u64), Box<dyn FnOnce()>>,
}

/// Simulated clock for tests and frame-stepped hosts.
///
/// Clones share the same time and queue.
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Rc<RefCell<ClockState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    /// Callbacks armed but not yet run.
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Deadline of the earliest pending callback.
    pub fn next_deadline(&self) -> Option<u64> {
        self.inner.borrow().pending.keys().next().map(|&(at, _)| at)
    }

    /// Moves time forward by `ms`, running every callback that falls due.
    ///
    /// Callbacks run in deadline order with the clock set to their deadline,
    /// so a callback that arms another one due within the window sees it run
    /// in the same call.
    pub fn advance(&self, ms: u64) {
        let target = self.now_ms() + ms;
        loop {
            let due = {
                let mut state = self.inner.borrow_mut();
                let key = match state.pending.keys().next() {
                    Some(&key) if key.0 <= target => key,
                    _ => break,
                };
                state.now_ms = key.0;
                state.pending.remove(&key)
            };
            // The borrow is released here so the callback may arm again.
            if let Some(fire) = due {
                fire();
            }
        }
        self.inner.borrow_mut().now_ms = target;
    }

    /// Advances straight to `at_ms`; a time in the past is a no-op.
    pub fn advance_to(&self, at_ms: u64) {
        let now = self.now_ms();
        if at_ms > now {
            self.advance(at_ms - now);
        }
    }

    /// Runs everything still pending, however far in the future.
    pub fn run_until_idle(&self) {
        while let Some(at) = self.next_deadline() {
            self.advance_to(at);
        }
    }
}

impl Scheduler for ManualClock {
    type Handle = u64;

    fn arm(&mut self, delay_ms: u32, fire: Box<dyn FnOnce()>) -> Result<u64, ScheduleError> {
        let mut state = self.inner.borrow_mut();
        let seq = state.next_seq;
        state.next_seq += 1;
        let deadline = state.now_ms + u64::from(delay_ms);
        state.pending.insert((deadline, seq), fire);
        Ok(seq)
    }

    fn disarm(&mut self, handle: u64) {
        self.inner.borrow_mut().pending.retain(|&(_, seq), _| seq != handle);
    }
}
