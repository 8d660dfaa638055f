#![cfg(not(target_arch = "wasm32"))]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use loader_wasm::{
    Fired, Loader, ManualClock, Phase, PhaseDelays, ScheduleError, Scheduler, Script, ScriptError,
    Step, TimelineController, TimelineSnapshot,
};

fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
    let count = Rc::new(Cell::new(0));
    let hits = count.clone();
    (count, move || hits.set(hits.get() + 1))
}

fn reference_loader(clock: &ManualClock) -> (Loader<ManualClock>, Rc<Cell<u32>>) {
    let loader = Loader::new(PhaseDelays::default(), clock.clone());
    let (count, on_complete) = counter();
    loader.start_script(Script::reference(), on_complete);
    (loader, count)
}

fn word(snapshot: &TimelineSnapshot) -> Option<&str> {
    snapshot.current_step.as_ref().map(|s| s.text.as_str())
}

#[test]
fn reference_script_follows_the_documented_schedule() {
    let clock = ManualClock::new();
    let (loader, completions) = reference_loader(&clock);

    let words = [
        (0, "IDEAS"),
        (599, "IDEAS"),
        (600, "TAKING"),
        (1199, "TAKING"),
        (1200, "SHAPE"),
        (1849, "SHAPE"),
        (1850, "NITHIN"),
        (2849, "NITHIN"),
    ];
    for (at, expected) in words {
        clock.advance_to(at);
        let snap = loader.snapshot();
        assert_eq!(word(&snap), Some(expected), "at t={at}");
        assert!(!snap.zoom_triggered, "at t={at}");
    }
    assert_eq!(loader.snapshot().active_index, Some(3));

    // Past the end, the final word stays up while the tail runs.
    clock.advance_to(2850);
    let snap = loader.snapshot();
    assert_eq!(snap.active_index, None);
    assert_eq!(word(&snap), Some("NITHIN"));
    assert_eq!(loader.phase(), Phase::PreZoom);

    clock.advance_to(3049);
    assert!(!loader.snapshot().zoom_triggered);
    clock.advance_to(3050);
    assert!(loader.snapshot().zoom_triggered);

    clock.advance_to(3749);
    assert!(!loader.snapshot().split_triggered);
    clock.advance_to(3750);
    assert!(loader.snapshot().split_triggered);

    clock.advance_to(4749);
    assert!(!loader.snapshot().completed);
    assert_eq!(completions.get(), 0);
    clock.advance_to(4750);
    let snap = loader.snapshot();
    assert!(snap.completed);
    assert_eq!(snap.current_step, None);
    assert_eq!(completions.get(), 1);
    assert!(loader.is_finished());

    clock.advance(60_000);
    assert_eq!(completions.get(), 1);
    assert_eq!(clock.pending(), 0);
}

#[test]
fn subscribers_see_every_transition_once_and_in_order() {
    let clock = ManualClock::new();
    let loader = Loader::new(PhaseDelays::default(), clock.clone());
    let seen: Rc<RefCell<Vec<(u64, TimelineSnapshot)>>> = Rc::default();
    {
        let seen = seen.clone();
        let clock = clock.clone();
        loader.subscribe(move |snap| seen.borrow_mut().push((clock.now_ms(), snap.clone())));
    }
    let (completions, on_complete) = counter();
    loader.start_script(Script::reference(), on_complete);
    clock.run_until_idle();

    let seen = seen.borrow();
    let times: Vec<u64> = seen.iter().map(|(t, _)| *t).collect();
    // start, three word advances, past-end, zoom, split, complete
    assert_eq!(times, vec![0, 600, 1200, 1850, 2850, 3050, 3750, 4750]);
    assert_eq!(completions.get(), 1);

    let progress: Vec<f32> = seen.iter().map(|(_, s)| s.progress_percent).collect();
    assert_eq!(progress, vec![25.0, 50.0, 75.0, 100.0, 100.0, 100.0, 100.0, 100.0]);

    let (_, last) = seen.last().unwrap();
    assert!(last.completed && last.split_triggered && last.zoom_triggered);
}

#[test]
fn cancel_freezes_state_and_suppresses_completion() {
    for cancel_at in [0, 1, 700, 1850, 2850, 3000, 3050, 3500, 4749] {
        let clock = ManualClock::new();
        let (loader, completions) = reference_loader(&clock);
        clock.advance_to(cancel_at);
        loader.cancel();
        let frozen = loader.snapshot();

        clock.advance(60_000);
        assert_eq!(loader.snapshot(), frozen, "cancelled at t={cancel_at}");
        assert_eq!(loader.phase(), Phase::Cancelled);
        assert_eq!(completions.get(), 0, "cancelled at t={cancel_at}");
        assert_eq!(clock.pending(), 0);
    }
}

#[test]
fn cancel_after_completion_changes_nothing() {
    let clock = ManualClock::new();
    let (loader, completions) = reference_loader(&clock);
    clock.run_until_idle();
    loader.cancel();
    assert_eq!(loader.phase(), Phase::Completed);
    assert_eq!(completions.get(), 1);
}

#[test]
fn single_zero_hold_step_still_runs_every_phase() {
    let clock = ManualClock::new();
    let loader = Loader::new(PhaseDelays::default(), clock.clone());
    let (completions, on_complete) = counter();
    loader.start(vec![Step::new("HI", &[0], 0, true)], on_complete).unwrap();

    assert_eq!(word(&loader.snapshot()), Some("HI"));
    clock.advance(0);
    assert_eq!(loader.phase(), Phase::PreZoom);
    assert_eq!(word(&loader.snapshot()), Some("HI"));

    clock.advance_to(199);
    assert!(!loader.snapshot().zoom_triggered);
    clock.advance_to(200);
    assert!(loader.snapshot().zoom_triggered);
    clock.advance_to(900);
    assert!(loader.snapshot().split_triggered);
    assert_eq!(completions.get(), 0);
    clock.advance_to(1900);
    assert_eq!(completions.get(), 1);
}

#[test]
fn custom_delays_shift_the_tail() {
    let clock = ManualClock::new();
    let delays = PhaseDelays { pre_zoom_ms: 10, pre_split_ms: 20, pre_complete_ms: 30 };
    let loader = Loader::new(delays, clock.clone());
    let (completions, on_complete) = counter();
    loader.start_script(Script::reference(), on_complete);

    clock.advance_to(2860);
    assert!(loader.snapshot().zoom_triggered);
    clock.advance_to(2880);
    assert!(loader.snapshot().split_triggered);
    clock.advance_to(2909);
    assert_eq!(completions.get(), 0);
    clock.advance_to(2910);
    assert_eq!(completions.get(), 1);
}

#[test]
fn malformed_scripts_are_rejected_before_scheduling() {
    let cases = [
        (Vec::new(), ScriptError::Empty),
        (
            vec![Step::new("A", &[], 10, false), Step::new("B", &[], 10, false)],
            ScriptError::NoFinal,
        ),
        (
            vec![Step::new("A", &[], 10, true), Step::new("B", &[], 10, true)],
            ScriptError::MultipleFinal { count: 2 },
        ),
        (
            vec![Step::new("ABC", &[3], 10, true)],
            ScriptError::MaskOutOfRange { index: 0, letter: 3, len: 3 },
        ),
    ];

    for (steps, expected) in cases {
        let clock = ManualClock::new();
        let loader = Loader::new(PhaseDelays::default(), clock.clone());
        let (completions, on_complete) = counter();
        assert_eq!(loader.start(steps, on_complete), Err(expected));
        assert_eq!(loader.phase(), Phase::Idle);
        assert_eq!(clock.pending(), 0);
        clock.advance(60_000);
        assert_eq!(completions.get(), 0);
    }
}

#[test]
fn dropped_loader_ignores_late_timers() {
    let clock = ManualClock::new();
    let (loader, completions) = reference_loader(&clock);
    clock.advance_to(1000);
    drop(loader);
    clock.run_until_idle();
    assert_eq!(completions.get(), 0);
}

#[test]
fn completion_callback_may_use_the_loader() {
    let clock = ManualClock::new();
    let loader = Loader::new(PhaseDelays::default(), clock.clone());
    let observed = Rc::new(Cell::new(false));
    {
        let handle = loader.clone();
        let observed = observed.clone();
        loader.start_script(Script::reference(), move || {
            observed.set(handle.snapshot().completed);
            handle.cancel();
        });
    }
    clock.run_until_idle();
    assert!(observed.get());
    assert_eq!(loader.phase(), Phase::Completed);
}

#[test]
fn restart_orphans_tickets_from_the_first_run() {
    let mut timeline = TimelineController::default();
    let (first_count, first_done) = counter();
    let old = timeline.start_script(Script::reference(), first_done);
    let (_, second_done) = counter();
    let fresh = timeline.start_script(Script::reference(), second_done);

    assert!(matches!(timeline.fire(old.ticket), Fired::Stale));
    assert_eq!(timeline.snapshot().active_index, Some(0));
    assert!(matches!(timeline.fire(fresh.ticket), Fired::Next(_)));
    assert_eq!(first_count.get(), 0);
}

#[test]
fn ticket_fired_after_cancel_is_dropped() {
    let mut timeline = TimelineController::default();
    let (count, on_complete) = counter();
    let timer = timeline.start(vec![Step::new("GO", &[1], 5, true)], on_complete).unwrap();
    timeline.cancel();
    assert!(matches!(timeline.fire(timer.ticket), Fired::Stale));
    assert_eq!(timeline.phase(), Phase::Cancelled);
    assert_eq!(count.get(), 0);
}

/// Lets the first `budget` arms through to a `ManualClock`, then refuses.
struct FlakyClock {
    clock: ManualClock,
    budget: usize,
}

impl Scheduler for FlakyClock {
    type Handle = u64;

    fn arm(&mut self, delay_ms: u32, fire: Box<dyn FnOnce()>) -> Result<u64, ScheduleError> {
        if self.budget == 0 {
            return Err(ScheduleError::Unavailable("no timers left".to_owned()));
        }
        self.budget -= 1;
        self.clock.arm(delay_ms, fire)
    }

    fn disarm(&mut self, handle: u64) {
        self.clock.disarm(handle);
    }
}

#[test]
fn refused_timer_still_hands_off_once() {
    let clock = ManualClock::new();
    let loader = Loader::new(PhaseDelays::default(), FlakyClock { clock: clock.clone(), budget: 2 });
    let (completions, on_complete) = counter();
    loader.start_script(Script::reference(), on_complete);

    clock.advance_to(599);
    assert_eq!(completions.get(), 0);
    // The second hold arms fine; the third arm is refused at t=1200.
    clock.advance_to(1200);
    let snap = loader.snapshot();
    assert!(snap.zoom_triggered && snap.split_triggered && snap.completed);
    assert_eq!(loader.phase(), Phase::Completed);
    assert_eq!(completions.get(), 1);

    clock.advance(60_000);
    assert_eq!(completions.get(), 1);
    assert_eq!(clock.pending(), 0);
}

#[test]
fn refused_first_timer_completes_during_start() {
    let clock = ManualClock::new();
    let loader = Loader::new(PhaseDelays::default(), FlakyClock { clock, budget: 0 });
    let (completions, on_complete) = counter();
    loader.start(vec![Step::new("GO", &[0], 100, true)], on_complete).unwrap();
    assert_eq!(completions.get(), 1);
    assert!(loader.snapshot().completed);
}

#[test]
fn loader_reports_its_delays() {
    let delays = PhaseDelays { pre_zoom_ms: 1, pre_split_ms: 2, pre_complete_ms: 3 };
    let loader = Loader::new(delays, ManualClock::new());
    assert_eq!(loader.delays(), delays);
}

#[test]
fn repeated_word_carries_its_own_mask() {
    let clock = ManualClock::new();
    let loader = Loader::new(PhaseDelays::default(), clock.clone());
    let shown: Rc<RefCell<Vec<Step>>> = Rc::default();
    {
        let shown = shown.clone();
        loader.subscribe(move |snap| {
            if let Some(step) = &snap.current_step {
                shown.borrow_mut().push(step.clone());
            }
        });
    }
    let steps = vec![Step::new("GO", &[0], 100, false), Step::new("GO", &[1], 100, true)];
    loader.start(steps, || {}).unwrap();
    clock.advance_to(100);

    let shown = shown.borrow();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].text, shown[1].text);
    assert!(shown[0].is_filled(0) && !shown[0].is_filled(1));
    assert!(shown[1].is_filled(1) && shown[1].is_final);
}

#[test]
fn snapshot_has_a_step_from_start_until_completion() {
    let clock = ManualClock::new();
    let loader = Loader::new(PhaseDelays::default(), clock.clone());
    assert_eq!(loader.snapshot().current_step, None);
    loader.start_script(Script::reference(), || {});
    for at in (0..=4750).step_by(50) {
        clock.advance_to(at);
        let snap = loader.snapshot();
        assert_eq!(snap.current_step.is_none(), snap.completed, "at t={at}");
    }
}
