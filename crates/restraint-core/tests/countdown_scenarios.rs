//! End-to-end walkthrough of the countdown lifecycle over the public API.

use std::sync::Arc;

use restraint_core::{
    CounterConfig, CounterEngine, CounterPhase, Event, ManualClock, MemoryStore, SitePolicy,
    StateStore,
};

fn engine() -> (CounterEngine, Arc<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(0));
    let engine =
        CounterEngine::new(CounterConfig::default(), store.clone(), clock.clone()).unwrap();
    (engine, store, clock)
}

#[test]
fn first_run_is_idle_and_blocked() {
    let (engine, _store, _clock) = engine();
    assert_eq!(engine.counter(), 200);
    assert_eq!(engine.phase(), CounterPhase::Idle);
    assert!(!engine.is_gate_open());
}

#[test]
fn full_lifecycle_activate_open_expire() {
    let (mut engine, store, clock) = engine();

    // Activate: the counter jumps to 30 and the gate stays closed.
    engine.activate().unwrap();
    assert_eq!(engine.counter(), 30);
    assert!(!engine.is_gate_open());

    // 31 seconds later the counter has stepped below zero: gate open.
    clock.set(31_000);
    assert_eq!(engine.counter(), -1);
    assert!(engine.is_gate_open());

    // At 330 seconds the counter sits exactly on the floor, still open.
    clock.set(330_000);
    assert_eq!(engine.counter(), -300);
    assert!(engine.is_gate_open());

    // One more interval crosses the floor: state clears, idle again.
    clock.set(331_000);
    assert_eq!(engine.counter(), 200);
    assert!(!engine.is_gate_open());
    assert!(store.last_activated_ms().unwrap().is_none());
    assert_eq!(engine.counter(), 200);
}

#[test]
fn tick_event_sequence_over_a_lifecycle() {
    let (mut engine, _store, clock) = engine();

    let mut events = Vec::new();
    let mut tick_at = |engine: &mut CounterEngine, clock: &ManualClock, ms: i64| {
        clock.set(ms);
        if let Some(event) = engine.tick() {
            events.push(event);
        }
    };

    tick_at(&mut engine, &clock, 0);
    engine.activate().unwrap();
    for t in (1_000..=32_000).step_by(1_000) {
        tick_at(&mut engine, &clock, t);
    }
    tick_at(&mut engine, &clock, 331_000);

    assert_eq!(events.len(), 2, "expected gate-open then expiry: {events:?}");
    assert!(matches!(events[0], Event::GateOpened { counter: -1, .. }));
    assert!(matches!(events[1], Event::CountdownExpired { .. }));
}

#[test]
fn restricted_site_predicate_is_independent_of_the_engine() {
    let policy = SitePolicy::default_policy();

    // Allow-listed deep link vs. a plain subreddit page.
    assert!(!policy
        .is_restricted_url("https://www.reddit.com/r/foo/comments/123")
        .unwrap());
    assert!(policy.is_restricted_url("https://reddit.com/r/foo").unwrap());
}

#[test]
fn custom_constants_shift_the_timeline() {
    let config = CounterConfig {
        click_jump_value: 5,
        min_value: -10,
        interval_ms: 100,
        ..CounterConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(0));
    let mut engine = CounterEngine::new(config, store, clock.clone()).unwrap();

    engine.activate().unwrap();
    clock.set(600);
    assert_eq!(engine.counter(), -1);
    assert!(engine.is_gate_open());
    clock.set(1_500);
    assert_eq!(engine.counter(), -10);
    clock.set(1_600);
    assert_eq!(engine.counter(), 200);
}
