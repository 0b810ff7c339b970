//! Countdown engine implementation.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads - the caller (usually a [`crate::poll::Poller`]) is responsible
//! for calling `tick()` periodically.
//!
//! ## State transitions
//!
//! ```text
//! Idle -(activate)-> CountingDown -(floor crossed)-> Idle
//! ```
//!
//! Only the activation timestamp is stored. Both the phase and the counter
//! value are derived from it and the current time: absent timestamp pins the
//! counter at `start_value`, a present one makes it step down by one per
//! `interval_ms` starting from `click_jump_value`, and once it would fall
//! below `min_value` the engine clears stored state and reads idle again.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::Clock;
use crate::error::{StorageError, ValidationError};
use crate::events::Event;
use crate::storage::StateStore;

use super::gate::{self, DisplayLevel};

/// Countdown constants. Defaults as observed in the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Idle/locked display value.
    #[serde(default = "default_start_value")]
    pub start_value: i64,
    /// Display-color breakpoint; not a behavioral gate.
    #[serde(default = "default_threshold")]
    pub threshold: i64,
    /// Polling period; the counter steps down by one per interval.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: i64,
    /// Counter floor; crossing it resets stored state.
    #[serde(default = "default_min_value")]
    pub min_value: i64,
    /// Value the counter jumps to on activation.
    #[serde(default = "default_click_jump_value")]
    pub click_jump_value: i64,
}

fn default_start_value() -> i64 {
    200
}
fn default_threshold() -> i64 {
    100
}
fn default_interval_ms() -> i64 {
    1000
}
fn default_min_value() -> i64 {
    -300
}
fn default_click_jump_value() -> i64 {
    30
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            start_value: default_start_value(),
            threshold: default_threshold(),
            interval_ms: default_interval_ms(),
            min_value: default_min_value(),
            click_jump_value: default_click_jump_value(),
        }
    }
}

impl CounterConfig {
    /// # Errors
    /// Returns an error if the constants cannot describe a countdown.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_ms <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "counter.interval_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.min_value > self.click_jump_value {
            return Err(ValidationError::InvalidValue {
                field: "counter.min_value".to_string(),
                message: "must not exceed counter.click_jump_value".to_string(),
            });
        }
        Ok(())
    }
}

/// Engine phase, derived from stored-timestamp presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterPhase {
    Idle,
    CountingDown,
}

/// Core countdown engine.
///
/// Operates on wall-clock deltas through an injected [`Clock`], against an
/// injected [`StateStore`]. Storage read failures degrade to the idle state
/// with a logged warning; they are never surfaced from query paths.
pub struct CounterEngine {
    config: CounterConfig,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    /// Gate state seen by the previous tick, for edge detection.
    last_gate_open: Option<bool>,
}

struct Computed {
    counter: i64,
    phase: CounterPhase,
    expired: bool,
}

impl CounterEngine {
    /// Create an engine over the given store and clock.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: CounterConfig,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            clock,
            last_gate_open: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Derived restraint counter.
    ///
    /// A pure function of (stored timestamp, now), except that crossing the
    /// floor clears stored state as a side effect. Repeated calls with the
    /// same clock reading are idempotent.
    pub fn counter(&self) -> i64 {
        self.compute().counter
    }

    pub fn phase(&self) -> CounterPhase {
        self.compute().phase
    }

    /// Whether access is currently allowed (counter below zero).
    pub fn is_gate_open(&self) -> bool {
        gate::is_open(self.counter())
    }

    pub fn display_level(&self) -> DisplayLevel {
        DisplayLevel::for_counter(self.counter(), self.config.threshold)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let computed = self.compute();
        Event::StateSnapshot {
            phase: computed.phase,
            counter: computed.counter,
            gate_open: gate::is_open(computed.counter),
            display_level: DisplayLevel::for_counter(computed.counter, self.config.threshold),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// User activation (a click that is not a drag): (re)start the countdown
    /// from `click_jump_value`.
    ///
    /// # Errors
    /// Returns an error if the activation timestamp cannot be written.
    pub fn activate(&mut self) -> Result<Event, StorageError> {
        self.store.set_last_activated_ms(self.clock.now_ms())?;
        Ok(Event::CounterActivated {
            counter: self.config.click_jump_value,
            at: self.clock.now(),
        })
    }

    /// Manual return to the idle state.
    ///
    /// # Errors
    /// Returns an error if the stored activation cannot be cleared.
    pub fn reset(&mut self) -> Result<Event, StorageError> {
        self.store.clear_last_activated()?;
        Ok(Event::CounterReset {
            at: self.clock.now(),
        })
    }

    /// Poll entry point. Recomputes the counter and emits at most one
    /// transition event: `CountdownExpired` when the floor is crossed,
    /// otherwise a gate edge. Storage failures degrade to the idle state;
    /// this never panics.
    pub fn tick(&mut self) -> Option<Event> {
        let computed = self.compute();
        let open = gate::is_open(computed.counter);
        let at = self.clock.now();

        let event = if computed.expired {
            Some(Event::CountdownExpired { at })
        } else {
            match self.last_gate_open {
                Some(prev) if prev != open => Some(if open {
                    Event::GateOpened {
                        counter: computed.counter,
                        at,
                    }
                } else {
                    Event::GateClosed {
                        counter: computed.counter,
                        at,
                    }
                }),
                _ => None,
            }
        };

        self.last_gate_open = Some(open);
        event
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn compute(&self) -> Computed {
        let Some(last_activated) = self.load_last_activated() else {
            return Computed {
                counter: self.config.start_value,
                phase: CounterPhase::Idle,
                expired: false,
            };
        };

        let value = raw_counter(&self.config, last_activated, self.clock.now_ms());
        if value >= self.config.min_value {
            Computed {
                counter: value,
                phase: CounterPhase::CountingDown,
                expired: false,
            }
        } else {
            // Floor crossed: clear stored state so the counter reads idle again.
            if let Err(e) = self.store.clear_last_activated() {
                warn!(error = %e, "failed to clear expired activation; treating as idle");
            }
            Computed {
                counter: self.config.start_value,
                phase: CounterPhase::Idle,
                expired: true,
            }
        }
    }

    /// Read the stored activation, degrading storage failures to "absent".
    fn load_last_activated(&self) -> Option<i64> {
        match self.store.last_activated_ms() {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "state store read failed; treating as no stored activation");
                None
            }
        }
    }
}

/// `click_jump_value - floor(elapsed / interval)`, with elapsed clamped to
/// zero when the stored timestamp is in the future.
fn raw_counter(config: &CounterConfig, last_activated_ms: i64, now_ms: i64) -> i64 {
    let elapsed = (now_ms - last_activated_ms).max(0);
    config.click_jump_value - elapsed / config.interval_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;

    fn engine_at(now_ms: i64) -> (CounterEngine, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(now_ms));
        let engine =
            CounterEngine::new(CounterConfig::default(), store.clone(), clock.clone()).unwrap();
        (engine, store, clock)
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    impl crate::storage::StateStore for BrokenStore {
        fn last_activated_ms(&self) -> Result<Option<i64>, StorageError> {
            Err(StorageError::QueryFailed("disk on fire".into()))
        }
        fn set_last_activated_ms(&self, _ms: i64) -> Result<(), StorageError> {
            Err(StorageError::QueryFailed("disk on fire".into()))
        }
        fn clear_last_activated(&self) -> Result<(), StorageError> {
            Err(StorageError::QueryFailed("disk on fire".into()))
        }
    }

    #[test]
    fn idle_counter_pins_at_start_value() {
        let (engine, _store, clock) = engine_at(0);
        assert_eq!(engine.counter(), 200);
        assert_eq!(engine.phase(), CounterPhase::Idle);
        assert!(!engine.is_gate_open());

        clock.advance(86_400_000);
        assert_eq!(engine.counter(), 200);
    }

    #[test]
    fn activation_jumps_to_click_value() {
        let (mut engine, store, _clock) = engine_at(50_000);
        let event = engine.activate().unwrap();
        assert!(matches!(event, Event::CounterActivated { counter: 30, .. }));
        assert_eq!(store.last_activated_ms().unwrap(), Some(50_000));
        assert_eq!(engine.counter(), 30);
        assert_eq!(engine.phase(), CounterPhase::CountingDown);
        assert!(!engine.is_gate_open());
    }

    #[test]
    fn counter_steps_down_once_per_interval() {
        let (mut engine, _store, clock) = engine_at(0);
        engine.activate().unwrap();

        clock.set(999);
        assert_eq!(engine.counter(), 30);
        clock.set(1_000);
        assert_eq!(engine.counter(), 29);
        clock.set(31_000);
        assert_eq!(engine.counter(), -1);
        assert!(engine.is_gate_open());
    }

    #[test]
    fn floor_value_is_still_live_and_open() {
        let (mut engine, store, clock) = engine_at(0);
        engine.activate().unwrap();

        // 330s: raw value is exactly min_value, which is not below it.
        clock.set(330_000);
        assert_eq!(engine.counter(), -300);
        assert!(engine.is_gate_open());
        assert_eq!(engine.phase(), CounterPhase::CountingDown);
        assert!(store.last_activated_ms().unwrap().is_some());
    }

    #[test]
    fn crossing_floor_resets_to_idle() {
        let (mut engine, store, clock) = engine_at(0);
        engine.activate().unwrap();

        clock.set(331_000);
        assert_eq!(engine.counter(), 200);
        assert!(store.last_activated_ms().unwrap().is_none());
        assert_eq!(engine.phase(), CounterPhase::Idle);
        assert!(!engine.is_gate_open());

        // Idempotent: a second read with the same clock yields the same value.
        assert_eq!(engine.counter(), 200);
    }

    #[test]
    fn future_timestamp_clamps_elapsed_to_zero() {
        let (engine, store, _clock) = engine_at(10_000);
        store.set_last_activated_ms(60_000).unwrap();
        assert_eq!(engine.counter(), 30);
        assert_eq!(engine.phase(), CounterPhase::CountingDown);
    }

    #[test]
    fn manual_reset_returns_to_idle() {
        let (mut engine, store, _clock) = engine_at(0);
        engine.activate().unwrap();
        let event = engine.reset().unwrap();
        assert!(matches!(event, Event::CounterReset { .. }));
        assert!(store.last_activated_ms().unwrap().is_none());
        assert_eq!(engine.counter(), 200);
    }

    #[test]
    fn storage_read_failure_degrades_to_idle() {
        let clock = Arc::new(ManualClock::new(0));
        let mut engine =
            CounterEngine::new(CounterConfig::default(), Arc::new(BrokenStore), clock).unwrap();
        assert_eq!(engine.counter(), 200);
        assert_eq!(engine.phase(), CounterPhase::Idle);
        assert!(engine.tick().is_none());
        assert!(engine.activate().is_err());
    }

    #[test]
    fn tick_emits_gate_edges_and_expiry() {
        let (mut engine, _store, clock) = engine_at(0);

        // Baseline tick: no previous gate state, no event.
        assert!(engine.tick().is_none());

        engine.activate().unwrap();
        assert!(engine.tick().is_none()); // still closed at 30

        clock.set(31_000);
        match engine.tick() {
            Some(Event::GateOpened { counter: -1, .. }) => {}
            other => panic!("expected GateOpened, got {other:?}"),
        }
        assert!(engine.tick().is_none()); // no edge while it stays open

        clock.set(331_000);
        assert!(matches!(engine.tick(), Some(Event::CountdownExpired { .. })));
        assert!(engine.tick().is_none()); // back to steady closed state
    }

    #[test]
    fn reactivation_during_open_gate_closes_it() {
        let (mut engine, _store, clock) = engine_at(0);
        engine.activate().unwrap();
        clock.set(31_000);
        assert!(matches!(engine.tick(), Some(Event::GateOpened { .. })));

        engine.activate().unwrap(); // jump back to 30
        match engine.tick() {
            Some(Event::GateClosed { counter: 30, .. }) => {}
            other => panic!("expected GateClosed, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_reflects_engine_state() {
        let (mut engine, _store, clock) = engine_at(0);
        engine.activate().unwrap();
        clock.set(5_000);

        match engine.snapshot() {
            Event::StateSnapshot {
                phase,
                counter,
                gate_open,
                display_level,
                ..
            } => {
                assert_eq!(phase, CounterPhase::CountingDown);
                assert_eq!(counter, 25);
                assert!(!gate_open);
                assert_eq!(display_level, DisplayLevel::Cooling);
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn config_validation_rejects_bad_constants() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(0));

        let zero_interval = CounterConfig {
            interval_ms: 0,
            ..CounterConfig::default()
        };
        assert!(CounterEngine::new(zero_interval, store.clone(), clock.clone()).is_err());

        let inverted_floor = CounterConfig {
            min_value: 40,
            ..CounterConfig::default()
        };
        assert!(CounterEngine::new(inverted_floor, store, clock).is_err());
    }

    proptest! {
        #[test]
        fn counter_matches_formula(t0 in 0i64..4_102_444_800_000, delta in 0i64..2_000_000) {
            let store = Arc::new(MemoryStore::new());
            store.set_last_activated_ms(t0).unwrap();
            let clock = Arc::new(ManualClock::new(t0 + delta));
            let engine =
                CounterEngine::new(CounterConfig::default(), store.clone(), clock).unwrap();

            let expected = 30 - delta / 1000;
            if expected >= -300 {
                prop_assert_eq!(engine.counter(), expected);
                prop_assert!(store.last_activated_ms().unwrap().is_some());
            } else {
                prop_assert_eq!(engine.counter(), 200);
                prop_assert!(store.last_activated_ms().unwrap().is_none());
            }
        }

        #[test]
        fn gate_open_iff_counter_negative(counter in -1_000i64..1_000) {
            prop_assert_eq!(gate::is_open(counter), counter < 0);
            prop_assert_eq!(gate::should_block(counter), counter >= 0);
        }
    }
}
