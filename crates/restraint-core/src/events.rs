use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::counter::{CounterPhase, DisplayLevel};

/// Every state change in the engine produces an Event.
/// The host UI polls for events and reacts: overlay on/off, title marker,
/// button text and color.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// User activation: the countdown (re)starts from the configured jump value.
    CounterActivated { counter: i64, at: DateTime<Utc> },
    /// Manual return to the idle state.
    CounterReset { at: DateTime<Utc> },
    /// The countdown crossed the floor; stored state was cleared and the
    /// counter reads idle again.
    CountdownExpired { at: DateTime<Utc> },
    /// The gate transitioned closed -> open (counter dropped below zero).
    GateOpened { counter: i64, at: DateTime<Utc> },
    /// The gate transitioned open -> closed.
    GateClosed { counter: i64, at: DateTime<Utc> },
    StateSnapshot {
        phase: CounterPhase,
        counter: i64,
        gate_open: bool,
        display_level: DisplayLevel,
        at: DateTime<Utc>,
    },
}
