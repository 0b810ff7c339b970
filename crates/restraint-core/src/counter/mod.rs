mod engine;
mod gate;

pub use engine::{CounterConfig, CounterEngine, CounterPhase};
pub use gate::{
    clear_blocked, is_open, mark_blocked, should_block, DisplayLevel, BLOCKED_TITLE_PREFIX,
};
