//! # Restraint Core Library
//!
//! This library provides the core business logic for Restraint, a
//! delayed-gratification gate for distracting websites. A single stored
//! activation timestamp and the wall clock derive a restraint counter; a host
//! UI polls it on a fixed interval and keeps a blocking overlay up while the
//! gate is closed. It implements a CLI-first philosophy where all operations
//! are available via a standalone CLI binary, with any richer host (a browser
//! bridge) being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Counter Engine**: A wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()` for progress updates
//! - **Storage**: SQLite-based kv state and TOML-based configuration
//! - **Site Policy**: restricted-hostname set with allow-list exceptions
//! - **Feed Limiter**: progressive reveal budget for supported feed pages
//!
//! ## Key Components
//!
//! - [`CounterEngine`]: Core countdown state machine
//! - [`SitePolicy`]: Restricted-site predicate
//! - [`Database`]: Persistent activation-timestamp storage
//! - [`Config`]: Application configuration management
//! - [`Poller`]: Recurring tick task with explicit start/stop

pub mod clock;
pub mod counter;
pub mod error;
pub mod events;
pub mod feed;
pub mod poll;
pub mod sites;
pub mod storage;

use std::sync::Arc;

pub use clock::{Clock, ManualClock, SystemClock};
pub use counter::{CounterConfig, CounterEngine, CounterPhase, DisplayLevel};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use feed::{FeedConfig, FeedCut, FeedLimiter, SelectorMap};
pub use poll::Poller;
pub use sites::{SitePolicy, SitesConfig};
pub use storage::{Config, Database, MemoryStore, StateStore};

/// Engine over the default on-disk database, the system clock and the saved
/// configuration. This is what CLI commands and other hosts on this machine
/// share state through.
///
/// # Errors
/// Returns an error if the database cannot be opened or the configured
/// constants are invalid.
pub fn open_engine() -> Result<CounterEngine, CoreError> {
    let config = Config::load_or_default();
    let store = Arc::new(Database::open()?);
    Ok(CounterEngine::new(
        config.counter,
        store,
        Arc::new(SystemClock),
    )?)
}
