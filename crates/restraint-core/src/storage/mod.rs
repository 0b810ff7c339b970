mod config;
pub mod database;

pub use config::Config;
pub use database::Database;

use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::StorageError;

/// Key under which the activation timestamp is stored.
pub(crate) const LAST_ACTIVATED_KEY: &str = "counter_last_activated";

/// Returns `~/.config/restraint[-dev]/` based on RESTRAINT_ENV.
///
/// Set RESTRAINT_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("RESTRAINT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("restraint-dev")
    } else {
        base_dir.join("restraint")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Persistent store for the single activation timestamp.
///
/// Models the browser-local key-value store the engine was designed against:
/// one key holding a string-encoded epoch-millisecond integer, or absent.
pub trait StateStore: Send + Sync {
    /// The stored activation timestamp, or `None` if no countdown is running.
    fn last_activated_ms(&self) -> Result<Option<i64>, StorageError>;

    /// Record an activation at `ms` (epoch milliseconds).
    fn set_last_activated_ms(&self, ms: i64) -> Result<(), StorageError>;

    /// Remove the stored activation, returning to the idle state.
    fn clear_last_activated(&self) -> Result<(), StorageError>;
}

/// In-memory store for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<i64>> {
        self.value.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn last_activated_ms(&self) -> Result<Option<i64>, StorageError> {
        Ok(*self.slot())
    }

    fn set_last_activated_ms(&self, ms: i64) -> Result<(), StorageError> {
        *self.slot() = Some(ms);
        Ok(())
    }

    fn clear_last_activated(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}
