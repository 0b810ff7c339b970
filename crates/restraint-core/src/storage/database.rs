//! SQLite-backed persistent state.
//!
//! The engine's only persistent state is a single activation timestamp,
//! string-encoded in epoch milliseconds and held in a kv table. The kv
//! surface is generic so hosts can park small bits of state next to it.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use super::{data_dir, StateStore, LAST_ACTIVATED_KEY};
use crate::error::StorageError;

/// SQLite database holding the kv state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/restraint/restraint.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(data_dir()?.join("restraint.db"))
    }

    /// Open a database at an explicit path (hosts that manage their own
    /// data directory).
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a key from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl StateStore for Database {
    fn last_activated_ms(&self) -> Result<Option<i64>, StorageError> {
        let Some(raw) = self.kv_get(LAST_ACTIVATED_KEY)? else {
            return Ok(None);
        };
        raw.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| StorageError::CorruptValue {
                key: LAST_ACTIVATED_KEY.to_string(),
                value: raw,
            })
    }

    fn set_last_activated_ms(&self, ms: i64) -> Result<(), StorageError> {
        self.kv_set(LAST_ACTIVATED_KEY, &ms.to_string())?;
        Ok(())
    }

    fn clear_last_activated(&self) -> Result<(), StorageError> {
        self.kv_delete(LAST_ACTIVATED_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn activation_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.last_activated_ms().unwrap().is_none());
        db.set_last_activated_ms(1_700_000_000_000).unwrap();
        assert_eq!(db.last_activated_ms().unwrap(), Some(1_700_000_000_000));
        db.clear_last_activated().unwrap();
        assert!(db.last_activated_ms().unwrap().is_none());
    }

    #[test]
    fn corrupt_value_is_a_typed_error() {
        let db = Database::open_memory().unwrap();
        db.kv_set(LAST_ACTIVATED_KEY, "not-a-number").unwrap();
        match db.last_activated_ms() {
            Err(StorageError::CorruptValue { key, value }) => {
                assert_eq!(key, LAST_ACTIVATED_KEY);
                assert_eq!(value, "not-a-number");
            }
            other => panic!("expected CorruptValue, got {other:?}"),
        }
    }

    #[test]
    fn open_at_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restraint.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.set_last_activated_ms(12345).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.last_activated_ms().unwrap(), Some(12345));
    }
}
