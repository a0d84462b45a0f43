//! Key-value persistence for the uploaded table and in-progress annotations.
//!
//! Values are JSON documents. [`SqliteStore`] is the on-disk store used by the
//! binary; [`MemoryStore`] backs tests.

use crate::errors::ReviewError;
use crate::logging::append_run_log;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

pub const CSV_DATA_KEY: &str = "csvData";
pub const REVIEWED_DATA_KEY: &str = "reviewedData";

pub trait KeyValueStore: Send + Sync {
    fn load_raw(&self, key: &str) -> Result<Option<String>, ReviewError>;
    fn save_raw(&self, key: &str, value: &str) -> Result<(), ReviewError>;
    fn remove(&self, key: &str) -> Result<(), ReviewError>;
}

/// Loads and decodes `key`. A value that does not decode as `T` is reported
/// as [`ReviewError::CorruptState`].
pub fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, ReviewError> {
    let Some(raw) = store.load_raw(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| ReviewError::CorruptState(format!("{key}: {e}")))
}

pub fn save<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), ReviewError> {
    let raw = serde_json::to_string(value).map_err(|e| ReviewError::Store(e.to_string()))?;
    store.save_raw(key, &raw)
}

#[derive(Default, Clone)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    /// Makes every subsequent write fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }

    fn values(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, ReviewError> {
        self.values
            .lock()
            .map_err(|_| ReviewError::Store("memory store lock poisoned".to_string()))
    }

    fn check_writable(&self) -> Result<(), ReviewError> {
        let failing = self.fail_writes.lock().map(|flag| *flag).unwrap_or(false);
        if failing {
            return Err(ReviewError::Store("write rejected".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn load_raw(&self, key: &str) -> Result<Option<String>, ReviewError> {
        Ok(self.values()?.get(key).cloned())
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<(), ReviewError> {
        self.check_writable()?;
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ReviewError> {
        self.check_writable()?;
        self.values()?.remove(key);
        Ok(())
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReviewError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ReviewError::Store(e.to_string()))?;
            }
        }

        let conn = Connection::open(&path).map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(db_err)?;
        migrate(&conn)?;

        append_run_log(
            "info",
            "store.opened",
            json!({ "path": path.display().to_string() }),
        );
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(path),
        })
    }

    pub fn open_in_memory() -> Result<Self, ReviewError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ReviewError> {
        self.conn
            .lock()
            .map_err(|_| ReviewError::Store("store lock poisoned".to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn load_raw(&self, key: &str) -> Result<Option<String>, ReviewError> {
        self.conn()?
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<(), ReviewError> {
        self.conn()?
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, system_time_unix()],
            )
            .map_err(db_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ReviewError> {
        self.conn()?
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map_err(db_err)?;
        Ok(())
    }
}

fn migrate(conn: &Connection) -> Result<(), ReviewError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .map_err(db_err)
}

fn db_err(error: rusqlite::Error) -> ReviewError {
    ReviewError::Store(error.to_string())
}

fn system_time_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
