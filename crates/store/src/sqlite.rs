// SQLite-backed key-value store

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StorageError;
use crate::kv::KeyValueStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Cap on a single stored value. Oversized writes report quota without
/// touching the database.
pub const DEFAULT_VALUE_CAP_BYTES: usize = 5 * 1024 * 1024;

pub struct SqliteStore {
    conn: Connection,
    value_cap_bytes: usize,
}

impl SqliteStore {
    /// Open (creating if needed) a store at `path`. Parent directories are
    /// created so a fresh config path works on first run.
    pub fn open(path: &Path) -> Result<SqliteStore, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
            }
        }
        let conn = Connection::open(path).map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(SqliteStore {
            conn,
            value_cap_bytes: DEFAULT_VALUE_CAP_BYTES,
        })
    }

    pub fn open_in_memory() -> Result<SqliteStore, StorageError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(SqliteStore {
            conn,
            value_cap_bytes: DEFAULT_VALUE_CAP_BYTES,
        })
    }

    pub fn with_value_cap(mut self, bytes: usize) -> SqliteStore {
        self.value_cap_bytes = bytes;
        self
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(backend)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if value.len() > self.value_cap_bytes {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                size: value.len(),
            });
        }
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map(|_| ())
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::DiskFull =>
                {
                    StorageError::QuotaExceeded {
                        key: key.to_string(),
                        size: value.len(),
                    }
                }
                other => StorageError::Backend(other.to_string()),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map(|_| ())
            .map_err(backend)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv ORDER BY key")
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(backend)?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key.map_err(backend)?);
        }
        Ok(keys)
    }
}

fn backend(e: rusqlite::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}
