//! SQLite-backed storage adapter

use crate::StoreError;
use async_trait::async_trait;
use docket_domain::{Entry, StorageAdapter};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite implementation of [`StorageAdapter`]
///
/// Each entry is one row holding the JSON-encoded entry. The head version is
/// duplicated into its own column for inspection with plain SQL.
///
/// # Thread Safety
///
/// The connection sits behind a mutex; calls are short and never held across
/// an await point.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use docket_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("docket.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.lock().execute_batch(schema)?;
        Ok(())
    }

    /// Number of stored entries
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl StorageAdapter for SqliteStore {
    type Error = StoreError;

    async fn write(&self, key: &str, entry: &Entry) -> Result<(), Self::Error> {
        let body = serde_json::to_string(entry)?;
        self.conn.lock().execute(
            "INSERT INTO entries (key, body, version)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
             body = excluded.body,
             version = excluded.version,
             written_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key, body, entry.version],
        )?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Entry>, Self::Error> {
        let body: Option<String> = self
            .conn
            .lock()
            .query_row(
                "SELECT body FROM entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Entry>, Self::Error> {
        let bodies = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare("SELECT body FROM entries ORDER BY key")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StoreError::from))
            .collect()
    }

    async fn delete(&self, key: &str) -> Result<bool, Self::Error> {
        let changed = self
            .conn
            .lock()
            .execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        Ok(changed > 0)
    }
}
