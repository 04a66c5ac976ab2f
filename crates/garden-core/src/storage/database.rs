//! SQLite-based local storage.
//!
//! Provides persistent storage for:
//! - Completed focus sessions (the `local` session backend)
//! - Key-value store for application state (e.g. the CLI's running session)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use super::{data_dir, SessionStore};
use crate::error::{DatabaseError, Result};
use crate::session::SessionRecord;

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/garden.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("garden.db"))
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                flower_code   TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                completed     INTEGER NOT NULL,
                timestamp     TEXT NOT NULL,
                user_name     TEXT NOT NULL DEFAULT 'Anonymous'
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_flower_code ON sessions(flower_code);",
        )?;
        Ok(())
    }

    /// Append a session record. Returns the new row id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, record: &SessionRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (flower_code, duration_secs, completed, timestamp, user_name)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.flower_code,
                record.duration_secs,
                record.completed,
                record.timestamp.to_rfc3339(),
                record.user_name,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All session records in insertion order.
    pub fn all_sessions(&self) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT flower_code, duration_secs, completed, timestamp, user_name
             FROM sessions
             ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (flower_code, duration_secs, completed, timestamp, user_name) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| DatabaseError::CorruptRow {
                    table: "sessions".into(),
                    message: format!("bad timestamp '{timestamp}': {e}"),
                })?
                .with_timezone(&Utc);
            records.push(SessionRecord {
                flower_code,
                duration_secs,
                completed,
                timestamp,
                user_name,
            });
        }
        Ok(records)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SessionStore for Database {
    fn name(&self) -> &str {
        "local"
    }

    fn insert(&self, record: &SessionRecord) -> Result<()> {
        self.record_session(record).map(|_| ())
    }

    fn select_all(&self) -> Result<Vec<SessionRecord>> {
        self.all_sessions()
    }
}
