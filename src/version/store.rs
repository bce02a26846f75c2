//! SQLite-backed record store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::version::error::StoreError;
use crate::version::types::VersionRecord;

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: index backing the series ordering of get_all
    &["CREATE INDEX IF NOT EXISTS idx_python_versions_series ON python_versions(major, minor, patch)"],
];

const READ_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for persisting and reading version records
#[cfg_attr(test, automock)]
pub trait RecordStore: Send + Sync + 'static {
    /// All records ordered by major, minor, patch descending
    fn get_all(&self) -> Result<Vec<VersionRecord>, StoreError>;

    /// Insert or replace each record by name, atomically as one batch
    fn upsert_many(&self, records: &[VersionRecord]) -> Result<(), StoreError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    /// Read connection of a file-backed store; sees the last committed batch
    /// while a write is in flight. In-memory stores read through `conn`.
    reader: Option<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        info!("Initializing version database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");
        let mut store = Self::with_connection(conn)?;

        let reader = Connection::open(db_path)?;
        reader.pragma_update(None, "query_only", true)?;
        reader.busy_timeout(READ_BUSY_TIMEOUT)?;
        store.reader = Some(Mutex::new(reader));

        Ok(store)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        debug!("Creating in-memory version database");
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
            reader: None,
        };

        store.create_schema()?;
        info!("Version database initialized successfully");

        Ok(store)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn lock_reader(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        match &self.reader {
            Some(reader) => reader.lock().map_err(|_| StoreError::LockPoisoned),
            None => self.lock_conn(),
        }
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS python_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                major INTEGER NOT NULL,
                minor INTEGER NOT NULL,
                patch INTEGER NOT NULL,
                level TEXT NOT NULL,
                status TEXT NOT NULL,
                last_updated TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), StoreError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }
}

type RawRow = (String, u32, u32, u32, String, String, String);

fn decode_row(row: RawRow) -> Result<VersionRecord, StoreError> {
    let (name, major, minor, patch, level, status, last_updated) = row;

    let level = level.parse().map_err(StoreError::InvalidRecord)?;
    let status = status.parse().map_err(StoreError::InvalidRecord)?;
    let last_updated = DateTime::parse_from_rfc3339(&last_updated)
        .map_err(|e| {
            StoreError::InvalidRecord(format!(
                "bad last_updated '{}' for {}: {}",
                last_updated, name, e
            ))
        })?
        .with_timezone(&Utc);

    Ok(VersionRecord {
        name,
        major,
        minor,
        patch,
        level,
        status,
        last_updated,
    })
}

impl RecordStore for SqliteStore {
    fn get_all(&self) -> Result<Vec<VersionRecord>, StoreError> {
        let conn = self.lock_reader()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT name, major, minor, patch, level, status, last_updated
            FROM python_versions
            ORDER BY major DESC, minor DESC, patch DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })?
            .collect::<Result<Vec<RawRow>, _>>()?;

        rows.into_iter().map(decode_row).collect()
    }

    fn upsert_many(&self, records: &[VersionRecord]) -> Result<(), StoreError> {
        debug!("Saving {} version records", records.len());

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO python_versions (name, major, minor, patch, level, status, last_updated)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(name) DO UPDATE SET
                    major = excluded.major,
                    minor = excluded.minor,
                    patch = excluded.patch,
                    level = excluded.level,
                    status = excluded.status,
                    last_updated = excluded.last_updated
                "#,
            )?;
            for record in records {
                stmt.execute((
                    &record.name,
                    record.major,
                    record.minor,
                    record.patch,
                    record.level.as_str(),
                    record.status.as_str(),
                    record.last_updated.to_rfc3339(),
                ))?;
            }
        }

        tx.commit()?;

        debug!("Successfully saved {} version records", records.len());
        Ok(())
    }
}
