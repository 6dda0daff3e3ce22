//! Database schema and initialization

use crate::error::{EquiclassError, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Main database handle
///
/// The connection sits behind a mutex so one handle can be shared by the
/// concurrent extraction passes of a request.
pub struct Database {
    conn: Mutex<Connection>,
}

const SCHEMA_VERSION: i32 = 2;

const CREATE_TABLES: &str = r#"
-- Equipment catalog
CREATE TABLE IF NOT EXISTS golf_balls (
    id TEXT PRIMARY KEY,
    country TEXT NOT NULL DEFAULT '',
    manufacturer TEXT NOT NULL DEFAULT '',
    usga_lot_num TEXT NOT NULL DEFAULT '',
    pole_marking TEXT NOT NULL DEFAULT '',
    pole1_web TEXT NOT NULL DEFAULT '',
    colour TEXT NOT NULL DEFAULT '',
    const_code TEXT NOT NULL DEFAULT '',
    ball_specs TEXT NOT NULL DEFAULT '',
    dimples TEXT NOT NULL DEFAULT '',
    spin TEXT NOT NULL DEFAULT '',
    pole_2 TEXT NOT NULL DEFAULT '',
    seam_marking TEXT NOT NULL DEFAULT '',
    decision_number TEXT NOT NULL DEFAULT '',
    image_url TEXT NOT NULL DEFAULT ''
);

-- Chat/audit history
CREATE TABLE IF NOT EXISTS chat_sessions (
    session_id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_messages (
    message_id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES chat_sessions(session_id) ON DELETE CASCADE,
    sender TEXT NOT NULL,
    message_content TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_golf_balls_manufacturer ON golf_balls(manufacturer);
"#;

impl Database {
    /// Open database at path, creating if necessary
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| EquiclassError::Other(anyhow::anyhow!("database mutex poisoned")))
    }

    /// Initialize database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        conn.execute_batch(CREATE_TABLES)?;
        drop(conn);

        // Run migrations to upgrade existing databases (BEFORE setting version)
        self.migrate()?;

        self.conn()?.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<Option<i32>> {
        let version = self
            .conn()?
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok();
        Ok(version)
    }

    /// Run migrations to upgrade schema to current version
    pub fn migrate(&self) -> Result<()> {
        let current = self.schema_version()?.unwrap_or(0);

        if current == 1 {
            self.migrate_to_v2()?;
        }

        Ok(())
    }

    /// v1 catalogs predate `decision_number`
    fn migrate_to_v2(&self) -> Result<()> {
        let conn = self.conn()?;
        let has_column: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('golf_balls') WHERE name = 'decision_number'",
            [],
            |row| row.get(0),
        )?;

        if !has_column {
            tracing::info!("Migrating golf_balls: adding decision_number");
            conn.execute(
                "ALTER TABLE golf_balls ADD COLUMN decision_number TEXT NOT NULL DEFAULT ''",
                [],
            )?;
        }

        Ok(())
    }
}
