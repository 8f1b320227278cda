//! Storage layer for rollcall.
//!
//! Persists each collection as one serialized text document under a fixed
//! slot key in a small `SQLite` database. Reads happen once at startup;
//! every mutation rewrites the affected slot.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A named persistence slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The roster.
    Students,
    /// The attendance log.
    Attendance,
}

impl Slot {
    /// The storage key for this slot.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Attendance => "attendance",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Slot-based storage backed by `SQLite`.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates parent directories as needed and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the text stored in a slot, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load(&self, slot: Slot) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                [slot.key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Replace the text stored in a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save(&self, slot: Slot, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![slot.key(), value],
        )?;
        debug!("Saved slot {} ({} bytes)", slot, value.len());
        Ok(())
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let slots_written: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM slots", [], |row| row.get(0))?;

        let last_write: Option<String> = self
            .conn
            .query_row("SELECT MAX(updated_at) FROM slots", [], |row| row.get(0))
            .optional()?
            .flatten();

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            slots_written,
            last_write,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of slots that have been written at least once.
    pub slots_written: i64,
    /// `SQLite` timestamp of the most recent slot write.
    pub last_write: Option<String>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
