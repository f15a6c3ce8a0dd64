//! Local client storage
//!
//! A small SQLite-backed key-value store playing the role of the browser's
//! local storage: it keeps the session tokens and the signed-in user across
//! runs. Domain entities are never stored here, they belong to the API.

use crate::core::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Key of the bearer token
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Key of the signed-in user (JSON)
pub const USER_KEY: &str = "user";

/// Key-value storage manager
pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    /// Open the storage file under the user's data directory
    pub fn new() -> Result<Self> {
        Self::open(&Self::storage_path()?)
    }

    /// Open (or create) storage at an explicit path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        let storage = Self { conn };
        storage.init_schema()?;

        Ok(storage)
    }

    /// Storage that lives only as long as the value
    pub fn open_in_memory() -> Result<Self> {
        let storage = Self {
            conn: Connection::open_in_memory()?,
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Get the storage file path
    fn storage_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| Error::Database(rusqlite::Error::InvalidPath(PathBuf::new())))?;

        let app_dir = data_dir.join("gascontrol");
        std::fs::create_dir_all(&app_dir)?;

        Ok(app_dir.join("storage.db"))
    }

    /// Initialize storage schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    /// Read a value
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Write a value, replacing any previous one
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        self.conn.execute(
            r#"INSERT INTO local_storage (key, value, updated_at)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(key) DO UPDATE SET
                   value = ?2,
                   updated_at = ?3"#,
            params![key, value, now],
        )?;

        Ok(())
    }

    /// Delete a value; absent keys are ignored
    pub fn remove_item(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM local_storage", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
