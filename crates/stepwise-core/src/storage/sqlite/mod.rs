//! SQLite-backed key/value store.
//!
//! Entries live in the `kv_entries` table created from the embedded
//! `assets/schema.sql`. Each operation opens its own connection and
//! initializes the schema, so a store can be shared freely between threads
//! and blocking tasks.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::KeyValueStore;
use crate::error::{Result, StorageResultExt};

mod migrations;
mod queries;

/// Key/value store persisted in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.connect()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let connection =
            Connection::open(&self.path).storage_context("Failed to open database connection")?;
        migrations::initialize_schema(&connection)?;
        Ok(connection)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        queries::get(&self.connect()?, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        queries::upsert(&self.connect()?, key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        queries::delete(&self.connect()?, key)
    }
}
