//! Key/value statements.

use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StorageResultExt};

const SELECT_VALUE_SQL: &str = "SELECT value FROM kv_entries WHERE key = ?1";
const UPSERT_VALUE_SQL: &str = "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";
const DELETE_VALUE_SQL: &str = "DELETE FROM kv_entries WHERE key = ?1";

pub(super) fn get(connection: &Connection, key: &str) -> Result<Option<String>> {
    connection
        .query_row(SELECT_VALUE_SQL, params![key], |row| row.get(0))
        .optional()
        .storage_context("Failed to read entry")
}

pub(super) fn upsert(connection: &Connection, key: &str, value: &str) -> Result<()> {
    let now = Timestamp::now().to_string();
    connection
        .execute(UPSERT_VALUE_SQL, params![key, value, now])
        .storage_context("Failed to write entry")?;
    Ok(())
}

pub(super) fn delete(connection: &Connection, key: &str) -> Result<()> {
    connection
        .execute(DELETE_VALUE_SQL, params![key])
        .storage_context("Failed to delete entry")?;
    Ok(())
}
