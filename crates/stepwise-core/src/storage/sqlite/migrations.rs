//! Schema initialization and versioning.

use rusqlite::Connection;

use crate::error::{Result, StorageResultExt, WizardError};

/// Schema version written to `PRAGMA user_version`.
pub(super) const SCHEMA_VERSION: i64 = 1;

/// Creates the schema from the embedded SQL file and stamps its version.
///
/// Files stamped with a newer version are refused rather than written with
/// an older layout.
pub(super) fn initialize_schema(connection: &Connection) -> Result<()> {
    let version = schema_version(connection)?;
    if version > SCHEMA_VERSION {
        return Err(WizardError::Configuration {
            message: format!(
                "Database schema version {version} is newer than supported version {SCHEMA_VERSION}"
            ),
        });
    }

    connection
        .execute_batch(include_str!("../../../assets/schema.sql"))
        .storage_context("Failed to initialize database schema")?;

    if version < SCHEMA_VERSION {
        log::debug!("Stamping draft database with schema version {SCHEMA_VERSION}");
        connection
            .pragma_update(None, "user_version", SCHEMA_VERSION)
            .storage_context("Failed to record schema version")?;
    }
    Ok(())
}

fn schema_version(connection: &Connection) -> Result<i64> {
    connection
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .storage_context("Failed to read schema version")
}
