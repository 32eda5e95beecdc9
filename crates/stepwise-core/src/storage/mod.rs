//! Durable key/value storage.
//!
//! Drafts, draft metadata and the offline queue are stored as whole JSON
//! strings under keys derived from a namespace (see [`StorageKeys`]). Every
//! write overwrites the previous value for its key.
//!
//! - [`MemoryStore`]: in-process map with an optional byte quota
//! - [`SqliteStore`]: a single SQLite table, one connection per operation

use crate::error::Result;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "dfsa-fs-application-draft";

/// String-keyed storage with whole-value overwrite.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// The keys a session writes, derived from one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub draft: String,
    pub metadata: String,
    pub offline_queue: String,
}

impl StorageKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            draft: namespace.to_string(),
            metadata: format!("{namespace}-metadata"),
            offline_queue: format!("{namespace}-offline-queue"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
