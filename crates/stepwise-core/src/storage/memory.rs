//! In-memory key/value store.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use super::KeyValueStore;
use crate::error::{Result, WizardError};

/// Process-local store, optionally limited to a number of bytes.
///
/// The quota counts key and value bytes of every entry. A write that would
/// exceed it is refused with [`WizardError::StorageWrite`] and leaves the
/// previous value in place.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(bytes),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries.lock().map_err(|_| WizardError::Configuration {
            message: "Memory store lock poisoned".to_string(),
        })
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;

        if let Some(quota) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(WizardError::StorageWrite {
                    key: key.to_string(),
                    reason: format!("Quota of {quota} bytes exceeded"),
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_quota_refuses_oversized_writes() {
        let store = MemoryStore::with_quota(10);
        store.set("a", "12345").unwrap();

        let err = store.set("b", "1234567").unwrap_err();
        assert!(matches!(err, WizardError::StorageWrite { ref key, .. } if key == "b"));
        assert_eq!(store.get("b").unwrap(), None);

        // Overwriting an entry only counts the new value
        store.set("a", "123456789").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("123456789"));
    }
}
