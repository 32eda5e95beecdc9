//! Remote record store the session syncs drafts to.
//!
//! A [`Backend`] offers point reads and writes keyed by record id, plus a
//! change feed. Subscribers see insert and update events in the order the
//! backend emitted them; a subscriber that falls too far behind skips the
//! events it missed.

use std::{collections::HashMap, sync::atomic::AtomicBool, sync::atomic::Ordering};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};

use crate::error::{Result, WizardError};

const CHANNEL_CAPACITY: usize = 64;

/// One stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub data: Value,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
}

/// Emitted once per successful `put`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: Record,
}

/// Which events a subscription receives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    id_prefix: Option<String>,
    kind: Option<ChangeKind>,
}

impl ChangeFilter {
    /// Every event.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    pub fn kind(mut self, kind: ChangeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        let id_ok = self
            .id_prefix
            .as_deref()
            .map_or(true, |prefix| event.record.id.starts_with(prefix));
        let kind_ok = self.kind.map_or(true, |kind| kind == event.kind);
        id_ok && kind_ok
    }
}

/// Filtered view over a backend's change feed.
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    filter: ChangeFilter,
}

impl Subscription {
    pub fn new(receiver: broadcast::Receiver<ChangeEvent>, filter: ChangeFilter) -> Self {
        Self { receiver, filter }
    }

    /// Waits for the next matching event. `None` once the backend is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Change subscription lagged, skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Record>>;

    /// Inserts or replaces the record and notifies subscribers.
    async fn put(&self, id: &str, data: Value) -> Result<Record>;

    fn subscribe(&self, filter: ChangeFilter) -> Subscription;
}

/// In-process backend. Can be switched unavailable to exercise fallbacks.
pub struct MemoryBackend {
    records: Mutex<HashMap<String, Record>>,
    events: broadcast::Sender<ChangeEvent>,
    available: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            records: Mutex::new(HashMap::new()),
            events,
            available: AtomicBool::new(true),
        }
    }

    /// While unavailable every call fails with a network error.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(WizardError::network("Backend unavailable"))
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, id: &str) -> Result<Option<Record>> {
        self.ensure_available()?;
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn put(&self, id: &str, data: Value) -> Result<Record> {
        self.ensure_available()?;

        let record = Record {
            id: id.to_string(),
            data,
            updated_at: Timestamp::now(),
        };
        let kind = match self
            .records
            .lock()
            .await
            .insert(id.to_string(), record.clone())
        {
            Some(_) => ChangeKind::Update,
            None => ChangeKind::Insert,
        };

        // No subscribers is fine
        let _ = self.events.send(ChangeEvent {
            kind,
            record: record.clone(),
        });
        Ok(record)
    }

    fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        Subscription::new(self.events.subscribe(), filter)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let backend = MemoryBackend::new();
        assert!(backend.get("app-1").await.unwrap().is_none());

        backend.put("app-1", json!({ "firmName": "Acme" })).await.unwrap();
        let record = backend.get("app-1").await.unwrap().unwrap();
        assert_eq!(record.data["firmName"], "Acme");
    }

    #[tokio::test]
    async fn test_subscription_sees_insert_then_update() {
        let backend = MemoryBackend::new();
        let mut changes = backend.subscribe(ChangeFilter::all());

        backend.put("app-1", json!(1)).await.unwrap();
        backend.put("app-1", json!(2)).await.unwrap();

        let first = changes.next().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Insert);
        let second = changes.next().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Update);
        assert_eq!(second.record.data, json!(2));
    }

    #[tokio::test]
    async fn test_filter_skips_other_records() {
        let backend = MemoryBackend::new();
        let mut changes = backend.subscribe(ChangeFilter::all().id_prefix("draft-"));

        backend.put("ticket-9", json!({})).await.unwrap();
        backend.put("draft-1", json!({})).await.unwrap();

        let event = changes.next().await.unwrap();
        assert_eq!(event.record.id, "draft-1");
    }

    #[tokio::test]
    async fn test_subscription_ends_with_backend() {
        let backend = MemoryBackend::new();
        let mut changes = backend.subscribe(ChangeFilter::all().kind(ChangeKind::Update));
        drop(backend);
        assert!(changes.next().await.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_backend_fails() {
        let backend = MemoryBackend::new();
        backend.set_available(false);
        let err = backend.put("app-1", json!({})).await.unwrap_err();
        assert!(matches!(err, WizardError::Network { .. }));
        backend.set_available(true);
        assert!(backend.get("app-1").await.unwrap().is_none());
    }
}
