//! Offline fallback and the pending-operation queue.
//!
//! Drafts are always written locally first. Work that needs the server
//! (remote saves, submissions, uploads) is queued as [`PendingOperation`]s
//! when the server cannot be reached, and replayed later by
//! [`OfflineQueue::process`].

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task;
use uuid::Uuid;

use crate::{
    backend::Backend,
    draft::DraftStore,
    error::{Result, WizardError},
    models::{DraftData, DraftSnapshot, LoadResult, OnlineStatus},
    storage::KeyValueStore,
};

/// Attempts before a pending operation is given up.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Save,
    Submit,
    Upload,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Save => "save",
            OperationType::Submit => "submit",
            OperationType::Upload => "upload",
        }
    }
}

/// Server work recorded while offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OperationType,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub data: Value,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl PendingOperation {
    fn is_save_of(&self, record_id: &str) -> bool {
        self.kind == OperationType::Save
            && self.data.get("recordId").and_then(Value::as_str) == Some(record_id)
    }
}

/// Counts from one pass over the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Executes queued operations.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Whether operations of `kind` can be run by this handler.
    fn supports(&self, kind: OperationType) -> bool;

    /// `Ok(false)` and `Err` both count as a failed attempt.
    async fn run(&self, operation: &PendingOperation) -> Result<bool>;
}

/// Pending operations persisted as one JSON array under a single key.
#[derive(Clone)]
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl std::fmt::Debug for OfflineQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineQueue").field("key", &self.key).finish()
    }
}

impl OfflineQueue {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Queued operations, oldest first. An unreadable queue reads as empty.
    pub fn pending(&self) -> Vec<PendingOperation> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Failed to read offline queue: {e}");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("Discarding unreadable offline queue: {e}");
            Vec::new()
        })
    }

    pub fn len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }

    /// Appends an operation and returns its id.
    pub fn enqueue(&self, kind: OperationType, data: Value) -> Result<String> {
        let mut operations = self.pending();
        let id = Self::push(&mut operations, kind, data);
        self.write(&operations)?;

        log::debug!("Queued {} operation {id}", kind.as_str());
        Ok(id)
    }

    /// Queues a remote save of `draft`, replacing any save already queued
    /// for the same record. Only the latest draft is worth sending.
    pub fn enqueue_save(&self, record_id: &str, draft: Value) -> Result<String> {
        let mut operations = self.pending();
        let before = operations.len();
        operations.retain(|op| !op.is_save_of(record_id));
        let replaced = before - operations.len();

        let data = json!({ "recordId": record_id, "draft": draft });
        let id = Self::push(&mut operations, OperationType::Save, data);
        self.write(&operations)?;

        log::debug!("Queued save of {record_id} as {id}, replacing {replaced}");
        Ok(id)
    }

    fn push(operations: &mut Vec<PendingOperation>, kind: OperationType, data: Value) -> String {
        let operation = PendingOperation {
            id: Uuid::new_v4().to_string(),
            kind,
            timestamp: Timestamp::now().as_millisecond(),
            data,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        };
        let id = operation.id.clone();
        operations.push(operation);
        id
    }

    /// Removes one operation. Returns whether it was queued.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut operations = self.pending();
        let before = operations.len();
        operations.retain(|op| op.id != id);
        if operations.len() == before {
            return Ok(false);
        }
        self.write(&operations)?;
        Ok(true)
    }

    /// Bumps the retry count of one operation and returns the new count.
    pub fn record_retry(&self, id: &str) -> Result<Option<u32>> {
        let mut operations = self.pending();
        let Some(operation) = operations.iter_mut().find(|op| op.id == id) else {
            return Ok(None);
        };
        operation.retry_count += 1;
        let count = operation.retry_count;
        self.write(&operations)?;
        Ok(Some(count))
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }

    /// Runs every queued operation once.
    ///
    /// Successful operations are removed. A failed one has its retry count
    /// bumped and is dropped once the count reaches its `max_retries`.
    /// Operations the handler does not support are dropped without running.
    pub async fn process<H>(&self, handler: &H) -> Result<ProcessSummary>
    where
        H: OperationHandler + ?Sized,
    {
        let operations = self.pending();
        if operations.is_empty() {
            return Ok(ProcessSummary::default());
        }
        log::debug!("Processing {} pending operations", operations.len());

        let mut summary = ProcessSummary::default();
        let mut dropped = HashSet::new();
        let mut retried = HashSet::new();

        for operation in &operations {
            if !handler.supports(operation.kind) {
                log::warn!(
                    "No handler for {} operation {}, dropping it",
                    operation.kind.as_str(),
                    operation.id
                );
                dropped.insert(operation.id.clone());
                continue;
            }

            let succeeded = match handler.run(operation).await {
                Ok(succeeded) => succeeded,
                Err(e) => {
                    log::warn!("Pending operation {} failed: {e}", operation.id);
                    false
                }
            };

            if succeeded {
                summary.processed += 1;
                dropped.insert(operation.id.clone());
            } else if operation.retry_count + 1 >= operation.max_retries {
                log::warn!(
                    "Giving up on {} operation {} after {} attempts",
                    operation.kind.as_str(),
                    operation.id,
                    operation.retry_count + 1
                );
                summary.failed += 1;
                dropped.insert(operation.id.clone());
            } else {
                retried.insert(operation.id.clone());
            }
        }

        // Re-read so operations queued while handlers ran are kept
        let mut remaining = self.pending();
        remaining.retain(|op| !dropped.contains(&op.id));
        for operation in &mut remaining {
            if retried.contains(&operation.id) {
                operation.retry_count += 1;
            }
        }
        self.write(&remaining)?;

        Ok(summary)
    }

    fn write(&self, operations: &[PendingOperation]) -> Result<()> {
        if operations.is_empty() {
            return self.store.remove(&self.key);
        }
        let raw = serde_json::to_string(operations)?;
        self.store.set(&self.key, &raw)
    }
}

/// Replays queued `save` operations against a backend.
pub struct RemoteDraftSync {
    backend: Arc<dyn Backend>,
}

impl RemoteDraftSync {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl OperationHandler for RemoteDraftSync {
    fn supports(&self, kind: OperationType) -> bool {
        kind == OperationType::Save
    }

    async fn run(&self, operation: &PendingOperation) -> Result<bool> {
        let record_id = operation
            .data
            .get("recordId")
            .and_then(Value::as_str)
            .ok_or_else(|| WizardError::invalid_input("recordId").with_reason("missing"))?;
        let draft = operation.data.get("draft").cloned().unwrap_or(Value::Null);
        self.backend.put(record_id, draft).await?;
        Ok(true)
    }
}

/// Outcome of [`save_with_offline_fallback`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSaveResult {
    pub success: bool,
    pub saved_locally: bool,
    pub timestamp: Option<Timestamp>,
    pub error: Option<String>,
}

/// Outcome of [`load_with_offline_fallback`].
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineLoadResult {
    pub data: Option<DraftData>,
    pub from_local: bool,
    pub error: Option<String>,
}

/// Where a draft goes besides local storage.
#[derive(Clone, Copy)]
pub struct RemoteTarget<'a> {
    pub backend: &'a dyn Backend,
    pub record_id: &'a str,
}

/// Saves locally, then remotely when online.
///
/// A remote save that cannot happen (offline, or the server failed) is
/// queued and the save still counts as a success.
pub async fn save_with_offline_fallback(
    drafts: &DraftStore,
    queue: &OfflineQueue,
    snapshot: &DraftSnapshot,
    online: OnlineStatus,
    remote: Option<RemoteTarget<'_>>,
) -> OfflineSaveResult {
    let timestamp = Timestamp::now();
    let draft = DraftStore::build_draft(snapshot, timestamp);

    let local = {
        let drafts = drafts.clone();
        let draft = draft.clone();
        task::spawn_blocking(move || drafts.write(&draft))
            .await
            .map_err(WizardError::join)
            .and_then(|result| result)
    };
    if let Err(e) = local {
        log::warn!("Local draft save failed: {e}");
        return OfflineSaveResult {
            success: false,
            saved_locally: false,
            timestamp: None,
            error: Some("Failed to save locally".to_string()),
        };
    }

    let saved = |error: Option<&str>| OfflineSaveResult {
        success: true,
        saved_locally: true,
        timestamp: Some(timestamp),
        error: error.map(str::to_string),
    };

    let Some(remote) = remote else {
        return saved(None);
    };

    let queue_save = |draft: &DraftData| -> Result<()> {
        queue
            .enqueue_save(remote.record_id, serde_json::to_value(draft)?)
            .map(|_| ())
    };

    if online.is_offline() {
        if let Err(e) = queue_save(&draft) {
            log::warn!("Failed to queue offline save: {e}");
        }
        return saved(None);
    }

    let remote_result = match serde_json::to_value(&draft) {
        Ok(value) => remote.backend.put(remote.record_id, value).await.map(|_| ()),
        Err(e) => Err(e.into()),
    };
    match remote_result {
        Ok(()) => saved(None),
        Err(e) => {
            log::warn!("Server save failed: {e}");
            if let Err(e) = queue_save(&draft) {
                log::warn!("Failed to queue server save: {e}");
            }
            saved(Some("Server save failed, saved locally"))
        }
    }
}

/// Loads from the server when online, falling back to the local draft.
pub async fn load_with_offline_fallback(
    drafts: &DraftStore,
    online: OnlineStatus,
    remote: Option<RemoteTarget<'_>>,
) -> OfflineLoadResult {
    if let (Some(remote), false) = (remote, online.is_offline()) {
        match remote.backend.get(remote.record_id).await {
            Ok(Some(record)) => match serde_json::from_value::<DraftData>(record.data) {
                Ok(data) => {
                    return OfflineLoadResult {
                        data: Some(data),
                        from_local: false,
                        error: None,
                    }
                }
                Err(e) => log::warn!("Server draft unreadable, using local copy: {e}"),
            },
            Ok(None) => log::debug!("No server draft, using local copy"),
            Err(e) => log::warn!("Server load failed, using local copy: {e}"),
        }
    }

    let drafts = drafts.clone();
    let local = task::spawn_blocking(move || drafts.load())
        .await
        .unwrap_or_else(|e| LoadResult::failed(format!("Task join error: {e}")));

    OfflineLoadResult {
        data: local.data,
        from_local: true,
        error: local.error,
    }
}
