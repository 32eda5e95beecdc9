//! One user's application session.
//!
//! A [`Session`] ties the wizard state to its draft storage: the shared
//! [`WizardState`] handle, the [`DraftStore`] and offline queue in the
//! configured namespace, the auto-save timer and, optionally, a remote
//! [`Backend`]. Create one with [`SessionBuilder`].
//!
//! ```rust
//! use serde_json::json;
//! use stepwise_core::SessionBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = SessionBuilder::new().in_memory().build().await?;
//! session.update_field("firmName", json!("Acme Capital")).await?;
//!
//! let saved = session.save().await;
//! assert!(saved.success);
//! # Ok(())
//! # }
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde_json::Value;
use tokio::{
    sync::{watch, Mutex},
    task,
};

use crate::{
    autosave::{AutoSaveManager, SaveState},
    backend::Backend,
    draft::DraftStore,
    error::{Result, WizardError},
    models::{DraftMetadata, OnlineStatus, SaveIndicator, SaveResult},
    offline::{
        load_with_offline_fallback, save_with_offline_fallback, OfflineLoadResult, OfflineQueue,
        OfflineSaveResult, ProcessSummary, RemoteDraftSync, RemoteTarget,
    },
    registry::StepRegistry,
    wizard::WizardState,
};

pub mod builder;

#[cfg(test)]
mod tests;

pub use builder::SessionBuilder;

/// Wizard state plus everything that persists it.
pub struct Session {
    registry: Arc<StepRegistry>,
    wizard: Arc<Mutex<WizardState>>,
    drafts: DraftStore,
    queue: OfflineQueue,
    autosave: AutoSaveManager,
    backend: Option<Arc<dyn Backend>>,
    online: OnlineStatus,
    record_id: String,
    store_path: Option<PathBuf>,
}

impl Session {
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Shared handle to the wizard; the auto-save timer reads through it too.
    pub fn wizard(&self) -> Arc<Mutex<WizardState>> {
        Arc::clone(&self.wizard)
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// Database file, when the session is not memory-backed.
    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    pub fn online_status(&self) -> OnlineStatus {
        self.online
    }

    pub fn set_online_status(&mut self, online: OnlineStatus) {
        if self.online != online {
            log::debug!("Connectivity changed to {online:?}");
        }
        self.online = online;
    }

    /// Restores the stored draft, preferring the server copy when online.
    ///
    /// Without a draft the wizard keeps its fresh state.
    pub async fn resume(&self) -> OfflineLoadResult {
        let result = load_with_offline_fallback(&self.drafts, self.online, self.remote()).await;
        if let Some(draft) = result.data.clone() {
            let restored = WizardState::restore(Arc::clone(&self.registry), draft);
            log::debug!(
                "Resumed draft at step {}",
                restored.current_step_id().unwrap_or("-")
            );
            *self.wizard.lock().await = restored;
        }
        result
    }

    pub async fn update_field(&self, path: &str, value: Value) -> Result<()> {
        self.wizard.lock().await.update_field(path, value)
    }

    /// Saves locally and, when a backend is configured, remotely.
    ///
    /// Waits for any auto-save or earlier save still writing.
    pub async fn save(&self) -> OfflineSaveResult {
        let _guard = self.drafts.begin_save().await;
        let snapshot = self.wizard.lock().await.snapshot();
        let result = save_with_offline_fallback(
            &self.drafts,
            &self.queue,
            &snapshot,
            self.online,
            self.remote(),
        )
        .await;

        if let Some(timestamp) = result.timestamp.filter(|_| result.success) {
            self.wizard.lock().await.set_last_saved(timestamp);
        }
        result
    }

    /// Local save through the auto-save path, updating the save status.
    pub async fn save_now(&self) -> SaveResult {
        self.autosave.save_now().await
    }

    pub fn start_auto_save(&mut self) {
        self.autosave.start();
    }

    pub fn stop_auto_save(&mut self) {
        self.autosave.stop();
    }

    pub fn save_state(&self) -> SaveState {
        self.autosave.status()
    }

    pub fn subscribe_save_status(&self) -> watch::Receiver<SaveState> {
        self.autosave.subscribe()
    }

    pub fn save_indicator(&self) -> SaveIndicator {
        SaveIndicator::from_state(self.autosave.status().status, self.online)
    }

    /// Replays queued operations against the backend.
    ///
    /// Does nothing while offline or without a backend.
    pub async fn sync_pending(&self) -> Result<ProcessSummary> {
        let Some(backend) = &self.backend else {
            return Ok(ProcessSummary::default());
        };
        if self.online.is_offline() {
            return Ok(ProcessSummary::default());
        }

        let summary = self
            .queue
            .process(&RemoteDraftSync::new(Arc::clone(backend)))
            .await?;
        if summary.processed > 0 || summary.failed > 0 {
            log::debug!(
                "Synced pending operations: {} processed, {} failed",
                summary.processed,
                summary.failed
            );
        }
        Ok(summary)
    }

    pub async fn draft_metadata(&self) -> Result<Option<DraftMetadata>> {
        let drafts = self.drafts.clone();
        task::spawn_blocking(move || drafts.load_metadata())
            .await
            .map_err(WizardError::join)
    }

    /// Removes the stored draft and queued operations. The wizard in memory
    /// is left as it is.
    pub async fn clear_draft(&self) -> Result<()> {
        let drafts = self.drafts.clone();
        let queue = self.queue.clone();
        task::spawn_blocking(move || {
            drafts.clear()?;
            queue.clear()
        })
        .await
        .map_err(WizardError::join)?
    }

    fn remote(&self) -> Option<RemoteTarget<'_>> {
        self.backend.as_deref().map(|backend| RemoteTarget {
            backend,
            record_id: &self.record_id,
        })
    }
}
