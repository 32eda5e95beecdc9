//! Periodic draft saving.
//!
//! [`AutoSaveManager`] owns at most one timer task. Each tick snapshots the
//! wizard through the shared handle at fire time, so the latest edits are
//! always the ones written. Manual saves go through the same path, and all
//! saves on one [`DraftStore`] run one at a time in the order they started.
//!
//! Save failures never propagate out of the timer: they are logged and
//! published as [`SaveStatus::Error`] to every subscriber.

use std::{sync::Arc, time::Duration};

use jiff::Timestamp;
use tokio::{
    sync::{watch, Mutex},
    task::{self, JoinHandle},
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    draft::DraftStore,
    models::{SaveResult, SaveStatus},
    wizard::WizardState,
};

/// Period used when none is configured.
pub const DEFAULT_AUTO_SAVE_PERIOD: Duration = Duration::from_secs(30);

/// Save status as published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveState {
    pub status: SaveStatus,
    pub last_saved: Option<Timestamp>,
    pub error: Option<String>,
}

/// Timer-driven saver for one wizard session.
pub struct AutoSaveManager {
    drafts: DraftStore,
    wizard: Arc<Mutex<WizardState>>,
    period: Duration,
    status: Arc<watch::Sender<SaveState>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoSaveManager {
    pub fn new(drafts: DraftStore, wizard: Arc<Mutex<WizardState>>) -> Self {
        let (status, _) = watch::channel(SaveState::default());
        Self {
            drafts,
            wizard,
            period: DEFAULT_AUTO_SAVE_PERIOD,
            status: Arc::new(status),
            handle: None,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts the timer. Calling it while running does nothing.
    ///
    /// The first save happens one full period after the call.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let drafts = self.drafts.clone();
        let wizard = Arc::clone(&self.wizard);
        let status = Arc::clone(&self.status);
        let period = self.period;

        log::debug!("Starting auto-save every {period:?}");
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                save(&drafts, &wizard, &status).await;
            }
        }));
    }

    /// Stops the timer and drops its handle.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("Stopping auto-save");
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Saves immediately, outside the timer.
    pub async fn save_now(&self) -> SaveResult {
        save(&self.drafts, &self.wizard, &self.status).await
    }

    pub fn status(&self) -> SaveState {
        self.status.borrow().clone()
    }

    /// Receives every status change from now on.
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.status.subscribe()
    }
}

impl Drop for AutoSaveManager {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn save(
    drafts: &DraftStore,
    wizard: &Mutex<WizardState>,
    status: &watch::Sender<SaveState>,
) -> SaveResult {
    status.send_modify(|state| {
        state.status = SaveStatus::Saving;
        state.error = None;
    });

    let _guard = drafts.begin_save().await;
    let snapshot = wizard.lock().await.snapshot();
    let store = drafts.clone();
    let result = task::spawn_blocking(move || store.save(&snapshot))
        .await
        .unwrap_or_else(|e| SaveResult::failed(format!("Task join error: {e}")));

    if result.success {
        wizard.lock().await.set_last_saved(result.timestamp);
        status.send_modify(|state| {
            state.status = SaveStatus::Saved;
            state.last_saved = Some(result.timestamp);
        });
    } else {
        log::warn!(
            "Auto-save failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
        status.send_modify(|state| {
            state.status = SaveStatus::Error;
            state.error = result.error.clone();
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::{
        error::Result,
        registry::StepRegistry,
        storage::{KeyValueStore, MemoryStore, StorageKeys},
    };

    /// Memory store that counts writes.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: AtomicUsize,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    /// Memory store whose first write blocks for a while.
    #[derive(Default)]
    struct SlowFirstWriteStore {
        inner: MemoryStore,
        slowed: AtomicBool,
    }

    impl KeyValueStore for SlowFirstWriteStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if !self.slowed.swap(true, Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(200));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    fn setup(store: Arc<dyn KeyValueStore>) -> (AutoSaveManager, Arc<Mutex<WizardState>>, DraftStore) {
        let wizard = Arc::new(Mutex::new(WizardState::new(Arc::new(StepRegistry::dfsa()))));
        let drafts = DraftStore::new(store, StorageKeys::default());
        let manager = AutoSaveManager::new(drafts.clone(), Arc::clone(&wizard));
        (manager, wizard, drafts)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_save_latest_state() {
        let (mut manager, wizard, drafts) = setup(Arc::new(MemoryStore::new()));
        let mut status = manager.subscribe();
        manager.start();
        assert!(manager.is_running());

        wizard.lock().await.update_field("firmName", json!("First")).unwrap();
        time::sleep(Duration::from_secs(31)).await;
        let first = status
            .wait_for(|s| s.status == SaveStatus::Saved)
            .await
            .unwrap()
            .last_saved
            .unwrap();

        wizard.lock().await.update_field("firmName", json!("Second")).unwrap();
        time::sleep(Duration::from_secs(30)).await;
        let second = status
            .wait_for(|s| s.last_saved.is_some_and(|t| t > first))
            .await
            .unwrap()
            .last_saved
            .unwrap();

        assert!(second > first);
        let stored = drafts.load().data.unwrap();
        assert_eq!(stored.form_data.get_str("firmName"), Some("Second"));
        assert_eq!(stored.metadata.last_saved, second);
        assert_eq!(wizard.lock().await.last_saved(), Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let store = Arc::new(CountingStore::default());
        let (mut manager, _wizard, _drafts) = setup(Arc::clone(&store) as Arc<dyn KeyValueStore>);
        let mut status = manager.subscribe();

        manager.start();
        manager.start();
        time::sleep(Duration::from_secs(31)).await;
        status.wait_for(|s| s.status == SaveStatus::Saved).await.unwrap();

        // One save writes the draft and its metadata
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_drop_cancel_the_timer() {
        let store = Arc::new(CountingStore::default());
        let (mut manager, wizard, drafts) = setup(Arc::clone(&store) as Arc<dyn KeyValueStore>);

        manager.start();
        manager.stop();
        assert!(!manager.is_running());
        time::sleep(Duration::from_secs(90)).await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);

        manager.start();
        drop(manager);
        time::sleep(Duration::from_secs(90)).await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);

        // The session can keep using the draft store after the manager is gone
        let result = drafts.save(&wizard.lock().await.snapshot());
        assert!(result.success);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_later_save_is_not_overwritten_by_slow_earlier_save() {
        let (manager, wizard, drafts) = setup(Arc::new(SlowFirstWriteStore::default()));
        wizard.lock().await.update_field("firmName", json!("A")).unwrap();

        let (first, second) = tokio::join!(manager.save_now(), async {
            wizard.lock().await.update_field("firmName", json!("B")).unwrap();
            manager.save_now().await
        });

        assert!(first.success);
        assert!(second.success);
        assert!(second.timestamp >= first.timestamp);
        let stored = drafts.load().data.unwrap();
        assert_eq!(stored.form_data.get_str("firmName"), Some("B"));
        assert_eq!(stored.metadata.last_saved, second.timestamp);
        assert_eq!(wizard.lock().await.last_saved(), Some(second.timestamp));
    }

    #[tokio::test]
    async fn test_failures_land_in_status() {
        let (manager, _wizard, _drafts) = setup(Arc::new(MemoryStore::with_quota(8)));

        let result = manager.save_now().await;
        assert!(!result.success);

        let state = manager.status();
        assert_eq!(state.status, SaveStatus::Error);
        assert!(state.error.is_some());
        assert_eq!(state.last_saved, None);
    }

    #[tokio::test]
    async fn test_manual_save_uses_same_path() {
        let (manager, wizard, drafts) = setup(Arc::new(MemoryStore::new()));
        wizard.lock().await.update_field("firmName", json!("Manual")).unwrap();

        let result = manager.save_now().await;
        assert!(result.success);
        assert_eq!(manager.status().status, SaveStatus::Saved);
        assert_eq!(drafts.last_saved(), Some(result.timestamp));
    }
}
