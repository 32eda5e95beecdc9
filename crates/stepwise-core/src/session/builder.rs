//! Builder for creating and configuring [`Session`] instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tokio::{sync::Mutex, task};

use super::Session;
use crate::{
    autosave::{AutoSaveManager, DEFAULT_AUTO_SAVE_PERIOD},
    backend::Backend,
    draft::DraftStore,
    error::{Result, WizardError},
    models::OnlineStatus,
    offline::OfflineQueue,
    registry::StepRegistry,
    storage::{KeyValueStore, MemoryStore, SqliteStore, StorageKeys, DEFAULT_NAMESPACE},
    wizard::WizardState,
};

#[derive(Debug, Clone)]
enum StoreLocation {
    Default,
    File(PathBuf),
    Memory,
}

/// Builder for creating and configuring session instances.
#[derive(Clone)]
pub struct SessionBuilder {
    location: StoreLocation,
    namespace: String,
    auto_save_period: Duration,
    registry: Option<StepRegistry>,
    backend: Option<Arc<dyn Backend>>,
    online: OnlineStatus,
}

impl SessionBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            location: StoreLocation::Default,
            namespace: DEFAULT_NAMESPACE.to_string(),
            auto_save_period: DEFAULT_AUTO_SAVE_PERIOD,
            registry: None,
            backend: None,
            online: OnlineStatus::Unknown,
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/stepwise/drafts.db` or `~/.local/share/stepwise/drafts.db`
    pub fn with_store_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.location = StoreLocation::File(path.as_ref().to_path_buf());
        }
        self
    }

    /// Keeps drafts in memory only.
    pub fn in_memory(mut self) -> Self {
        self.location = StoreLocation::Memory;
        self
    }

    /// Prefix of every storage key the session writes.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_auto_save_period(mut self, period: Duration) -> Self {
        self.auto_save_period = period;
        self
    }

    /// Replaces the DFSA step registry.
    pub fn with_registry(mut self, registry: StepRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Remote copy of the draft, saved to and loaded from when online.
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_online_status(mut self, online: OnlineStatus) -> Self {
        self.online = online;
        self
    }

    /// Builds the configured session, starting from a fresh application.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidInput` for an empty namespace
    /// Returns `WizardError::FileSystem` if the store directory cannot be created
    /// Returns `WizardError::Storage` if database initialization fails
    pub async fn build(self) -> Result<Session> {
        if self.namespace.trim().is_empty() {
            return Err(WizardError::invalid_input("namespace").with_reason("must not be empty"));
        }

        let (store, store_path): (Arc<dyn KeyValueStore>, Option<PathBuf>) = match self.location {
            StoreLocation::Memory => (Arc::new(MemoryStore::new()), None),
            StoreLocation::File(path) => (Self::open_store(path.clone()).await?, Some(path)),
            StoreLocation::Default => {
                let path = Self::default_store_path()?;
                (Self::open_store(path.clone()).await?, Some(path))
            }
        };

        let keys = StorageKeys::new(&self.namespace);
        let registry = Arc::new(self.registry.unwrap_or_else(StepRegistry::dfsa));
        let wizard = Arc::new(Mutex::new(WizardState::new(Arc::clone(&registry))));
        let drafts = DraftStore::new(Arc::clone(&store), keys.clone());
        let queue = OfflineQueue::new(store, keys.offline_queue);
        let autosave = AutoSaveManager::new(drafts.clone(), Arc::clone(&wizard))
            .with_period(self.auto_save_period);

        log::debug!("Opened session in namespace {}", self.namespace);
        Ok(Session {
            registry,
            wizard,
            drafts,
            queue,
            autosave,
            backend: self.backend,
            online: self.online,
            record_id: self.namespace,
            store_path,
        })
    }

    async fn open_store(path: PathBuf) -> Result<Arc<dyn KeyValueStore>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WizardError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let store = task::spawn_blocking(move || SqliteStore::open(&path))
            .await
            .map_err(WizardError::join)??;
        Ok(Arc::new(store))
    }

    /// Returns the default store path following XDG Base Directory
    /// specification.
    fn default_store_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("stepwise")
            .place_data_file("drafts.db")
            .map_err(|e| WizardError::XdgDirectory(e.to_string()))
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
