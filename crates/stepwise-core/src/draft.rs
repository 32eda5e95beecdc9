//! Draft persistence.
//!
//! A draft is written as two blobs: the complete [`DraftData`] under the
//! draft key and a copy of its [`DraftMetadata`] under the metadata key, so
//! "last saved" and progress can be shown without reading the whole form.
//!
//! Saving and loading never return `Err`: storage and parse failures are
//! reported through [`SaveResult`] / [`LoadResult`].

use std::{fmt, sync::Arc};

use jiff::{tz::TimeZone, Timestamp};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    error::Result,
    models::{DraftData, DraftMetadata, DraftSnapshot, LoadResult, SaveResult, DRAFT_VERSION},
    storage::{KeyValueStore, StorageKeys},
};

/// Share of applicable steps that are completed, rounded to a whole percent.
///
/// Completed steps that no longer apply are not counted, unlike a plain
/// `completed / applicable` ratio. Steps completed before a change of answers
/// hid them would otherwise inflate the figure, even past 100. No applicable
/// steps means 0.
///
/// ```rust
/// use stepwise_core::draft::progress_percent;
///
/// let completed = vec!["a".to_string(), "b".to_string()];
/// let applicable = vec!["a", "b", "c", "d"].into_iter().map(String::from).collect::<Vec<_>>();
/// assert_eq!(progress_percent(&completed, &applicable), 50);
/// assert_eq!(progress_percent(&completed, &[]), 0);
/// ```
pub fn progress_percent(completed: &[String], applicable: &[String]) -> u8 {
    if applicable.is_empty() {
        return 0;
    }
    let done = completed
        .iter()
        .filter(|id| applicable.contains(id))
        .count();
    let total = applicable.len();
    // Round half up
    ((200 * done + total) / (2 * total)) as u8
}

/// Human readable "last saved" label in the system time zone.
pub fn format_last_saved(timestamp: Option<Timestamp>) -> String {
    format_last_saved_in(timestamp, Timestamp::now(), &TimeZone::system())
}

/// "Not saved yet", "Saved at 14:05" for today, "Saved Mar 3 at 14:05" otherwise.
pub fn format_last_saved_in(timestamp: Option<Timestamp>, now: Timestamp, tz: &TimeZone) -> String {
    let Some(timestamp) = timestamp else {
        return "Not saved yet".to_string();
    };

    let saved = timestamp.to_zoned(tz.clone());
    let today = now.to_zoned(tz.clone());
    let time = saved.strftime("%H:%M");

    if saved.date() == today.date() {
        format!("Saved at {time}")
    } else {
        format!("Saved {} at {time}", saved.strftime("%b %-d"))
    }
}

/// Reads and writes drafts in a [`KeyValueStore`].
///
/// Clones share one save guard, see [`begin_save`](Self::begin_save).
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    saves: Arc<Mutex<()>>,
}

impl fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftStore").field("keys", &self.keys).finish()
    }
}

impl DraftStore {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self {
            store,
            keys,
            saves: Arc::new(Mutex::new(())),
        }
    }

    /// Waits for saves already in progress and blocks new ones until the
    /// guard is dropped.
    ///
    /// Hold it from taking the snapshot until the write has finished. The
    /// guard is granted in request order, so the save started last is the
    /// one left in storage.
    pub async fn begin_save(&self) -> MutexGuard<'_, ()> {
        self.saves.lock().await
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Saves the snapshot stamped with the current time.
    pub fn save(&self, snapshot: &DraftSnapshot) -> SaveResult {
        self.save_at(snapshot, Timestamp::now())
    }

    /// Saves the snapshot stamped with `timestamp`.
    pub fn save_at(&self, snapshot: &DraftSnapshot, timestamp: Timestamp) -> SaveResult {
        let draft = Self::build_draft(snapshot, timestamp);
        match self.write(&draft) {
            Ok(()) => {
                log::debug!(
                    "Saved draft at step {} ({}%)",
                    draft.metadata.current_step,
                    draft.metadata.progress_percent
                );
                SaveResult::saved(timestamp)
            }
            Err(e) => {
                log::warn!("Failed to save draft: {e}");
                SaveResult::failed(e.to_string())
            }
        }
    }

    /// Writes an already assembled draft, full blob first.
    pub fn write(&self, draft: &DraftData) -> Result<()> {
        let data = serde_json::to_string(draft)?;
        let metadata = serde_json::to_string(&draft.metadata)?;
        self.store.set(&self.keys.draft, &data)?;
        self.store.set(&self.keys.metadata, &metadata)?;
        Ok(())
    }

    /// Loads the stored draft.
    ///
    /// A missing draft is a success without data. Malformed JSON, or a blob
    /// without `formData` and `metadata`, is a failure.
    pub fn load(&self) -> LoadResult {
        let raw = match self.store.get(&self.keys.draft) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadResult::empty(),
            Err(e) => return LoadResult::failed(e.to_string()),
        };

        match Self::parse(&raw) {
            Ok(draft) => LoadResult::found(draft),
            Err(reason) => {
                log::warn!("Failed to load draft: {reason}");
                LoadResult::failed(reason)
            }
        }
    }

    /// Loads only the metadata blob; unreadable metadata counts as absent.
    pub fn load_metadata(&self) -> Option<DraftMetadata> {
        let raw = self.store.get(&self.keys.metadata).ok().flatten()?;
        serde_json::from_str(&raw)
            .map_err(|e| log::warn!("Failed to parse draft metadata: {e}"))
            .ok()
    }

    pub fn has_draft(&self) -> bool {
        matches!(self.store.get(&self.keys.draft), Ok(Some(_)))
    }

    pub fn last_saved(&self) -> Option<Timestamp> {
        self.load_metadata().map(|metadata| metadata.last_saved)
    }

    /// Removes both the draft and its metadata.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.keys.draft)?;
        self.store.remove(&self.keys.metadata)?;
        Ok(())
    }

    /// Assembles the stored form of a snapshot.
    pub fn build_draft(snapshot: &DraftSnapshot, timestamp: Timestamp) -> DraftData {
        DraftData {
            form_data: snapshot.form_data.clone(),
            metadata: DraftMetadata {
                application_id: snapshot.application_id.clone(),
                application_ref: snapshot.application_ref.clone(),
                current_step: snapshot.current_step.clone(),
                current_step_index: snapshot.current_step_index,
                completed_steps: snapshot.completed_steps.clone(),
                progress_percent: progress_percent(
                    &snapshot.completed_steps,
                    &snapshot.applicable_steps,
                ),
                last_saved: timestamp,
                version: DRAFT_VERSION,
            },
        }
    }

    fn parse(raw: &str) -> std::result::Result<DraftData, String> {
        let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;

        let has_part = |name: &str| value.get(name).is_some_and(|part| !part.is_null());
        if !has_part("formData") || !has_part("metadata") {
            return Err("Invalid draft data structure".to_string());
        }

        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}
