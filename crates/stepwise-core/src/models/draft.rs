//! Draft snapshot types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::FormData;

/// Current layout version of the stored draft.
pub const DRAFT_VERSION: u32 = 1;

/// Denormalized summary of a draft, stored separately for quick reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftMetadata {
    pub application_id: Option<String>,
    pub application_ref: Option<String>,
    /// Id of the step the user was on
    pub current_step: String,
    pub current_step_index: usize,
    pub completed_steps: Vec<String>,
    pub progress_percent: u8,
    pub last_saved: Timestamp,
    pub version: u32,
}

/// Complete draft blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftData {
    pub form_data: FormData,
    pub metadata: DraftMetadata,
}

/// Everything a save needs, captured from the wizard at save time.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSnapshot {
    pub form_data: FormData,
    pub current_step: String,
    pub current_step_index: usize,
    pub completed_steps: Vec<String>,
    pub applicable_steps: Vec<String>,
    pub application_id: Option<String>,
    pub application_ref: Option<String>,
}

/// Outcome of a draft save. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveResult {
    pub success: bool,
    pub timestamp: Timestamp,
    pub error: Option<String>,
}

impl SaveResult {
    pub fn saved(timestamp: Timestamp) -> Self {
        Self {
            success: true,
            timestamp,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            timestamp: Timestamp::now(),
            error: Some(error.into()),
        }
    }
}

/// Outcome of a draft load.
///
/// A missing draft is a success with no data; an unreadable one is a
/// failure carrying the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub success: bool,
    pub data: Option<DraftData>,
    pub error: Option<String>,
}

impl LoadResult {
    pub fn found(data: DraftData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
