//! Status enumerations for saving and connectivity.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type-safe enumeration of draft save states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// Nothing saved in this session yet
    #[default]
    Idle,

    /// A save is in progress
    Saving,

    /// The last save succeeded
    Saved,

    /// The last save failed
    Error,
}

impl FromStr for SaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SaveStatus::Idle),
            "saving" => Ok(SaveStatus::Saving),
            "saved" => Ok(SaveStatus::Saved),
            "error" => Ok(SaveStatus::Error),
            _ => Err(format!("Invalid save status: {s}")),
        }
    }
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        }
    }
}

/// Network reachability as seen by the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl OnlineStatus {
    pub fn is_offline(&self) -> bool {
        matches!(self, OnlineStatus::Offline)
    }
}

/// What the save-status indicator shows.
///
/// Offline takes precedence over an idle or successful save, but a failing
/// save is always reported as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIndicator {
    Idle,
    Saving,
    Saved,
    Error,
    Offline,
}

impl SaveIndicator {
    /// Combines save and connectivity state into a single indicator.
    pub fn from_state(status: SaveStatus, online: OnlineStatus) -> Self {
        match (status, online) {
            (SaveStatus::Error, _) => SaveIndicator::Error,
            (SaveStatus::Saving, _) => SaveIndicator::Saving,
            (_, OnlineStatus::Offline) => SaveIndicator::Offline,
            (SaveStatus::Saved, _) => SaveIndicator::Saved,
            (SaveStatus::Idle, _) => SaveIndicator::Idle,
        }
    }

    /// Get the indicator with consistent icon formatting for display.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stepwise_core::models::SaveIndicator;
    ///
    /// assert_eq!(SaveIndicator::Saved.with_icon(), "✓ Saved");
    /// assert_eq!(SaveIndicator::Offline.with_icon(), "⚠ Offline");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            SaveIndicator::Idle => "○ Not saved yet",
            SaveIndicator::Saving => "➤ Saving...",
            SaveIndicator::Saved => "✓ Saved",
            SaveIndicator::Error => "✗ Save failed",
            SaveIndicator::Offline => "⚠ Offline",
        }
    }
}
