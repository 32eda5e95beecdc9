//! Data models for form data, steps and drafts.
//!
//! This module contains the core domain models of the wizard engine. Display
//! implementations for these models live in [`crate::display`] to keep data
//! structures and presentation apart.
//!
//! - [`FormData`]: the single record holding every field of every step
//! - [`StepDefinition`]: one wizard page and its visibility rule
//! - [`DraftData`] / [`DraftMetadata`]: what gets persisted
//! - [`SaveStatus`] / [`OnlineStatus`]: state reported to the front end
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use stepwise_core::models::FormData;
//!
//! let mut form = FormData::new();
//! form.set("headOfficeAddress.city", json!("Dubai")).unwrap();
//! assert_eq!(form.get_str("headOfficeAddress.city"), Some("Dubai"));
//! assert!(form.get("headOfficeAddress.country").is_none());
//! ```

pub mod draft;
pub mod form;
pub mod status;
pub mod step;


pub use draft::{DraftData, DraftMetadata, DraftSnapshot, LoadResult, SaveResult, DRAFT_VERSION};
pub use form::FormData;
pub use status::{OnlineStatus, SaveIndicator, SaveStatus};
pub use step::{StepDefinition, Visibility};
