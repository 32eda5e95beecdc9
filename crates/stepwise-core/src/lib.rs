//! Core library for the Stepwise application wizard.
//!
//! This crate decides which steps of a multi-step application form apply to
//! the data entered so far, moves the user between them under validation and
//! ordering rules, and persists drafts locally with an optional remote copy.
//!
//! # Architecture
//!
//! - **Rules** ([`rules`]): condition trees and rule tables over form data
//! - **Registry** ([`registry`]): ordered step definitions and their visibility
//! - **Wizard** ([`wizard`]): navigation state over the applicable steps
//! - **Persistence** ([`draft`], [`autosave`], [`offline`], [`storage`]):
//!   draft blobs, the auto-save timer and the pending-operation queue
//! - **Display** ([`display`]): markdown views rendered by the CLI
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use stepwise_core::SessionBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = SessionBuilder::new()
//!     .with_store_path(Some("drafts.db"))
//!     .build()
//!     .await?;
//! session.resume().await;
//!
//! session.update_field("firmName", json!("Acme Capital")).await?;
//! let wizard = session.wizard();
//! let moved = wizard.lock().await.forward();
//! println!("{moved:?}");
//!
//! session.save().await;
//! # Ok(())
//! # }
//! ```

#![recursion_limit = "256"]

pub mod autosave;
pub mod backend;
pub mod display;
pub mod draft;
pub mod error;
pub mod messages;
pub mod models;
pub mod offline;
pub mod poller;
pub mod registry;
pub mod rules;
pub mod session;
pub mod storage;
pub mod support;
pub mod validation;
pub mod wizard;

// Re-export commonly used types
pub use autosave::{AutoSaveManager, SaveState};
pub use backend::{Backend, ChangeEvent, ChangeFilter, ChangeKind, MemoryBackend, Record};
pub use display::{
    ErrorSummary, LocalDateTime, NavigationOutcome, OperationStatus, PendingOperations,
    SaveOutcome, StepList, TicketResult,
};
pub use draft::{format_last_saved, progress_percent, DraftStore};
pub use error::{Result, WizardError};
pub use messages::{ErrorCode, ErrorSeverity, FormError};
pub use models::{
    DraftData, DraftMetadata, FormData, OnlineStatus, SaveIndicator, SaveStatus, StepDefinition,
    Visibility,
};
pub use offline::{OfflineQueue, OperationType, PendingOperation, ProcessSummary};
pub use poller::{Poller, Refresh};
pub use registry::StepRegistry;
pub use rules::Condition;
pub use session::{Session, SessionBuilder};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use support::{SupportClient, SupportRequest, SupportResponse};
pub use validation::{validate_step, FieldErrors, ValidationResult};
pub use wizard::{NavigationEffect, NavigationError, WizardState};
