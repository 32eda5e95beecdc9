//! Display formatting for wizard state and operation outcomes.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! views that need more than one model, or extra context, are newtype
//! wrappers. Everything renders as markdown so the CLI can hand it to the
//! terminal renderer unchanged.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │    Wrappers     │    │    Markdown     │
//! │ (Draft, Status) │───▶│ (StepList, ...) │───▶│     Output      │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! - [`collections`]: step list by stage, validation error summary, queue
//! - [`results`]: navigation, save and ticket outcomes
//! - [`status`]: one-line confirmations ([`OperationStatus`])
//! - [`datetime`]: timestamps in the system time zone
//! - [`models`]: Display implementations for domain models
//!
//! # Examples
//!
//! ```rust
//! use stepwise_core::display::OperationStatus;
//!
//! let status = OperationStatus::success("Draft cleared");
//! assert_eq!(status.to_string(), "Success: Draft cleared\n");
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{ErrorSummary, PendingOperations, StepList};
pub use datetime::LocalDateTime;
pub use results::{NavigationOutcome, SaveOutcome, TicketResult};
pub use status::OperationStatus;
