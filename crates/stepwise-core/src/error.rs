//! Error types for the wizard engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::messages::ErrorCode;

/// Comprehensive error type for all wizard operations.
#[derive(Error, Debug)]
pub enum WizardError {
    /// SQLite connection or query errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// A key/value write was refused by the store (quota, read-only, ...)
    #[error("Storage write refused for key '{key}': {reason}")]
    StorageWrite { key: String, reason: String },
    /// Step not found for the given ID
    #[error("Step '{id}' not found")]
    StepNotFound { id: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Remote endpoint or transport errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        status: Option<u16>,
    },
    /// Session expired or missing
    #[error("Session error: {message}")]
    Session { message: String },
    /// Caller lacks permission for the operation
    #[error("Permission denied: {message}")]
    Permission { message: String },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating storage errors with optional context.
pub struct StorageErrorBuilder {
    message: String,
}

impl StorageErrorBuilder {
    /// Create a new storage error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> WizardError {
        WizardError::Storage {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> WizardError {
        WizardError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl WizardError {
    /// Creates a builder for storage errors.
    pub fn storage(message: impl Into<String>) -> StorageErrorBuilder {
        StorageErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a network error without an HTTP status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a configuration error for a failed blocking task.
    pub fn join(source: tokio::task::JoinError) -> Self {
        Self::Configuration {
            message: format!("Task join error: {source}"),
        }
    }

    /// Maps the error onto the user-facing error taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Storage { .. } | Self::StorageWrite { .. } | Self::FileSystem { .. } => {
                ErrorCode::Storage
            }
            Self::InvalidInput { .. } => ErrorCode::Validation,
            Self::Network { .. } => ErrorCode::Network,
            Self::Session { .. } => ErrorCode::Session,
            Self::Permission { .. } => ErrorCode::Permission,
            Self::Serialization { .. } => ErrorCode::Load,
            Self::StepNotFound { .. } | Self::XdgDirectory(_) | Self::Configuration { .. } => {
                ErrorCode::Unknown
            }
        }
    }
}

/// Specialized extension trait for SQLite-related Results.
pub trait StorageResultExt<T> {
    /// Map SQLite errors with a message.
    fn storage_context(self, message: &str) -> Result<T>;
}

impl<T> StorageResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn storage_context(self, message: &str) -> Result<T> {
        self.map_err(|e| WizardError::storage(message).with_source(e))
    }
}

/// Result type alias for wizard operations
pub type Result<T> = std::result::Result<T, WizardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_builder() {
        let err = WizardError::invalid_input("email").with_reason("missing @");
        assert_eq!(err.to_string(), "Invalid input for field 'email': missing @");
        assert_eq!(err.code(), ErrorCode::Validation);
    }

    #[test]
    fn test_storage_context_maps_sqlite_errors() {
        let result: std::result::Result<(), rusqlite::Error> =
            Err(rusqlite::Error::InvalidQuery);
        let err = result.storage_context("Failed to write").unwrap_err();
        assert!(matches!(err, WizardError::Storage { .. }));
        assert_eq!(err.code(), ErrorCode::Storage);
    }

    #[test]
    fn test_session_and_permission_codes() {
        let session = WizardError::Session {
            message: "expired".to_string(),
        };
        let permission = WizardError::Permission {
            message: "nope".to_string(),
        };
        assert!(!session.code().is_recoverable());
        assert!(!permission.code().is_recoverable());
    }
}
