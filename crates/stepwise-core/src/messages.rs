//! User-facing error taxonomy and messages.
//!
//! Every failure the wizard can surface is classified by an [`ErrorCode`].
//! Each code carries a default user message, a suggested action and a
//! recoverability flag; [`FormError`] bundles those for a front end.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::WizardError, validation::FieldErrors};

/// Category of a user-facing error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    #[serde(rename = "SAVE_ERROR")]
    Save,
    #[serde(rename = "LOAD_ERROR")]
    Load,
    #[serde(rename = "STORAGE_ERROR")]
    Storage,
    #[serde(rename = "SUBMISSION_ERROR")]
    Submission,
    #[serde(rename = "SESSION_ERROR")]
    Session,
    #[serde(rename = "PERMISSION_ERROR")]
    Permission,
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorCode {
    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::Network => "NETWORK_ERROR",
            ErrorCode::Save => "SAVE_ERROR",
            ErrorCode::Load => "LOAD_ERROR",
            ErrorCode::Storage => "STORAGE_ERROR",
            ErrorCode::Submission => "SUBMISSION_ERROR",
            ErrorCode::Session => "SESSION_ERROR",
            ErrorCode::Permission => "PERMISSION_ERROR",
            ErrorCode::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Default message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "Please check the highlighted fields and correct any errors.",
            ErrorCode::Network => {
                "Unable to connect to the server. Please check your internet connection."
            }
            ErrorCode::Save => {
                "Unable to save your progress. Your data has been backed up locally."
            }
            ErrorCode::Load => "Unable to load your application data.",
            ErrorCode::Storage => "Unable to store data locally.",
            ErrorCode::Submission => "Unable to submit your application.",
            ErrorCode::Session => "Your session has expired.",
            ErrorCode::Permission => "You do not have permission to perform this action.",
            ErrorCode::Unknown => "An unexpected error occurred.",
        }
    }

    /// What the user can do about it.
    pub fn suggested_action(&self) -> &'static str {
        match self {
            ErrorCode::Validation => {
                "Review the form fields marked in red and provide valid information."
            }
            ErrorCode::Network => {
                "Check your internet connection and try again. Your data has been saved locally."
            }
            ErrorCode::Save => "Try saving again in a few moments. Your work is safe.",
            ErrorCode::Load => {
                "Try reloading the application. If the problem persists, contact support."
            }
            ErrorCode::Storage => {
                "Local storage may be full. Free some space and try saving again."
            }
            ErrorCode::Submission => {
                "Please ensure all required fields are completed and try again."
            }
            ErrorCode::Session => "Please log in again to continue. Your draft has been saved.",
            ErrorCode::Permission => {
                "Please contact your administrator if you believe this is an error."
            }
            ErrorCode::Unknown => "Please try again. If the problem persists, contact support.",
        }
    }

    /// Session and permission errors need re-authentication upstream.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ErrorCode::Session | ErrorCode::Permission)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How loudly an error should be shown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    #[default]
    Error,
    Warning,
    Info,
}

/// Structured error ready for presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormError {
    pub code: ErrorCode,
    pub message: String,
    pub severity: ErrorSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub recoverable: bool,
    pub suggested_action: String,
}

impl FormError {
    /// Creates an error carrying the code's default message.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.user_message().to_string(),
            severity: ErrorSeverity::Error,
            field: None,
            recoverable: code.is_recoverable(),
            suggested_action: code.suggested_action().to_string(),
        }
    }

    /// Replaces the default message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches the error to a form field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

impl From<&WizardError> for FormError {
    fn from(err: &WizardError) -> Self {
        let code = err.code();
        let form_error = FormError::new(code);
        match err {
            WizardError::InvalidInput { field, reason } => {
                form_error.with_field(field).with_message(reason)
            }
            _ => form_error,
        }
    }
}

/// Converts a validation error map into presentation errors, keeping order.
pub fn format_validation_errors(errors: &FieldErrors) -> Vec<FormError> {
    errors
        .iter()
        .map(|(field, message)| {
            FormError::new(ErrorCode::Validation)
                .with_field(field)
                .with_message(message)
        })
        .collect()
}
