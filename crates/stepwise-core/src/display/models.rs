//! Display implementations for domain models.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::{
    messages::FormError,
    models::{DraftMetadata, OnlineStatus, SaveIndicator, SaveStatus, StepDefinition},
};

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for OnlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OnlineStatus::Online => "online",
            OnlineStatus::Offline => "offline",
            OnlineStatus::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

impl fmt::Display for SaveIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.with_icon())
    }
}

impl fmt::Display for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (`{}`)", self.name, self.id)
    }
}

impl fmt::Display for DraftMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Saved draft")?;
        writeln!(f)?;

        if let Some(reference) = &self.application_ref {
            writeln!(f, "- **Reference**: {reference}")?;
        }
        if let Some(id) = &self.application_id {
            writeln!(f, "- **Application ID**: {id}")?;
        }
        writeln!(
            f,
            "- **Current step**: `{}` (position {})",
            self.current_step,
            self.current_step_index + 1
        )?;
        writeln!(f, "- **Completed steps**: {}", self.completed_steps.len())?;
        writeln!(f, "- **Progress**: {}%", self.progress_percent)?;
        writeln!(f, "- **Last saved**: {}", LocalDateTime::new(&self.last_saved))?;

        Ok(())
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "**{field}**: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::messages::ErrorCode;

    #[test]
    fn test_draft_metadata_display() {
        let metadata = DraftMetadata {
            application_id: None,
            application_ref: Some("DFSA-7".to_string()),
            current_step: "step-1-3".to_string(),
            current_step_index: 2,
            completed_steps: vec!["step-1-1".to_string(), "step-1-2".to_string()],
            progress_percent: 15,
            last_saved: Timestamp::from_second(1640995200).unwrap(),
            version: 1,
        };

        let output = metadata.to_string();
        assert!(output.starts_with("# Saved draft\n"));
        assert!(output.contains("- **Reference**: DFSA-7"));
        assert!(!output.contains("Application ID"));
        assert!(output.contains("`step-1-3` (position 3)"));
        assert!(output.contains("- **Progress**: 15%"));
    }

    #[test]
    fn test_form_error_display() {
        let error = FormError::new(ErrorCode::Validation)
            .with_field("firmName")
            .with_message("Firm name is required");
        assert_eq!(error.to_string(), "**firmName**: Firm name is required");
        assert_eq!(
            FormError::new(ErrorCode::Network).to_string(),
            ErrorCode::Network.user_message()
        );
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(SaveStatus::Saving.to_string(), "saving");
        assert_eq!(OnlineStatus::Offline.to_string(), "offline");
        assert_eq!(SaveIndicator::Error.to_string(), "✗ Save failed");
    }
}
