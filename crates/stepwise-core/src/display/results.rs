//! Outcomes of navigation, saving and support submissions.

use std::fmt;

use super::{collections::ErrorSummary, datetime::LocalDateTime};
use crate::{
    offline::OfflineSaveResult,
    support::SupportResponse,
    wizard::{NavigationEffect, NavigationError, WizardState},
};

/// Where a navigation request left the wizard.
pub struct NavigationOutcome<'a> {
    wizard: &'a WizardState,
    result: &'a Result<NavigationEffect, NavigationError>,
}

impl<'a> NavigationOutcome<'a> {
    pub fn new(
        wizard: &'a WizardState,
        result: &'a Result<NavigationEffect, NavigationError>,
    ) -> Self {
        Self { wizard, result }
    }

    fn fmt_position(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wizard.current_step() {
            Some(step) => write!(
                f,
                "step {} of {}: {step}",
                self.wizard.current_step_index() + 1,
                self.wizard.applicable_steps().len()
            ),
            None => write!(f, "no step"),
        }
    }
}

impl fmt::Display for NavigationOutcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            Ok(effect) if effect.scroll_to_top => {
                write!(f, "Moved to ")?;
                self.fmt_position(f)?;
                writeln!(f)
            }
            Ok(effect) if self.wizard.is_last_step() && self.wizard.is_completed(&effect.step_param) => {
                write!(f, "Completed final ")?;
                self.fmt_position(f)?;
                writeln!(f)
            }
            Ok(_) => {
                write!(f, "Stayed on ")?;
                self.fmt_position(f)?;
                writeln!(f)
            }
            Err(NavigationError::Validation { step_id, errors }) => {
                writeln!(f, "Cannot continue from `{step_id}`.")?;
                writeln!(f)?;
                write!(f, "{}", ErrorSummary(errors))
            }
            Err(err) => writeln!(f, "Cannot navigate: {err}"),
        }
    }
}

/// Result of a save, including whether the server copy is up to date.
pub struct SaveOutcome<'a>(pub &'a OfflineSaveResult);

impl fmt::Display for SaveOutcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        if !result.success {
            return writeln!(
                f,
                "Error: {}",
                result.error.as_deref().unwrap_or("Save failed")
            );
        }

        match &result.timestamp {
            Some(ts) => writeln!(f, "Success: Draft saved at {}", LocalDateTime::new(ts))?,
            None => writeln!(f, "Success: Draft saved")?,
        }
        if let Some(warning) = &result.error {
            writeln!(f)?;
            writeln!(f, "Warning: {warning}")?;
        }
        Ok(())
    }
}

/// Ticket number or failure reason for a support request.
pub struct TicketResult<'a>(pub &'a SupportResponse);

impl fmt::Display for TicketResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.0;
        if !response.success {
            return writeln!(f, "Error: {}", response.message);
        }

        writeln!(f, "# Support request submitted")?;
        writeln!(f)?;
        if let Some(ticket) = &response.ticket_id {
            writeln!(f, "- **Ticket**: {ticket}")?;
        }
        writeln!(f, "- **Message**: {}", response.message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jiff::Timestamp;

    use super::*;
    use crate::{
        models::{FormData, StepDefinition},
        registry::StepRegistry,
    };

    fn wizard() -> WizardState {
        let steps = vec![
            StepDefinition::always("a", 1, "Alpha", "A"),
            StepDefinition::always("b", 1, "Beta", "B"),
        ];
        let registry = StepRegistry::new(steps, Vec::new()).unwrap();
        WizardState::with_form_data(Arc::new(registry), FormData::new())
    }

    #[test]
    fn test_navigation_outcomes() {
        let mut wizard = wizard();

        let result = wizard.forward();
        assert_eq!(
            NavigationOutcome::new(&wizard, &result).to_string(),
            "Moved to step 2 of 2: Beta (`b`)\n"
        );

        let result = wizard.forward();
        assert_eq!(
            NavigationOutcome::new(&wizard, &result).to_string(),
            "Completed final step 2 of 2: Beta (`b`)\n"
        );

        let result = wizard.jump(5);
        assert!(NavigationOutcome::new(&wizard, &result)
            .to_string()
            .starts_with("Cannot navigate: Step index 5 is out of range"));
    }

    #[test]
    fn test_save_outcomes() {
        let ok = OfflineSaveResult {
            success: true,
            saved_locally: true,
            timestamp: Some(Timestamp::from_second(1640995200).unwrap()),
            error: Some("Server save failed, saved locally".to_string()),
        };
        let output = SaveOutcome(&ok).to_string();
        assert!(output.starts_with("Success: Draft saved at "));
        assert!(output.contains("Warning: Server save failed, saved locally"));

        let failed = OfflineSaveResult {
            success: false,
            saved_locally: false,
            timestamp: None,
            error: Some("Failed to save locally".to_string()),
        };
        assert_eq!(SaveOutcome(&failed).to_string(), "Error: Failed to save locally\n");
    }

    #[test]
    fn test_ticket_result() {
        let response = SupportResponse {
            success: true,
            ticket_id: Some("TKT-1".to_string()),
            message: "Created".to_string(),
        };
        let output = TicketResult(&response).to_string();
        assert!(output.contains("- **Ticket**: TKT-1"));

        let failed = SupportResponse {
            success: false,
            ticket_id: None,
            message: "Failed to submit support request: Boom".to_string(),
        };
        assert_eq!(
            TicketResult(&failed).to_string(),
            "Error: Failed to submit support request: Boom\n"
        );
    }
}
