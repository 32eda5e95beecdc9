//! Views over groups of steps, errors and queued operations.

use std::fmt;

use crate::{
    messages::format_validation_errors, offline::PendingOperation, validation::FieldErrors,
    wizard::WizardState,
};

/// Applicable steps grouped by stage, numbered by wizard position.
///
/// Icons: `✓` completed, `➤` current, `○` reachable, `🔒` locked behind an
/// incomplete step.
///
/// ```rust
/// use std::sync::Arc;
/// use stepwise_core::{display::StepList, registry::StepRegistry, wizard::WizardState};
///
/// let wizard = WizardState::new(Arc::new(StepRegistry::dfsa()));
/// let output = StepList(&wizard).to_string();
/// assert!(output.contains("## 1. General Requirements"));
/// assert!(output.contains("- ➤ 1. Introduction & Disclosure (`step-1-1`)"));
/// ```
pub struct StepList<'a>(pub &'a WizardState);

impl StepList<'_> {
    fn icon(&self, index: usize, step_id: &str) -> &'static str {
        let wizard = self.0;
        if index == wizard.current_step_index() {
            "➤"
        } else if wizard.is_completed(step_id) {
            "✓"
        } else if wizard.can_jump_to(index) {
            "○"
        } else {
            "🔒"
        }
    }
}

impl fmt::Display for StepList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wizard = self.0;
        let registry = wizard.registry();
        if wizard.applicable_steps().is_empty() {
            return writeln!(f, "No applicable steps.");
        }

        let mut current_stage = None;
        for (index, step_id) in wizard.applicable_steps().iter().enumerate() {
            let Some(step) = registry.step_by_id(step_id) else {
                continue;
            };

            if current_stage != Some(step.stage) {
                if current_stage.is_some() {
                    writeln!(f)?;
                }
                match registry.stage_name(step.stage) {
                    Some(name) => writeln!(f, "## {}. {name}", step.stage)?,
                    None => writeln!(f, "## Stage {}", step.stage)?,
                }
                writeln!(f)?;
                current_stage = Some(step.stage);
            }

            writeln!(f, "- {} {}. {step}", self.icon(index, step_id), index + 1)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{} of {} steps completed ({}%)",
            wizard
                .completed_steps()
                .iter()
                .filter(|id| wizard.applicable_steps().contains(id))
                .count(),
            wizard.applicable_steps().len(),
            wizard.progress_percent()
        )
    }
}

/// Aggregated validation errors; the first field is the focus target.
pub struct ErrorSummary<'a>(pub &'a FieldErrors);

impl fmt::Display for ErrorSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = format_validation_errors(self.0);
        if errors.is_empty() {
            return writeln!(f, "No validation errors.");
        }

        let noun = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(f, "Please fix {} {noun}:", errors.len())?;
        writeln!(f)?;
        for error in &errors {
            writeln!(f, "- {error}")?;
        }
        if let Some((field, _)) = self.0.first() {
            writeln!(f)?;
            writeln!(f, "Focus: `{field}`")?;
        }
        Ok(())
    }
}

/// Operations waiting for connectivity.
pub struct PendingOperations(pub Vec<PendingOperation>);

impl PendingOperations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for PendingOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No pending operations.");
        }
        for operation in &self.0 {
            writeln!(
                f,
                "- `{}` {} (attempts {}/{})",
                operation.id,
                operation.kind.as_str(),
                operation.retry_count,
                operation.max_retries
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        models::{FormData, StepDefinition},
        offline::OperationType,
        registry::StepRegistry,
    };

    fn wizard() -> WizardState {
        let steps = vec![
            StepDefinition::always("a", 1, "Alpha", "A"),
            StepDefinition::always("b", 1, "Beta", "B"),
            StepDefinition::always("c", 2, "Gamma", "C"),
        ];
        let registry = StepRegistry::new(steps, vec![(1, "Basics".to_string())]).unwrap();
        WizardState::with_form_data(Arc::new(registry), FormData::new())
    }

    #[test]
    fn test_step_list_groups_by_stage() {
        let mut wizard = wizard();
        wizard.forward().unwrap();

        let output = StepList(&wizard).to_string();
        assert_eq!(
            output,
            "## 1. Basics\n\n\
             - ✓ 1. Alpha (`a`)\n\
             - ➤ 2. Beta (`b`)\n\n\
             ## Stage 2\n\n\
             - 🔒 3. Gamma (`c`)\n\n\
             1 of 3 steps completed (33%)\n"
        );
    }

    #[test]
    fn test_error_summary() {
        let mut errors = FieldErrors::new();
        errors.insert("firmName", "Firm name is required");
        errors.insert("email", "Please enter a valid email address");

        let output = ErrorSummary(&errors).to_string();
        assert!(output.starts_with("Please fix 2 errors:"));
        assert!(output.contains("- **firmName**: Firm name is required"));
        assert!(output.ends_with("Focus: `firmName`\n"));

        assert_eq!(
            ErrorSummary(&FieldErrors::new()).to_string(),
            "No validation errors.\n"
        );
    }

    #[test]
    fn test_pending_operations() {
        let operations = PendingOperations(vec![PendingOperation {
            id: "op-1".to_string(),
            kind: OperationType::Save,
            timestamp: 0,
            data: json!({}),
            retry_count: 1,
            max_retries: 3,
        }]);
        assert_eq!(operations.to_string(), "- `op-1` save (attempts 1/3)\n");
        assert_eq!(
            PendingOperations(Vec::new()).to_string(),
            "No pending operations.\n"
        );
    }
}
