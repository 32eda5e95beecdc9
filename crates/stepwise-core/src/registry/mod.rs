//! Static registry of wizard steps.
//!
//! A [`StepRegistry`] is an ordered, immutable list of [`StepDefinition`]s
//! plus the display names of their stages. The order of the registry is the
//! order of the wizard: applicable steps are always reported as a
//! subsequence of it.
//!
//! The canonical DFSA application lives in [`dfsa`] and is available through
//! [`StepRegistry::dfsa`].
//!
//! ```rust
//! use stepwise_core::{models::FormData, registry::StepRegistry};
//!
//! let registry = StepRegistry::dfsa();
//! assert_eq!(registry.len(), 26);
//! assert_eq!(registry.stage_name(1), Some("General Requirements"));
//!
//! let applicable = registry.applicable_steps(&FormData::initial());
//! assert_eq!(applicable.first().map(String::as_str), Some("step-1-1"));
//! ```

use std::collections::HashSet;

use crate::{
    error::{Result, WizardError},
    models::{FormData, StepDefinition},
};

pub mod dfsa;

/// Ordered set of step definitions and stage names.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
    stage_names: Vec<(u8, String)>,
}

impl StepRegistry {
    /// Builds a registry, rejecting duplicate step ids.
    pub fn new(steps: Vec<StepDefinition>, stage_names: Vec<(u8, String)>) -> Result<Self> {
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(WizardError::invalid_input("steps")
                    .with_reason(format!("Duplicate step id '{}'", step.id)));
            }
        }
        Ok(Self { steps, stage_names })
    }

    /// The canonical DFSA financial-services application.
    pub fn dfsa() -> Self {
        Self {
            steps: dfsa::steps(),
            stage_names: dfsa::stage_names(),
        }
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_by_id(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Like [`step_by_id`](Self::step_by_id) but reports a missing step as an error.
    pub fn require(&self, id: &str) -> Result<&StepDefinition> {
        self.step_by_id(id).ok_or_else(|| WizardError::StepNotFound { id: id.to_string() })
    }

    pub fn steps_by_stage(&self, stage: u8) -> Vec<&StepDefinition> {
        self.steps.iter().filter(|step| step.stage == stage).collect()
    }

    pub fn stage_name(&self, stage: u8) -> Option<&str> {
        self.stage_names
            .iter()
            .find(|(number, _)| *number == stage)
            .map(|(_, name)| name.as_str())
    }

    /// Stage numbers in registry order, without duplicates.
    pub fn stages(&self) -> Vec<u8> {
        let mut stages: Vec<u8> = Vec::new();
        for step in &self.steps {
            if !stages.contains(&step.stage) {
                stages.push(step.stage);
            }
        }
        stages
    }

    /// Ids of the steps that apply to `form`, in registry order.
    ///
    /// Always-visible steps are included unconditionally; conditional steps
    /// when their trigger holds.
    pub fn applicable_steps(&self, form: &FormData) -> Vec<String> {
        self.steps
            .iter()
            .filter(|step| step.is_visible(form))
            .map(|step| step.id.clone())
            .collect()
    }
}
