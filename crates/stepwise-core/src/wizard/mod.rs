//! Navigation state machine over the applicable steps.
//!
//! [`WizardState`] owns the form and the navigation position. Every change to
//! the form recomputes the applicable steps from the registry and clamps the
//! position, so `current_step_index` is always valid for
//! `applicable_steps` (or 0 when there are none).
//!
//! Moving forward validates the current step first; a step is only marked
//! completed once its validation passes. Moving back never touches the
//! completed set. Jumping ahead is allowed only over completed steps.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use stepwise_core::{registry::StepRegistry, wizard::WizardState};
//!
//! let mut wizard = WizardState::new(Arc::new(StepRegistry::dfsa()));
//! assert_eq!(wizard.current_step_id(), Some("step-1-1"));
//!
//! // Required fields are missing, so the wizard stays put
//! assert!(wizard.forward().is_err());
//! assert_eq!(wizard.errors().first().map(|(field, _)| field), Some("submitterName"));
//!
//! wizard.update_field("activitySelections.A5", json!(true)).unwrap();
//! assert!(wizard.applicable_steps().iter().any(|id| id == "step-2-10"));
//! ```

use std::sync::Arc;

use jiff::Timestamp;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    draft::progress_percent,
    error::Result,
    models::{DraftData, DraftSnapshot, FormData, StepDefinition},
    registry::StepRegistry,
    validation::{validate_step, FieldErrors, ValidationResult},
};


/// What a front end should do after a successful move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEffect {
    /// Step id to put in the navigation query parameter
    pub step_param: String,
    /// Whether the position changed and the page should scroll to the top
    pub scroll_to_top: bool,
}

/// Why a navigation request was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The current step did not validate; the first error is the focus target
    #[error("Step '{step_id}' has {} validation error(s)", errors.len())]
    Validation { step_id: String, errors: FieldErrors },
    /// A jump target lies beyond an incomplete step
    #[error("Step {index} is locked until '{first_incomplete}' is completed")]
    Locked {
        index: usize,
        first_incomplete: String,
    },
    #[error("Step index {index} is out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },
    /// The step id is unknown or does not apply to the current form
    #[error("Step '{0}' is not applicable")]
    NotApplicable(String),
    #[error("No applicable steps")]
    NoSteps,
}

/// Form data plus navigation position.
#[derive(Debug, Clone)]
pub struct WizardState {
    registry: Arc<StepRegistry>,
    form_data: FormData,
    current_step_index: usize,
    completed_steps: Vec<String>,
    applicable_steps: Vec<String>,
    errors: FieldErrors,
    application_id: Option<String>,
    application_ref: Option<String>,
    last_saved: Option<Timestamp>,
}

impl WizardState {
    /// Starts a fresh application with the default form values.
    pub fn new(registry: Arc<StepRegistry>) -> Self {
        Self::with_form_data(registry, FormData::initial())
    }

    /// Starts at the first step with the given form.
    pub fn with_form_data(registry: Arc<StepRegistry>, form_data: FormData) -> Self {
        let mut state = Self {
            registry,
            form_data,
            current_step_index: 0,
            completed_steps: Vec::new(),
            applicable_steps: Vec::new(),
            errors: FieldErrors::new(),
            application_id: None,
            application_ref: None,
            last_saved: None,
        };
        state.recompute();
        state
    }

    /// Rebuilds the state a draft was saved from.
    ///
    /// The saved form is layered over the defaults. The position follows the
    /// saved step id when it still applies, otherwise the saved index
    /// (clamped).
    pub fn restore(registry: Arc<StepRegistry>, draft: DraftData) -> Self {
        let DraftData { form_data, metadata } = draft;
        let mut state = Self::with_form_data(registry, FormData::with_defaults(form_data));

        state.completed_steps = Vec::new();
        for id in metadata.completed_steps {
            if !state.completed_steps.contains(&id) {
                state.completed_steps.push(id);
            }
        }
        state.current_step_index = state
            .position_of(&metadata.current_step)
            .unwrap_or(metadata.current_step_index);
        state.clamp_index();
        state.application_id = metadata.application_id;
        state.application_ref = metadata.application_ref;
        state.last_saved = Some(metadata.last_saved);
        state
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn form_data(&self) -> &FormData {
        &self.form_data
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    pub fn applicable_steps(&self) -> &[String] {
        &self.applicable_steps
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn application_id(&self) -> Option<&str> {
        self.application_id.as_deref()
    }

    pub fn application_ref(&self) -> Option<&str> {
        self.application_ref.as_deref()
    }

    pub fn last_saved(&self) -> Option<Timestamp> {
        self.last_saved
    }

    pub fn current_step_id(&self) -> Option<&str> {
        self.applicable_steps
            .get(self.current_step_index)
            .map(String::as_str)
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.current_step_id()
            .and_then(|id| self.registry.step_by_id(id))
    }

    pub fn is_completed(&self, step_id: &str) -> bool {
        self.completed_steps.iter().any(|id| id == step_id)
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step_index + 1 >= self.applicable_steps.len()
    }

    pub fn progress_percent(&self) -> u8 {
        progress_percent(&self.completed_steps, &self.applicable_steps)
    }

    pub fn set_application(&mut self, id: Option<String>, reference: Option<String>) {
        self.application_id = id;
        self.application_ref = reference;
    }

    pub fn set_last_saved(&mut self, timestamp: Timestamp) {
        self.last_saved = Some(timestamp);
    }

    /// Sets one field, clears its validation error and recomputes the
    /// applicable steps.
    pub fn update_field(&mut self, path: &str, value: Value) -> Result<()> {
        self.form_data.set(path, value)?;
        self.errors.remove(path);
        self.recompute();
        Ok(())
    }

    /// Merges top-level fields into the form and recomputes.
    pub fn merge_form_data(&mut self, partial: FormData) {
        let mut merged = self.form_data.as_map().clone();
        merged.extend(partial.as_map().clone());
        self.form_data = FormData::from(merged);
        self.recompute();
    }

    /// Replaces the whole form and recomputes.
    pub fn replace_form_data(&mut self, form_data: FormData) {
        self.form_data = form_data;
        self.recompute();
    }

    /// Validates the current step without moving.
    pub fn validate_current(&self) -> ValidationResult {
        match self.current_step_id() {
            Some(id) => validate_step(id, &self.form_data),
            None => ValidationResult::from(FieldErrors::new()),
        }
    }

    /// Validates the current step and advances on success.
    ///
    /// On the last step a successful call marks it completed without moving,
    /// so a finished application reports 100% progress. Submission itself is
    /// left to the caller.
    pub fn forward(&mut self) -> std::result::Result<NavigationEffect, NavigationError> {
        let step_id = self
            .current_step_id()
            .ok_or(NavigationError::NoSteps)?
            .to_string();

        let result = validate_step(&step_id, &self.form_data);
        if !result.is_valid {
            log::debug!("Step {step_id} failed validation: {:?}", result.errors.fields());
            self.errors = result.errors.clone();
            return Err(NavigationError::Validation {
                step_id,
                errors: result.errors,
            });
        }

        if !self.is_completed(&step_id) {
            self.completed_steps.push(step_id.clone());
        }
        self.errors.clear();

        if self.is_last_step() {
            return Ok(self.effect(false));
        }
        self.current_step_index += 1;
        Ok(self.effect(true))
    }

    /// Steps back one position. Returns `None` on the first step.
    pub fn back(&mut self) -> Option<NavigationEffect> {
        if self.current_step_index == 0 || self.applicable_steps.is_empty() {
            return None;
        }
        self.current_step_index -= 1;
        self.errors.clear();
        Some(self.effect(true))
    }

    /// Whether [`jump`](Self::jump) to `index` would be allowed.
    pub fn can_jump_to(&self, index: usize) -> bool {
        self.check_jump(index).is_ok()
    }

    /// Moves to `index` when it is behind the current position, or when
    /// every step before it is completed.
    pub fn jump(&mut self, index: usize) -> std::result::Result<NavigationEffect, NavigationError> {
        self.check_jump(index)?;
        let moved = index != self.current_step_index;
        self.current_step_index = index;
        if moved {
            self.errors.clear();
        }
        Ok(self.effect(moved))
    }

    /// Jumps to the applicable step with the given id.
    pub fn jump_to_step(
        &mut self,
        step_id: &str,
    ) -> std::result::Result<NavigationEffect, NavigationError> {
        let index = self
            .position_of(step_id)
            .ok_or_else(|| NavigationError::NotApplicable(step_id.to_string()))?;
        self.jump(index)
    }

    /// Everything a draft save needs.
    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            form_data: self.form_data.clone(),
            current_step: self.current_step_id().unwrap_or_default().to_string(),
            current_step_index: self.current_step_index,
            completed_steps: self.completed_steps.clone(),
            applicable_steps: self.applicable_steps.clone(),
            application_id: self.application_id.clone(),
            application_ref: self.application_ref.clone(),
        }
    }

    fn check_jump(&self, index: usize) -> std::result::Result<(), NavigationError> {
        let len = self.applicable_steps.len();
        if index >= len {
            return Err(NavigationError::OutOfRange { index, len });
        }
        if index <= self.current_step_index {
            return Ok(());
        }
        match self.applicable_steps[..index]
            .iter()
            .find(|id| !self.is_completed(id))
        {
            Some(first_incomplete) => Err(NavigationError::Locked {
                index,
                first_incomplete: first_incomplete.clone(),
            }),
            None => Ok(()),
        }
    }

    fn position_of(&self, step_id: &str) -> Option<usize> {
        self.applicable_steps.iter().position(|id| id == step_id)
    }

    fn effect(&self, scroll_to_top: bool) -> NavigationEffect {
        NavigationEffect {
            step_param: self.current_step_id().unwrap_or_default().to_string(),
            scroll_to_top,
        }
    }

    /// Recomputes the applicable steps, staying on the current step when it
    /// still applies.
    fn recompute(&mut self) {
        let current = self.current_step_id().map(str::to_string);
        self.applicable_steps = self.registry.applicable_steps(&self.form_data);
        if let Some(index) = current.and_then(|id| self.position_of(&id)) {
            self.current_step_index = index;
        }
        self.clamp_index();
    }

    fn clamp_index(&mut self) {
        let last = self.applicable_steps.len().saturating_sub(1);
        self.current_step_index = self.current_step_index.min(last);
    }
}
