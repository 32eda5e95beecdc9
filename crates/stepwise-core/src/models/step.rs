//! Step definition model.

use serde::{Deserialize, Serialize};

use super::FormData;
use crate::rules::Condition;

/// When a step takes part in the wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "mode", content = "trigger")]
pub enum Visibility {
    /// Step is always applicable
    Always,

    /// Step is applicable while its trigger condition holds
    Conditional(Condition),
}

/// One page of the wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDefinition {
    /// Stable identifier, also used as the navigation query parameter
    pub id: String,

    /// Top-level grouping (1..=4) used for progress display
    pub stage: u8,

    /// Human readable step name
    pub name: String,

    /// Name of the front-end component rendering the step
    pub component: String,

    /// Visibility mode and trigger
    pub visibility: Visibility,
}

impl StepDefinition {
    /// Creates an always-visible step.
    pub fn always(id: &str, stage: u8, name: &str, component: &str) -> Self {
        Self {
            id: id.to_string(),
            stage,
            name: name.to_string(),
            component: component.to_string(),
            visibility: Visibility::Always,
        }
    }

    /// Creates a step gated on `trigger`.
    pub fn conditional(
        id: &str,
        stage: u8,
        name: &str,
        component: &str,
        trigger: Condition,
    ) -> Self {
        Self {
            id: id.to_string(),
            stage,
            name: name.to_string(),
            component: component.to_string(),
            visibility: Visibility::Conditional(trigger),
        }
    }

    /// Returns the trigger condition for conditional steps.
    pub fn trigger(&self) -> Option<&Condition> {
        match &self.visibility {
            Visibility::Always => None,
            Visibility::Conditional(condition) => Some(condition),
        }
    }

    /// Whether the step applies to the given form.
    pub fn is_visible(&self, form: &FormData) -> bool {
        match &self.visibility {
            Visibility::Always => true,
            Visibility::Conditional(condition) => condition.evaluate(form),
        }
    }
}
