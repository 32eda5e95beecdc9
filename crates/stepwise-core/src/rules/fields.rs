//! Field visibility within the general-requirements steps.

use super::Condition;
use crate::models::FormData;

const MATRIX: &str = "financialServicesMatrix";

/// Conditional fields of `step_id` with the condition that shows each one.
///
/// Steps without conditional fields return an empty list.
pub fn field_rules(step_id: &str) -> Vec<(&'static str, Condition)> {
    match step_id {
        "step-1-1" => {
            let external = || Condition::is_false("contactPersonInternal");
            vec![
                ("externalAdviserName", external()),
                ("externalAdviserEmail", external()),
                ("externalAdviserCompany", external()),
                ("contactDFSASection", Condition::is_false("instructionsConfirmed")),
            ]
        }
        "step-1-2" => {
            let not_rep_office = || Condition::is_false("isRepresentativeOffice");
            vec![
                ("legalStatus", not_rep_office()),
                ("generalStructure", not_rep_office()),
                ("registrationDetails", not_rep_office()),
                ("registrationNumber", not_rep_office()),
                ("registrationDate", not_rep_office()),
                ("financialYearEnd", not_rep_office()),
                ("listingExchange", Condition::is_true("publiclyListed")),
            ]
        }
        "step-1-3" => vec![
            ("ultimateHoldingCompany", Condition::is_true("isPartOfGroup")),
            ("groupStructureSection", Condition::is_true("isPartOfGroup")),
            ("listingExchange", Condition::is_true("publiclyListed")),
        ],
        "step-1-4" => vec![
            ("controllersSection", Condition::is_true("hasControllers")),
            ("controllersList", Condition::is_true("hasControllers")),
            ("groupStructureDescription", Condition::is_true("isPartOfGroup")),
            ("groupStructureChart", Condition::is_true("isPartOfGroup")),
        ],
        "step-1-5" => {
            let financial_services = || Condition::is_true("activitySelections.A1");
            let insurance_matrix = || Condition::any_non_empty(MATRIX, &["A8", "A9"]);
            vec![
                ("financialServicesMatrix", financial_services()),
                ("matrixSection", financial_services()),
                ("endorsementsSection", Condition::is_false("isRepresentativeOffice")),
                ("E2_A1", financial_services()),
                ("E2_A4", insurance_matrix()),
                ("E2_A5", insurance_matrix()),
                ("E2_A6", Condition::any_non_empty(MATRIX, &["A10"])),
            ]
        }
        _ => Vec::new(),
    }
}

/// Visibility of every conditional field on `step_id`, in declaration order.
pub fn field_visibility(step_id: &str, form: &FormData) -> Vec<(&'static str, bool)> {
    field_rules(step_id)
        .into_iter()
        .map(|(field, condition)| (field, condition.evaluate(form)))
        .collect()
}

/// Whether a field is shown. Fields without a rule are always shown.
pub fn is_field_visible(step_id: &str, field_id: &str, form: &FormData) -> bool {
    field_rules(step_id)
        .into_iter()
        .find(|(field, _)| *field == field_id)
        .map_or(true, |(_, condition)| condition.evaluate(form))
}
