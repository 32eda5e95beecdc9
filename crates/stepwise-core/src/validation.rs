//! Per-step form validation.
//!
//! Validation never fails: it returns a [`ValidationResult`] whose
//! [`FieldErrors`] keep the order in which the checks ran, so the first
//! entry is the field a front end should focus.
//!
//! Steps without validators always pass.

use std::sync::LazyLock;

use regex::Regex;
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;

use crate::models::FormData;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// Whether `email` looks like `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Insertion-ordered map of field path to error message.
///
/// Re-inserting a field replaces its message but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(String, String)>);

impl FieldErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, field: &str, message: &str) {
        match self.0.iter_mut().find(|(existing, _)| existing == field) {
            Some((_, existing)) => *existing = message.to_string(),
            None => self.0.push((field.to_string(), message.to_string())),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Drops the message for `field`, returning it when there was one.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        let position = self.0.iter().position(|(existing, _)| existing == field)?;
        Some(self.0.remove(position).1)
    }

    /// The field to focus: the first one that failed.
    pub fn first(&self) -> Option<(&str, &str)> {
        self.iter().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }

    pub fn fields(&self) -> Vec<&str> {
        self.iter().map(|(field, _)| field).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, message) in &self.0 {
            map.serialize_entry(field, message)?;
        }
        map.end()
    }
}

/// Outcome of validating one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: FieldErrors,
}

impl From<FieldErrors> for ValidationResult {
    fn from(errors: FieldErrors) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validates the fields owned by `step_id`.
pub fn validate_step(step_id: &str, form: &FormData) -> ValidationResult {
    let mut errors = FieldErrors::new();
    match step_id {
        "step-1-1" => introduction_disclosure(form, &mut errors),
        "step-1-2" => standing_data(form, &mut errors),
        "step-1-3" => ownership(form, &mut errors),
        "step-1-4" => controllers(form, &mut errors),
        "step-1-5" => permissions(form, &mut errors),
        "step-4-1" => waivers(form, &mut errors),
        "step-4-2" => application_fees(form, &mut errors),
        "step-4-3" => declarations(form, &mut errors),
        "step-4-4" => final_submission(form, &mut errors),
        _ => {}
    }
    errors.into()
}

pub fn can_complete_step(step_id: &str, form: &FormData) -> bool {
    validate_step(step_id, form).is_valid
}

/// Missing, non-string or whitespace-only.
fn is_blank(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .map_or(true, |s| s.trim().is_empty())
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn require(form: &FormData, errors: &mut FieldErrors, path: &str, message: &str) {
    if is_blank(form.get(path)) {
        errors.insert(path, message);
    }
}

fn require_email(form: &FormData, errors: &mut FieldErrors, path: &str, message: &str) {
    match form.get_str(path).map(str::trim) {
        Some(email) if !email.is_empty() => {
            if !is_valid_email(email) {
                errors.insert(path, "Please enter a valid email address");
            }
        }
        _ => errors.insert(path, message),
    }
}

fn require_checked(form: &FormData, errors: &mut FieldErrors, path: &str, message: &str) {
    if !is_truthy(form.get(path)) {
        errors.insert(path, message);
    }
}

fn items<'a>(form: &'a FormData, path: &str) -> &'a [Value] {
    form.get_array(path).map_or(&[], Vec::as_slice)
}

fn introduction_disclosure(form: &FormData, errors: &mut FieldErrors) {
    require(form, errors, "submitterName", "Submitter name is required");
    require(form, errors, "submitterFunction", "Submitter function is required");
    require_email(form, errors, "submitterEmail", "Submitter email is required");
    require(form, errors, "submitterPhone", "Submitter phone is required");

    if !is_truthy(form.get("contactPersonInternal")) {
        require(form, errors, "externalAdviserName", "External adviser name is required");
        require(form, errors, "externalAdviserEmail", "External adviser email is required");
        require(
            form,
            errors,
            "externalAdviserCompany",
            "External adviser company is required",
        );
    }

    require_checked(
        form,
        errors,
        "instructionsConfirmed",
        "You must confirm you have read the instructions",
    );
    require_checked(
        form,
        errors,
        "disclosureAcknowledged",
        "You must acknowledge the disclosure statement",
    );
    require_checked(
        form,
        errors,
        "informationAccurate",
        "You must confirm the information is accurate",
    );
    require_checked(
        form,
        errors,
        "authorizedToSubmit",
        "You must confirm you are authorized to submit",
    );
    require_checked(form, errors, "difcaConsent", "You must provide DIFCA consent");
}

fn standing_data(form: &FormData, errors: &mut FieldErrors) {
    require(form, errors, "firmName", "Firm name is required");
    require(form, errors, "registeredCountry", "Registered country is required");
    require(form, errors, "headOfficeAddress.line1", "Address line 1 is required");
    require(form, errors, "headOfficeAddress.city", "City is required");
    require(form, errors, "headOfficeAddress.country", "Country is required");
    require(form, errors, "primaryContactName", "Primary contact name is required");
    require_email(
        form,
        errors,
        "primaryContactEmail",
        "Primary contact email is required",
    );
    require(form, errors, "primaryContactPhone", "Primary contact phone is required");
    require(form, errors, "itReliance", "IT reliance level is required");
    require(form, errors, "itComplexity", "IT complexity level is required");

    if !is_truthy(form.get("isRepresentativeOffice")) {
        require(form, errors, "legalStatus", "Legal status is required");
    }
}

fn ownership(form: &FormData, errors: &mut FieldErrors) {
    let shareholders = items(form, "shareholders");
    for (i, shareholder) in shareholders.iter().enumerate() {
        if is_blank(shareholder.get("name")) {
            errors.insert(&format!("shareholder-{i}-name"), "Shareholder name is required");
        }
        let percentage = shareholder.get("percentage").and_then(Value::as_f64);
        if !percentage.is_some_and(|p| p > 0.0) {
            errors.insert(
                &format!("shareholder-{i}-percentage"),
                "Valid ownership percentage is required",
            );
        }
        if is_blank(shareholder.get("country")) {
            errors.insert(&format!("shareholder-{i}-country"), "Country is required");
        }
        if !is_truthy(shareholder.get("isIndividual")) && is_blank(shareholder.get("entityType")) {
            errors.insert(
                &format!("shareholder-{i}-entityType"),
                "Entity type is required for non-individuals",
            );
        }
    }

    let total: f64 = shareholders
        .iter()
        .filter_map(|s| s.get("percentage").and_then(Value::as_f64))
        .sum();
    if total > 100.0 {
        errors.insert("shareholdingTotal", "Total shareholding cannot exceed 100%");
    }

    for (i, owner) in items(form, "beneficialOwners").iter().enumerate() {
        if is_blank(owner.get("name")) {
            errors.insert(&format!("beneficial-{i}-name"), "Beneficial owner name is required");
        }
        let percentage = owner.get("percentage").and_then(Value::as_f64);
        if !percentage.is_some_and(|p| p >= 25.0) {
            errors.insert(
                &format!("beneficial-{i}-percentage"),
                "Beneficial ownership must be 25% or more",
            );
        }
        if is_blank(owner.get("nationality")) {
            errors.insert(&format!("beneficial-{i}-nationality"), "Nationality is required");
        }
    }

    if is_truthy(form.get("isPartOfGroup")) {
        require(
            form,
            errors,
            "ultimateHoldingCompany",
            "Ultimate holding company is required",
        );
    }
    if is_truthy(form.get("publiclyListed")) {
        require(form, errors, "listingExchange", "Stock exchange is required");
    }
}

fn controllers(form: &FormData, errors: &mut FieldErrors) {
    if !is_truthy(form.get("hasControllers")) {
        return;
    }

    let controllers = items(form, "controllers");
    if controllers.is_empty() {
        errors.insert(
            "controllers",
            "Please add at least one controller or uncheck the controllers option",
        );
        return;
    }

    let required = [
        ("name", "Controller name is required"),
        ("role", "Controller role is required"),
        ("controlType", "Control type is required"),
        ("nationality", "Nationality is required"),
    ];
    for (i, controller) in controllers.iter().enumerate() {
        for (field, message) in required {
            if is_blank(controller.get(field)) {
                errors.insert(&format!("controller-{i}-{field}"), message);
            }
        }
    }
}

fn permissions(form: &FormData, errors: &mut FieldErrors) {
    let any_activity = form
        .get("activitySelections")
        .and_then(Value::as_object)
        .is_some_and(|selections| selections.values().any(|v| v == &Value::Bool(true)));

    if !any_activity && !is_truthy(form.get("isRepresentativeOffice")) {
        errors.insert(
            "activitySelections",
            "Please select at least one activity or choose Representative Office",
        );
    }
}

fn waivers(form: &FormData, errors: &mut FieldErrors) {
    for (i, waiver) in items(form, "waiverRequests").iter().enumerate() {
        if is_blank(waiver.get("requirement")) {
            errors.insert(
                &format!("waiverRequests.{i}.requirement"),
                "Requirement to be waived is required",
            );
        }
        if is_blank(waiver.get("justification")) {
            errors.insert(
                &format!("waiverRequests.{i}.justification"),
                "Justification is required",
            );
        }
    }
}

fn application_fees(form: &FormData, errors: &mut FieldErrors) {
    require(form, errors, "paymentMethod", "Please select a payment method");
}

fn declarations(form: &FormData, errors: &mut FieldErrors) {
    let declarations = items(form, "individualDeclarations");
    if declarations.is_empty() {
        errors.insert(
            "individualDeclarations",
            "At least one individual declaration is required",
        );
        return;
    }

    for (i, declaration) in declarations.iter().enumerate() {
        if is_blank(declaration.get("personName")) {
            errors.insert(
                &format!("individualDeclarations.{i}.personName"),
                "Person name is required",
            );
        }
        if is_blank(declaration.get("role")) {
            errors.insert(&format!("individualDeclarations.{i}.role"), "Role is required");
        }
        if !is_truthy(declaration.get("declarationSigned")) {
            errors.insert(
                &format!("individualDeclarations.{i}.declarationSigned"),
                "Declaration must be signed",
            );
        }
    }
}

fn final_submission(form: &FormData, errors: &mut FieldErrors) {
    require_checked(
        form,
        errors,
        "finalReview",
        "You must review the application before submission",
    );
    require_checked(
        form,
        errors,
        "submissionDeclaration",
        "You must make the submission declaration",
    );
}
