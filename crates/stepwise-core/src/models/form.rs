//! Form data model addressed by dotted property paths.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Result, WizardError};

/// Every field of every step, held as one JSON object.
///
/// Fields are addressed by dotted paths (`headOfficeAddress.city`,
/// `financialServicesMatrix.A10`). Any field may be absent; lookups through
/// missing or non-object intermediates resolve to `None` instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FormData(Map<String, Value>);

impl FormData {
    /// Creates an empty form with no fields at all.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Creates the form a fresh application starts with.
    pub fn initial() -> Self {
        let defaults = json!({
            // Introduction & Disclosure
            "submitterName": "",
            "submitterFunction": "",
            "submitterEmail": "",
            "submitterPhone": "",
            "contactPersonInternal": true,
            "externalAdviserName": "",
            "externalAdviserEmail": "",
            "externalAdviserCompany": "",
            "instructionsConfirmed": false,
            "disclosureAcknowledged": false,
            "informationAccurate": false,
            "authorizedToSubmit": false,
            "difcaConsent": false,

            // Standing Data
            "isRepresentativeOffice": false,
            "legalStatus": "",
            "generalStructure": "",
            "firmName": "",
            "tradingNames": [],
            "registeredCountry": "",
            "registrationNumber": "",
            "registrationDate": "",
            "financialYearEnd": "",
            "headOfficeAddress": {
                "line1": "",
                "line2": "",
                "city": "",
                "state": "",
                "postalCode": "",
                "country": "",
                "poBox": ""
            },
            "primaryContactName": "",
            "primaryContactEmail": "",
            "primaryContactPhone": "",
            "itReliance": "",
            "itComplexity": "",

            // Ownership Information
            "isPartOfGroup": false,
            "ultimateHoldingCompany": "",
            "shareholders": [],
            "beneficialOwners": [],
            "publiclyListed": false,
            "listingExchange": "",

            // Controllers & Group Structure
            "hasControllers": false,
            "controllers": [],
            "groupStructureDescription": "",

            // Permissions & Financial Services
            "activitySelections": {},
            "financialServicesMatrix": {},
            "endorsementSelections": {},

            // Core profile
            "businessPlanSummary": "",
            "projectedFinancials": {},
            "targetClientSegments": [],
            "riskManagementFramework": "",
            "boardComposition": [],

            // Final submission
            "waiverRequests": [],
            "paymentMethod": "",
            "individualDeclarations": [],
            "finalReview": false,
            "submissionDeclaration": false
        });

        match defaults {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    /// Layers `overrides` on top of the initial defaults (shallow merge).
    pub fn with_defaults(overrides: FormData) -> Self {
        let mut form = Self::initial();
        form.0.extend(overrides.0);
        form
    }

    /// Resolves a dotted path, returning `None` when any segment is missing.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Returns the value at `path` when it is a JSON boolean.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// Returns the value at `path` when it is a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Returns the value at `path` when it is an array.
    pub fn get_array(&self, path: &str) -> Option<&Vec<Value>> {
        self.get(path).and_then(Value::as_array)
    }

    /// Sets the value at a dotted path, creating intermediate objects.
    ///
    /// Fails when an intermediate segment exists but is not an object.
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(WizardError::invalid_input(path).with_reason("Empty path segment"));
        }

        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| WizardError::invalid_input(path).with_reason("Empty path"))?;

        let mut current = &mut self.0;
        for segment in parents {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = entry.as_object_mut().ok_or_else(|| {
                WizardError::invalid_input(path)
                    .with_reason(format!("Segment '{segment}' is not an object"))
            })?;
        }
        current.insert((*last).to_string(), value);
        Ok(())
    }

    /// Removes the value at a dotted path, returning it if present.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parents, last) = match path.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, path),
        };
        match parents {
            None => self.0.remove(last),
            Some(parents) => {
                let mut current = &mut self.0;
                for segment in parents.split('.') {
                    current = current.get_mut(segment)?.as_object_mut()?;
                }
                current.remove(last)
            }
        }
    }

    /// Read access to the top-level fields.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for FormData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for FormData {
    type Error = WizardError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(WizardError::invalid_input("formData")
                .with_reason(format!("Expected a JSON object, got {other}"))),
        }
    }
}
