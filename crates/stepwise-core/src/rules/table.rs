//! Data-driven rule table.
//!
//! Rules in this format come from a rules backend as JSON. Each rule targets
//! a step or a field and carries a flat list of conditions; conditions that
//! share a `groupId` are AND-ed, and groups are OR-ed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::Result, models::FormData};

/// Comparison applied by a [`RuleCondition`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    IsTrue,
    IsFalse,
    IsEmpty,
    IsNotEmpty,
    LengthGt,
    LengthGte,
    LengthLt,
    LengthEquals,
    Contains,
    NotContains,
    In,
    NotIn,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One row of a rule: `fieldPath <operator> value`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub field_path: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub group_id: u32,
}

impl RuleCondition {
    pub fn new(field_path: &str, operator: Operator) -> Self {
        Self {
            field_path: field_path.to_string(),
            operator,
            value: None,
            group_id: 0,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn in_group(mut self, group_id: u32) -> Self {
        self.group_id = group_id;
        self
    }

    /// Evaluates the condition. Comparisons on absent fields are false.
    pub fn evaluate(&self, form: &FormData) -> bool {
        let field = form.get(&self.field_path);
        let expected = self.value.as_ref();

        match self.operator {
            Operator::Equals => field.is_some() && field == expected,
            Operator::NotEquals => field != expected,
            Operator::IsTrue => field == Some(&Value::Bool(true)),
            Operator::IsFalse => field == Some(&Value::Bool(false)),
            Operator::IsEmpty => is_empty(field),
            Operator::IsNotEmpty => !is_empty(field),
            Operator::LengthGt => compare_length(field, expected, |len, n| len > n),
            Operator::LengthGte => compare_length(field, expected, |len, n| len >= n),
            Operator::LengthLt => compare_length(field, expected, |len, n| len < n),
            Operator::LengthEquals => compare_length(field, expected, |len, n| len == n),
            Operator::Contains => contains(field, expected).unwrap_or(false),
            Operator::NotContains => contains(field, expected).map_or(true, |found| !found),
            Operator::In => member_of(field, expected).unwrap_or(false),
            Operator::NotIn => member_of(field, expected).map_or(true, |found| !found),
            Operator::Gt => compare_number(field, expected, |a, b| a > b),
            Operator::Gte => compare_number(field, expected, |a, b| a >= b),
            Operator::Lt => compare_number(field, expected, |a, b| a < b),
            Operator::Lte => compare_number(field, expected, |a, b| a <= b),
        }
    }
}

fn is_empty(field: Option<&Value>) -> bool {
    match field {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn compare_length(
    field: Option<&Value>,
    expected: Option<&Value>,
    cmp: impl Fn(u64, u64) -> bool,
) -> bool {
    match (field.and_then(Value::as_array), expected.and_then(Value::as_u64)) {
        (Some(items), Some(n)) => cmp(items.len() as u64, n),
        _ => false,
    }
}

fn compare_number(
    field: Option<&Value>,
    expected: Option<&Value>,
    cmp: impl Fn(f64, f64) -> bool,
) -> bool {
    match (field.and_then(Value::as_f64), expected.and_then(Value::as_f64)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// `None` when the field is neither a string nor an array.
fn contains(field: Option<&Value>, expected: Option<&Value>) -> Option<bool> {
    match field? {
        Value::String(s) => Some(
            expected
                .and_then(Value::as_str)
                .is_some_and(|needle| s.contains(needle)),
        ),
        Value::Array(items) => Some(expected.is_some_and(|needle| items.contains(needle))),
        _ => None,
    }
}

/// `None` when the rule value is not a list.
fn member_of(field: Option<&Value>, expected: Option<&Value>) -> Option<bool> {
    let options = expected?.as_array()?;
    Some(field.is_some_and(|value| options.contains(value)))
}

/// Evaluates a flat condition list: AND within a group, OR across groups.
///
/// An empty list is true.
pub fn evaluate_group(conditions: &[RuleCondition], form: &FormData) -> bool {
    if conditions.is_empty() {
        return true;
    }

    let mut groups: BTreeMap<u32, bool> = BTreeMap::new();
    for condition in conditions {
        let passed = condition.evaluate(form);
        groups
            .entry(condition.group_id)
            .and_modify(|all| *all = *all && passed)
            .or_insert(passed);
    }
    groups.values().any(|passed| *passed)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Visibility,
    Validation,
    Calculation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Step,
    Field,
    Section,
}

/// A stored rule.
///
/// Field rules target `"<stepId>.<fieldId>"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub rule_code: String,
    pub rule_name: String,
    pub rule_type: RuleType,
    pub target_type: TargetType,
    pub target_id: String,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_active() -> bool {
    true
}

impl Rule {
    pub fn evaluate(&self, form: &FormData) -> bool {
        evaluate_group(&self.conditions, form)
    }

    fn is_visibility_for(&self, target: TargetType) -> bool {
        self.is_active && self.rule_type == RuleType::Visibility && self.target_type == target
    }
}

/// Collection of stored rules evaluated for step and field visibility.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parses a JSON array of rules.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Ids of the steps whose active visibility rule holds, by priority.
    pub fn visible_steps(&self, form: &FormData) -> Vec<String> {
        let mut step_rules: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|rule| rule.is_visibility_for(TargetType::Step))
            .collect();
        step_rules.sort_by_key(|rule| rule.priority);

        step_rules
            .into_iter()
            .filter(|rule| rule.evaluate(form))
            .map(|rule| rule.target_id.clone())
            .collect()
    }

    /// Visibility of every field that has a rule on `step_id`.
    pub fn field_visibility(&self, step_id: &str, form: &FormData) -> BTreeMap<String, bool> {
        let prefix = format!("{step_id}.");
        self.rules
            .iter()
            .filter(|rule| rule.is_visibility_for(TargetType::Field))
            .filter_map(|rule| {
                rule.target_id
                    .strip_prefix(&prefix)
                    .map(|field| (field.to_string(), rule.evaluate(form)))
            })
            .collect()
    }

    /// Fields without a rule are visible.
    pub fn is_field_visible(&self, step_id: &str, field_id: &str, form: &FormData) -> bool {
        self.field_visibility(step_id, form)
            .get(field_id)
            .copied()
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn form(value: Value) -> FormData {
        FormData::try_from(value).unwrap()
    }

    #[test]
    fn test_empty_condition_list_is_true() {
        assert!(evaluate_group(&[], &FormData::new()));
    }

    #[test]
    fn test_groups_and_within_or_across() {
        let conditions = vec![
            RuleCondition::new("activitySelections.A1", Operator::IsTrue),
            RuleCondition::new("financialServicesMatrix.A10", Operator::LengthGt)
                .with_value(json!(0)),
            RuleCondition::new("activitySelections.A6", Operator::IsTrue).in_group(1),
        ];

        let only_sector = form(json!({ "activitySelections": { "A1": true } }));
        assert!(!evaluate_group(&conditions, &only_sector));

        let sector_and_matrix = form(json!({
            "activitySelections": { "A1": true },
            "financialServicesMatrix": { "A10": ["x"] }
        }));
        assert!(evaluate_group(&conditions, &sector_and_matrix));

        let second_group = form(json!({ "activitySelections": { "A6": true } }));
        assert!(evaluate_group(&conditions, &second_group));
    }

    #[test]
    fn test_numeric_comparisons_on_absent_fields_are_false() {
        let empty = FormData::new();
        for operator in [Operator::Gt, Operator::Gte, Operator::Lt, Operator::Lte] {
            let condition = RuleCondition::new("shareholdingTotal", operator).with_value(json!(0));
            assert!(!condition.evaluate(&empty), "{operator:?} on absent field");
        }

        let condition = RuleCondition::new("firmName", Operator::Gt).with_value(json!(0));
        assert!(!condition.evaluate(&form(json!({ "firmName": "Acme" }))));
    }

    #[test]
    fn test_emptiness_operators() {
        let data = form(json!({ "name": "  ", "list": [], "obj": {}, "n": 0 }));
        assert!(RuleCondition::new("name", Operator::IsEmpty).evaluate(&data));
        assert!(RuleCondition::new("list", Operator::IsEmpty).evaluate(&data));
        assert!(RuleCondition::new("obj", Operator::IsEmpty).evaluate(&data));
        assert!(RuleCondition::new("missing", Operator::IsEmpty).evaluate(&data));
        assert!(RuleCondition::new("n", Operator::IsNotEmpty).evaluate(&data));
    }

    #[test]
    fn test_contains_and_membership() {
        let data = form(json!({ "tags": ["a", "b"], "name": "Acme Ltd", "country": "AE" }));

        let contains = RuleCondition::new("tags", Operator::Contains).with_value(json!("b"));
        assert!(contains.evaluate(&data));
        let substring = RuleCondition::new("name", Operator::Contains).with_value(json!("Ltd"));
        assert!(substring.evaluate(&data));
        let not_contains = RuleCondition::new("missing", Operator::NotContains).with_value(json!("x"));
        assert!(not_contains.evaluate(&data));

        let member = RuleCondition::new("country", Operator::In).with_value(json!(["AE", "GB"]));
        assert!(member.evaluate(&data));
        let not_member = RuleCondition::new("country", Operator::NotIn).with_value(json!(["GB"]));
        assert!(not_member.evaluate(&data));
    }

    #[test]
    fn test_equals_requires_presence() {
        let condition = RuleCondition::new("legalStatus", Operator::Equals).with_value(json!("llc"));
        assert!(!condition.evaluate(&FormData::new()));
        assert!(condition.evaluate(&form(json!({ "legalStatus": "llc" }))));

        let not_equals = RuleCondition::new("legalStatus", Operator::NotEquals).with_value(json!("llc"));
        assert!(not_equals.evaluate(&FormData::new()));
    }

    #[test]
    fn test_rule_set_from_json() {
        let rules = RuleSet::from_json(
            r#"[
                {
                    "id": "r2", "ruleCode": "STEP_2_2", "ruleName": "Rep office",
                    "ruleType": "visibility", "targetType": "step", "targetId": "step-2-2",
                    "conditions": [{ "fieldPath": "isRepresentativeOffice", "operator": "is_true" }],
                    "priority": 2
                },
                {
                    "id": "r1", "ruleCode": "STEP_1_1", "ruleName": "Intro",
                    "ruleType": "visibility", "targetType": "step", "targetId": "step-1-1",
                    "priority": 1
                },
                {
                    "id": "r3", "ruleCode": "OFF", "ruleName": "Inactive",
                    "ruleType": "visibility", "targetType": "step", "targetId": "step-9-9",
                    "isActive": false
                },
                {
                    "id": "f1", "ruleCode": "F_LISTING", "ruleName": "Listing exchange",
                    "ruleType": "visibility", "targetType": "field",
                    "targetId": "step-1-2.listingExchange",
                    "conditions": [{ "fieldPath": "publiclyListed", "operator": "is_true" }]
                }
            ]"#,
        )
        .unwrap();

        let data = form(json!({ "isRepresentativeOffice": true }));
        assert_eq!(rules.visible_steps(&data), vec!["step-1-1", "step-2-2"]);

        assert!(!rules.is_field_visible("step-1-2", "listingExchange", &data));
        assert!(rules.is_field_visible("step-1-2", "firmName", &data));
        assert_eq!(rules.field_visibility("step-1-3", &data).len(), 0);
    }
}
