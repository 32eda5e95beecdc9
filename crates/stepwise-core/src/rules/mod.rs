//! Rule evaluation for step and field visibility.
//!
//! Visibility is expressed as a [`Condition`] tree: `All` / `Any` / `Not`
//! nodes over typed [`Predicate`] leaves that read the form through dotted
//! property paths. Evaluation is plain structural recursion.
//!
//! Missing data is never an error. A path that runs into an absent key or a
//! non-object value resolves to "absent", and every predicate treats absent
//! as false (`IsFalse` needs an explicit `false`). An applicant who has not
//! reached a question yet therefore never unlocks the steps it gates.
//!
//! # Submodules
//!
//! - [`table`]: data-driven rules (`fieldPath` / `operator` / `groupId`) as
//!   stored by a rules backend
//! - [`fields`]: per-step field visibility maps
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use stepwise_core::{models::FormData, rules::Condition};
//!
//! let fund_management = Condition::all(vec![
//!     Condition::is_true("activitySelections.A1"),
//!     Condition::any(vec![
//!         Condition::array_non_empty("financialServicesMatrix.A10"),
//!         Condition::array_non_empty("financialServicesMatrix.A11"),
//!     ]),
//! ]);
//!
//! let empty = FormData::new();
//! assert!(!fund_management.evaluate(&empty));
//!
//! let form = FormData::try_from(json!({
//!     "activitySelections": { "A1": true },
//!     "financialServicesMatrix": { "A11": ["CLIENT-1"] }
//! }))
//! .unwrap();
//! assert!(fund_management.evaluate(&form));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::FormData;

pub mod fields;
pub mod table;


/// Leaf test against a single form field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Field is the boolean `true`
    IsTrue(String),

    /// Field is the boolean `false` (absent does not count)
    IsFalse(String),

    /// Field deep-equals the given JSON value
    Equals { path: String, value: Value },

    /// Field is present and not `null`
    Exists(String),

    /// Field is an array with at least one element
    ArrayNonEmpty(String),

    /// Field is an object with at least one member set to `true`
    AnyFlagSet(String),

    /// Field is a number strictly greater than `value`
    GreaterThan { path: String, value: f64 },
}

impl Predicate {
    /// Evaluates the predicate; absent fields are always false.
    pub fn evaluate(&self, form: &FormData) -> bool {
        match self {
            Predicate::IsTrue(path) => form.get(path) == Some(&Value::Bool(true)),
            Predicate::IsFalse(path) => form.get(path) == Some(&Value::Bool(false)),
            Predicate::Equals { path, value } => form.get(path) == Some(value),
            Predicate::Exists(path) => form.get(path).is_some_and(|v| !v.is_null()),
            Predicate::ArrayNonEmpty(path) => form
                .get(path)
                .and_then(Value::as_array)
                .is_some_and(|items| !items.is_empty()),
            Predicate::AnyFlagSet(path) => form
                .get(path)
                .and_then(Value::as_object)
                .is_some_and(|flags| flags.values().any(|v| v == &Value::Bool(true))),
            Predicate::GreaterThan { path, value } => form
                .get(path)
                .and_then(Value::as_f64)
                .is_some_and(|n| n > *value),
        }
    }

    /// The form path the predicate reads.
    pub fn path(&self) -> &str {
        match self {
            Predicate::IsTrue(path)
            | Predicate::IsFalse(path)
            | Predicate::Exists(path)
            | Predicate::ArrayNonEmpty(path)
            | Predicate::AnyFlagSet(path) => path,
            Predicate::Equals { path, .. } | Predicate::GreaterThan { path, .. } => path,
        }
    }
}

/// Boolean condition tree evaluated against [`FormData`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Every child holds (true when empty)
    All(Vec<Condition>),

    /// At least one child holds (false when empty)
    Any(Vec<Condition>),

    /// Negation
    Not(Box<Condition>),

    /// Leaf predicate
    Test(Predicate),
}

impl Condition {
    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::All(conditions)
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Any(conditions)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    pub fn is_true(path: &str) -> Self {
        Condition::Test(Predicate::IsTrue(path.to_string()))
    }

    pub fn is_false(path: &str) -> Self {
        Condition::Test(Predicate::IsFalse(path.to_string()))
    }

    pub fn equals(path: &str, value: Value) -> Self {
        Condition::Test(Predicate::Equals {
            path: path.to_string(),
            value,
        })
    }

    pub fn exists(path: &str) -> Self {
        Condition::Test(Predicate::Exists(path.to_string()))
    }

    pub fn array_non_empty(path: &str) -> Self {
        Condition::Test(Predicate::ArrayNonEmpty(path.to_string()))
    }

    pub fn any_flag_set(path: &str) -> Self {
        Condition::Test(Predicate::AnyFlagSet(path.to_string()))
    }

    pub fn greater_than(path: &str, value: f64) -> Self {
        Condition::Test(Predicate::GreaterThan {
            path: path.to_string(),
            value,
        })
    }

    /// `Any` over `ArrayNonEmpty` for each code under `prefix`.
    ///
    /// Shorthand for "any of these activity codes has a selection in the
    /// matrix", the most common trigger shape.
    pub fn any_non_empty(prefix: &str, codes: &[&str]) -> Self {
        Condition::Any(
            codes
                .iter()
                .map(|code| Condition::array_non_empty(&format!("{prefix}.{code}")))
                .collect(),
        )
    }

    /// Evaluates the tree against the form.
    pub fn evaluate(&self, form: &FormData) -> bool {
        match self {
            Condition::All(children) => children.iter().all(|c| c.evaluate(form)),
            Condition::Any(children) => children.iter().any(|c| c.evaluate(form)),
            Condition::Not(inner) => !inner.evaluate(form),
            Condition::Test(predicate) => predicate.evaluate(form),
        }
    }

    /// Every form path the tree reads, in depth-first order.
    pub fn referenced_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::All(children) | Condition::Any(children) => {
                for child in children {
                    child.collect_paths(out);
                }
            }
            Condition::Not(inner) => inner.collect_paths(out),
            Condition::Test(predicate) => out.push(predicate.path()),
        }
    }
}
