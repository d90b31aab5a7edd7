//! Mutually exclusive field groups and their validation.
//!
//! A group enforces "at most one of" its members. A required group additionally enforces
//! "at least one of", which together means "exactly one of". Every group is checked on
//! each pass so a single [`ValidationFailure`] reports all violations at once.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::BuildHasher;

pub const DEFAULT_MESSAGE: &str = "The fields {field_names} are mutually exclusive arguments.";
pub const DEFAULT_REQUIRED_MESSAGE: &str = "One of the fields {field_names} is required.";

/// A set of fields of which at most one (or exactly one, when required) may be provided.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusiveGroup {
    fields: Vec<String>,
    message: String,
    required: bool,
    required_message: String,
}

impl ExclusiveGroup {
    /// Group that allows zero or one member.
    pub fn at_most_one<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            message: DEFAULT_MESSAGE.to_string(),
            required: false,
            required_message: DEFAULT_REQUIRED_MESSAGE.to_string(),
        }
    }

    /// Group that demands exactly one member.
    pub fn exactly_one<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::at_most_one(fields).with_required(true)
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Message template; `{field_names}` expands to the comma-separated members.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_required_message(mut self, message: impl Into<String>) -> Self {
        self.required_message = message.into();
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn message(&self) -> String {
        self.render(&self.message)
    }

    pub fn required_message(&self) -> String {
        self.render(&self.required_message)
    }

    fn render(&self, template: &str) -> String {
        template.replace("{field_names}", &self.fields.join(", "))
    }
}

/// One violated group.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// More than one member was provided
    MutuallyExclusive { message: String, fields: Vec<String> },
    /// A required group had no member provided
    ExclusiveFieldRequired { message: String, fields: Vec<String> },
}

impl Violation {
    pub fn message(&self) -> &str {
        match self {
            Violation::MutuallyExclusive { message, .. } => message,
            Violation::ExclusiveFieldRequired { message, .. } => message,
        }
    }

    pub fn fields(&self) -> &[String] {
        match self {
            Violation::MutuallyExclusive { fields, .. } => fields,
            Violation::ExclusiveFieldRequired { fields, .. } => fields,
        }
    }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", join_messages(.violations))]
pub struct ValidationFailure {
    pub violations: Vec<Violation>,
}

impl ValidationFailure {
    /// Response body in the common error envelope.
    pub fn to_error_body(&self) -> Value {
        let messages: Vec<&str> = self.violations.iter().map(Violation::message).collect();
        json!({ "errors": { "non_field_errors": messages } })
    }
}

fn join_messages(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::message)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Anything that can answer "was this field provided?".
pub trait FieldPresence {
    fn is_provided(&self, field: &str) -> bool;
}

impl FieldPresence for Map<String, Value> {
    fn is_provided(&self, field: &str) -> bool {
        self.contains_key(field)
    }
}

impl FieldPresence for Value {
    fn is_provided(&self, field: &str) -> bool {
        self.as_object().is_some_and(|obj| obj.contains_key(field))
    }
}

impl<V, S: BuildHasher> FieldPresence for HashMap<String, V, S> {
    fn is_provided(&self, field: &str) -> bool {
        self.contains_key(field)
    }
}

impl<V, S: BuildHasher> FieldPresence for IndexMap<String, V, S> {
    fn is_provided(&self, field: &str) -> bool {
        self.contains_key(field)
    }
}

impl<V> FieldPresence for BTreeMap<String, V> {
    fn is_provided(&self, field: &str) -> bool {
        self.contains_key(field)
    }
}

impl<S: BuildHasher> FieldPresence for HashSet<String, S> {
    fn is_provided(&self, field: &str) -> bool {
        self.contains(field)
    }
}

impl FieldPresence for [&str] {
    fn is_provided(&self, field: &str) -> bool {
        self.contains(&field)
    }
}

/// Validates provided values against exclusive groups.
pub struct ExclusivityValidator;

impl ExclusivityValidator {
    /// Checks every group and aggregates all violations.
    pub fn validate<P>(values: &P, groups: &[ExclusiveGroup]) -> Result<(), ValidationFailure>
    where
        P: FieldPresence + ?Sized,
    {
        let violations: Vec<Violation> = groups
            .iter()
            .filter_map(|group| Self::check(values, group))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            log::debug!("Exclusive group validation failed with {} violation(s)", violations.len());
            Err(ValidationFailure { violations })
        }
    }

    fn check<P>(values: &P, group: &ExclusiveGroup) -> Option<Violation>
    where
        P: FieldPresence + ?Sized,
    {
        let provided: Vec<String> = group
            .fields()
            .iter()
            .filter(|f| values.is_provided(f))
            .cloned()
            .collect();

        if provided.len() > 1 {
            return Some(Violation::MutuallyExclusive {
                message: group.message(),
                fields: provided,
            });
        }
        if provided.is_empty() && group.is_required() {
            return Some(Violation::ExclusiveFieldRequired {
                message: group.required_message(),
                fields: group.fields().to_vec(),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_members_present_fails_once() {
        let group = ExclusiveGroup::at_most_one(["a", "b"]);
        let values = json!({"a": 1, "b": 2});

        let failure = ExclusivityValidator::validate(&values, &[group]).unwrap_err();

        assert_eq!(failure.violations.len(), 1);
        match &failure.violations[0] {
            Violation::MutuallyExclusive { message, fields } => {
                assert_eq!(fields, &vec!["a".to_string(), "b".to_string()]);
                assert_eq!(message, "The fields a, b are mutually exclusive arguments.");
            }
            other => panic!("unexpected violation: {:?}", other),
        }
    }

    #[test]
    fn test_single_member_passes() {
        let group = ExclusiveGroup::at_most_one(["a", "b"]);
        assert!(ExclusivityValidator::validate(&json!({"a": 1}), &[group]).is_ok());
    }

    #[test]
    fn test_optional_group_allows_none() {
        let group = ExclusiveGroup::at_most_one(["a", "b"]);
        assert!(ExclusivityValidator::validate(&json!({}), &[group]).is_ok());
    }

    #[test]
    fn test_required_group_with_nothing_fails() {
        let group = ExclusiveGroup::exactly_one(["a", "b"]).with_required_message("Pick {field_names}.");
        let failure = ExclusivityValidator::validate(&json!({}), &[group]).unwrap_err();

        assert_eq!(
            failure.violations,
            vec![Violation::ExclusiveFieldRequired {
                message: "Pick a, b.".to_string(),
                fields: vec!["a".to_string(), "b".to_string()],
            }]
        );
    }

    #[test]
    fn test_null_counts_as_provided() {
        let group = ExclusiveGroup::at_most_one(["a", "b"]);
        let failure = ExclusivityValidator::validate(&json!({"a": null, "b": 1}), &[group]);
        assert!(failure.is_err());
    }

    #[test]
    fn test_all_groups_are_reported() {
        let groups = vec![
            ExclusiveGroup::at_most_one(["a", "b"]).with_message("a or b"),
            ExclusiveGroup::exactly_one(["c", "d"]),
            ExclusiveGroup::at_most_one(["e", "f"]),
        ];
        let values: HashSet<String> = ["a", "b", "e"].iter().map(|s| s.to_string()).collect();

        let failure = ExclusivityValidator::validate(&values, &groups).unwrap_err();

        assert_eq!(failure.violations.len(), 2);
        assert_eq!(failure.violations[0].message(), "a or b");
        assert!(matches!(failure.violations[1], Violation::ExclusiveFieldRequired { .. }));
    }

    #[test]
    fn test_validation_does_not_touch_values() {
        let values = json!({"a": 1, "b": 2});
        let before = values.clone();
        let _ = ExclusivityValidator::validate(&values, &[ExclusiveGroup::at_most_one(["a", "b"])]);
        assert_eq!(values, before);
    }

    #[test]
    fn test_error_body_lists_every_message() {
        let failure = ValidationFailure {
            violations: vec![
                Violation::MutuallyExclusive { message: "one".into(), fields: vec![] },
                Violation::ExclusiveFieldRequired { message: "two".into(), fields: vec![] },
            ],
        };
        assert_eq!(
            failure.to_error_body(),
            json!({"errors": {"non_field_errors": ["one", "two"]}})
        );
        assert_eq!(failure.to_string(), "one two");
    }

    #[test]
    fn test_slice_presence() {
        let provided: &[&str] = &["x"];
        let group = ExclusiveGroup::exactly_one(["x", "y"]);
        assert!(ExclusivityValidator::validate(provided, &[group]).is_ok());
    }
}
