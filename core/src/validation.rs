//! Field validation rules for commands.
//!
//! # Design
//! A [`RuleSet`] is an ordered list of (field, predicate, message) rules.
//! Validation evaluates every rule and aggregates all failures, so callers
//! see each violated rule rather than only the first.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::requests::{CreateToDoItem, UpdateToDoItem};
use crate::store::ToDoStore;

pub const MAX_NAME_LENGTH: usize = 200;

/// Which rule a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    FieldRequired,
    FieldTooLong,
    DuplicateName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub field: &'static str,
    pub kind: RuleKind,
    pub message: String,
}

/// Every failure found for one request, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailures {
    failures: Vec<ValidationFailure>,
}

impl ValidationFailures {
    pub fn push(&mut self, failure: ValidationFailure) {
        self.failures.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.failures.iter()
    }

    pub fn kinds(&self) -> Vec<RuleKind> {
        self.failures.iter().map(|failure| failure.kind).collect()
    }

    /// Messages grouped by field name, each list in rule order.
    pub fn errors(&self) -> BTreeMap<String, Vec<String>> {
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for failure in &self.failures {
            errors
                .entry(failure.field.to_string())
                .or_default()
                .push(failure.message.clone());
        }
        errors
    }
}

impl fmt::Display for ValidationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.field, failure.message))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

type Predicate<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

struct Rule<R> {
    field: &'static str,
    kind: RuleKind,
    message: String,
    passes: Predicate<R>,
}

pub struct RuleSet<R> {
    rules: Vec<Rule<R>>,
}

impl<R> Default for RuleSet<R> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<R> fmt::Debug for RuleSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| (rule.field, rule.kind)))
            .finish()
    }
}

impl<R> RuleSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. `passes` returns `true` when the request satisfies it.
    pub fn rule<F>(
        mut self,
        field: &'static str,
        kind: RuleKind,
        message: impl Into<String>,
        passes: F,
    ) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            field,
            kind,
            message: message.into(),
            passes: Box::new(passes),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn validate(&self, request: &R) -> Result<(), ValidationFailures> {
        let mut failures = ValidationFailures::default();
        for rule in &self.rules {
            if !(rule.passes)(request) {
                failures.push(ValidationFailure {
                    field: rule.field,
                    kind: rule.kind,
                    message: rule.message.clone(),
                });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }
}

fn name_present(name: &str) -> bool {
    !name.trim().is_empty()
}

fn name_within_limit(name: &str) -> bool {
    name.chars().count() <= MAX_NAME_LENGTH
}

fn too_long_message() -> String {
    format!("Name must not exceed {MAX_NAME_LENGTH} characters.")
}

pub fn create_rules(store: Arc<ToDoStore>) -> RuleSet<CreateToDoItem> {
    RuleSet::new()
        .rule("name", RuleKind::FieldRequired, "Name is required.", |r: &CreateToDoItem| {
            name_present(&r.name)
        })
        .rule("name", RuleKind::FieldTooLong, too_long_message(), |r: &CreateToDoItem| {
            name_within_limit(&r.name)
        })
        .rule(
            "name",
            RuleKind::DuplicateName,
            "The specified name already exists.",
            move |r: &CreateToDoItem| !store.name_exists(&r.name),
        )
}

/// Update does not re-check uniqueness.
pub fn update_rules() -> RuleSet<UpdateToDoItem> {
    RuleSet::new()
        .rule("name", RuleKind::FieldRequired, "Name is required.", |r: &UpdateToDoItem| {
            name_present(&r.name)
        })
        .rule("name", RuleKind::FieldTooLong, too_long_message(), |r: &UpdateToDoItem| {
            name_within_limit(&r.name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str) -> CreateToDoItem {
        CreateToDoItem {
            name: name.to_string(),
        }
    }

    #[test]
    fn valid_name_passes() {
        let rules = create_rules(Arc::new(ToDoStore::with_sample_items()));
        assert!(rules.validate(&create("New Task")).is_ok());
    }

    #[test]
    fn empty_name_is_required() {
        let rules = create_rules(Arc::new(ToDoStore::new()));
        let failures = rules.validate(&create("")).unwrap_err();
        assert_eq!(failures.kinds(), vec![RuleKind::FieldRequired]);
        assert_eq!(failures.errors()["name"], vec!["Name is required."]);
    }

    #[test]
    fn whitespace_name_is_required() {
        let rules = update_rules();
        let request = UpdateToDoItem {
            id: 1,
            name: "   ".to_string(),
            completed: false,
        };
        let failures = rules.validate(&request).unwrap_err();
        assert_eq!(failures.kinds(), vec![RuleKind::FieldRequired]);
    }

    #[test]
    fn two_hundred_chars_is_the_limit() {
        let rules = create_rules(Arc::new(ToDoStore::new()));
        assert!(rules.validate(&create(&"a".repeat(200))).is_ok());
        let failures = rules.validate(&create(&"a".repeat(201))).unwrap_err();
        assert_eq!(failures.kinds(), vec![RuleKind::FieldTooLong]);
        assert_eq!(failures.errors()["name"], vec!["Name must not exceed 200 characters."]);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let rules = create_rules(Arc::new(ToDoStore::new()));
        assert!(rules.validate(&create(&"é".repeat(200))).is_ok());
    }

    #[test]
    fn duplicate_name_is_rejected_on_create() {
        let rules = create_rules(Arc::new(ToDoStore::with_sample_items()));
        let failures = rules.validate(&create("Walk the dog")).unwrap_err();
        assert_eq!(failures.kinds(), vec![RuleKind::DuplicateName]);
        assert_eq!(failures.errors()["name"], vec!["The specified name already exists."]);
    }

    #[test]
    fn all_failing_rules_are_reported() {
        let store = Arc::new(ToDoStore::new());
        let long = "b".repeat(250);
        store.add(long.clone());
        let failures = create_rules(store).validate(&create(&long)).unwrap_err();
        assert_eq!(
            failures.kinds(),
            vec![RuleKind::FieldTooLong, RuleKind::DuplicateName]
        );
        assert_eq!(failures.errors()["name"].len(), 2);
    }

    #[test]
    fn update_allows_existing_names() {
        let request = UpdateToDoItem {
            id: 1,
            name: "Walk the dog".to_string(),
            completed: true,
        };
        assert!(update_rules().validate(&request).is_ok());
    }

    #[test]
    fn empty_rule_set_accepts_everything() {
        let rules: RuleSet<CreateToDoItem> = RuleSet::new();
        assert!(rules.is_empty());
        assert!(rules.validate(&create("")).is_ok());
    }
}
