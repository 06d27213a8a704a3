// Field-keyed validation of task candidates

use crate::reducer::TaskUpdate;
use crate::task::{TaskDraft, parse_deadline};
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Minimum title length accepted by the default rules
pub const MIN_TITLE_LENGTH: usize = 3;

/// Task field that a validation error is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Deadline,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Deadline => "deadline",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every problem found in a candidate, one message per field
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid task: {}", summarize(.errors))]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

fn summarize(errors: &BTreeMap<Field, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: Field, message: String) {
        self.errors.insert(field, message);
    }
}

/// Rules a [`Validator`] enforces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    /// Minimum title length in characters, after trimming
    pub min_title_length: usize,
    pub max_title_length: Option<usize>,
    /// Reject deadlines before the current day
    pub reject_past_deadline: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_title_length: MIN_TITLE_LENGTH,
            max_title_length: None,
            reject_past_deadline: true,
        }
    }
}

/// Checks a [`TaskDraft`] before it is handed to the factory
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rules: ValidationRules,
}

impl Validator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    /// Validate against the current local calendar day
    pub fn validate(&self, draft: &TaskDraft) -> Result<(), ValidationErrors> {
        self.validate_on(draft, Local::now().date_naive())
    }

    /// Validate with `today` as the first acceptable deadline
    pub fn validate_on(&self, draft: &TaskDraft, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        self.check_title(draft.title.as_deref().unwrap_or(""), &mut errors);

        // An empty deadline input means "no deadline"
        if let Some(raw) = draft.deadline.as_deref().filter(|d| !d.trim().is_empty()) {
            match parse_deadline(raw) {
                None => errors.insert(Field::Deadline, format!("Invalid date: {}", raw.trim())),
                Some(deadline) => self.check_deadline(deadline, today, &mut errors),
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Check the fields an edit changes, under the same rules as a new task
    ///
    /// Fields the edit leaves alone are not rechecked; clearing the deadline
    /// is always allowed.
    pub fn validate_update_on(&self, updates: &TaskUpdate, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if let Some(title) = &updates.title {
            self.check_title(title, &mut errors);
        }
        if let Some(Some(deadline)) = updates.deadline {
            self.check_deadline(deadline, today, &mut errors);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn check_title(&self, title: &str, errors: &mut ValidationErrors) {
        let title_len = title.trim().chars().count();
        if title_len < self.rules.min_title_length {
            errors.insert(
                Field::Title,
                format!("Title must be at least {} characters", self.rules.min_title_length),
            );
        } else if let Some(max) = self.rules.max_title_length.filter(|max| title_len > *max) {
            errors.insert(Field::Title, format!("Title must be at most {} characters", max));
        }
    }

    fn check_deadline(&self, deadline: NaiveDate, today: NaiveDate, errors: &mut ValidationErrors) {
        if self.rules.reject_past_deadline && deadline < today {
            errors.insert(Field::Deadline, "Deadline cannot be in the past".to_string());
        }
    }
}

/// Validate with the default rules
pub fn validate(draft: &TaskDraft) -> Result<(), ValidationErrors> {
    Validator::default().validate(draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, 15).unwrap()
    }

    #[test]
    fn test_short_title_rejected() {
        let errors = validate(&TaskDraft::titled("ab")).unwrap_err();
        assert!(errors.contains(Field::Title));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_three_char_title_accepted() {
        assert!(validate(&TaskDraft::titled("abc")).is_ok());
    }

    #[test]
    fn test_missing_title_rejected() {
        let errors = validate(&TaskDraft::default()).unwrap_err();
        assert!(errors.contains(Field::Title));
    }

    #[test]
    fn test_title_is_trimmed() {
        let errors = validate(&TaskDraft::titled("  ab   ")).unwrap_err();
        assert_eq!(errors.get(Field::Title), Some("Title must be at least 3 characters"));
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        // Three Cyrillic letters are six bytes
        assert!(validate(&TaskDraft::titled("Дом")).is_ok());
    }

    #[test]
    fn test_unparseable_deadline() {
        let draft = TaskDraft::titled("Pay rent").with_deadline("someday");
        let errors = Validator::default().validate_on(&draft, today()).unwrap_err();
        assert!(errors.contains(Field::Deadline));
        assert!(!errors.contains(Field::Title));
    }

    #[test]
    fn test_past_deadline_rejected() {
        let draft = TaskDraft::titled("Pay rent").with_deadline("2030-06-14");
        let errors = Validator::default().validate_on(&draft, today()).unwrap_err();
        assert_eq!(errors.get(Field::Deadline), Some("Deadline cannot be in the past"));
    }

    #[test]
    fn test_today_deadline_accepted() {
        let draft = TaskDraft::titled("Pay rent").with_deadline("2030-06-15");
        assert!(Validator::default().validate_on(&draft, today()).is_ok());
    }

    #[test]
    fn test_empty_deadline_is_absent() {
        let draft = TaskDraft::titled("Pay rent").with_deadline("  ");
        assert!(Validator::default().validate_on(&draft, today()).is_ok());
    }

    #[test]
    fn test_errors_coexist() {
        let draft = TaskDraft::titled("x").with_deadline("2000-01-01");
        let errors = Validator::default().validate_on(&draft, today()).unwrap_err();

        assert_eq!(errors.len(), 2);
        let fields: Vec<Field> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec![Field::Title, Field::Deadline]);
        assert!(errors.to_string().starts_with("invalid task: title:"));
    }

    #[test]
    fn test_custom_rules() {
        let validator = Validator::new(ValidationRules {
            min_title_length: 1,
            max_title_length: Some(5),
            reject_past_deadline: false,
        });

        assert!(validator.validate_on(&TaskDraft::titled("a"), today()).is_ok());

        let errors = validator.validate_on(&TaskDraft::titled("abcdef"), today()).unwrap_err();
        assert_eq!(errors.get(Field::Title), Some("Title must be at most 5 characters"));

        let draft = TaskDraft::titled("old").with_deadline("2000-01-01");
        assert!(validator.validate_on(&draft, today()).is_ok());
    }

    #[test]
    fn test_update_checks_changed_fields() {
        let validator = Validator::default();

        let updates = TaskUpdate {
            title: Some("  ".to_string()),
            deadline: Some(NaiveDate::from_ymd_opt(2000, 1, 1)),
            ..Default::default()
        };
        let errors = validator.validate_update_on(&updates, today()).unwrap_err();
        assert!(errors.contains(Field::Title));
        assert!(errors.contains(Field::Deadline));

        let updates = TaskUpdate {
            title: Some("Pay rent".to_string()),
            deadline: Some(Some(today())),
            ..Default::default()
        };
        assert!(validator.validate_update_on(&updates, today()).is_ok());
    }

    #[test]
    fn test_update_without_title_or_deadline_passes() {
        let updates = TaskUpdate {
            description: Some(String::new()),
            deadline: Some(None),
            ..Default::default()
        };
        assert!(Validator::default().validate_update_on(&updates, today()).is_ok());
    }
}
