// Task model, id generation and the task factory

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Prefix for generated task ids
pub const ID_PREFIX: &str = "task_";

/// Error returned when a priority or category key is not recognized
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseKeyError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort weight, higher sorts first
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParseKeyError {
                kind: "priority",
                value: s.to_string(),
                expected: "low, medium, high",
            }),
        }
    }
}

/// Task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    #[default]
    Personal,
    Study,
    Health,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Work, Category::Personal, Category::Study, Category::Health];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Study => "study",
            Category::Health => "health",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| ParseKeyError {
                kind: "category",
                value: s.to_string(),
                expected: "work, personal, study, health",
            })
    }
}

/// A single to-do record
///
/// Field names serialize in camelCase so exported documents keep the
/// `createdAt`/`updatedAt` layout used by the browser app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_deadline"
    )]
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Relative position of the deadline against `today`, if there is one
    pub fn deadline_status(&self, today: NaiveDate) -> Option<DeadlineStatus> {
        self.deadline.map(|deadline| DeadlineStatus::between(today, deadline))
    }

    /// High priority, still open, and due no later than tomorrow
    pub fn is_urgent(&self, today: NaiveDate) -> bool {
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        self.priority == Priority::High && !self.completed && self.deadline.is_some_and(|d| d <= tomorrow)
    }
}

/// Where a deadline falls relative to the current day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    Overdue,
    Yesterday,
    Today,
    Tomorrow,
    /// Due in 2 to 6 days
    InDays(i64),
    On(NaiveDate),
}

impl DeadlineStatus {
    pub fn between(today: NaiveDate, deadline: NaiveDate) -> Self {
        match (deadline - today).num_days() {
            0 => DeadlineStatus::Today,
            1 => DeadlineStatus::Tomorrow,
            -1 => DeadlineStatus::Yesterday,
            n if n < 0 => DeadlineStatus::Overdue,
            n if n < 7 => DeadlineStatus::InDays(n),
            _ => DeadlineStatus::On(deadline),
        }
    }
}

impl fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadlineStatus::Overdue => write!(f, "overdue"),
            DeadlineStatus::Yesterday => write!(f, "yesterday"),
            DeadlineStatus::Today => write!(f, "today"),
            DeadlineStatus::Tomorrow => write!(f, "tomorrow"),
            DeadlineStatus::InDays(n) => write!(f, "in {} days", n),
            DeadlineStatus::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Parse a deadline given as `YYYY-MM-DD` or as an RFC 3339 date-time
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

// Browser exports store a missing deadline as "" rather than omitting it
fn deserialize_deadline<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_deadline(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid deadline '{}'", s))),
    }
}

/// Generate a unique task id
///
/// UUIDv7 carries a millisecond timestamp (monotonic within the process)
/// followed by random bits, so ids sort roughly by creation time.
pub fn generate_id() -> String {
    format!("{}{}", ID_PREFIX, Uuid::now_v7().simple())
}

/// Candidate task fields, as entered by a user or supplied as defaults
///
/// Every field is optional; `None` means "not set here".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub completed: Option<bool>,
    /// Unparsed so the validator can report bad input
    pub deadline: Option<String>,
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    /// Fields set on `other` win over fields set on `self`
    pub fn overlay(self, other: TaskDraft) -> TaskDraft {
        TaskDraft {
            title: other.title.or(self.title),
            description: other.description.or(self.description),
            priority: other.priority.or(self.priority),
            category: other.category.or(self.category),
            completed: other.completed.or(self.completed),
            deadline: other.deadline.or(self.deadline),
        }
    }
}

/// Builds tasks from drafts: base record, then factory defaults, then caller data
#[derive(Debug, Clone, Default)]
pub struct TaskFactory {
    defaults: TaskDraft,
}

impl TaskFactory {
    pub fn new(defaults: TaskDraft) -> Self {
        Self { defaults }
    }

    /// Create a task stamped with the current time
    pub fn create(&self, data: TaskDraft) -> Task {
        self.create_at(data, Utc::now())
    }

    /// Create a task stamped with `now`
    ///
    /// Never fails. Validation is the caller's job; a deadline that does not
    /// parse is dropped.
    pub fn create_at(&self, data: TaskDraft, now: DateTime<Utc>) -> Task {
        let merged = self.defaults.clone().overlay(data);

        Task {
            id: generate_id(),
            title: merged.title.unwrap_or_default(),
            description: merged.description.unwrap_or_default(),
            priority: merged.priority.unwrap_or_default(),
            category: merged.category.unwrap_or_default(),
            completed: merged.completed.unwrap_or(false),
            deadline: merged.deadline.as_deref().and_then(parse_deadline),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_generate_id_format() {
        let id = generate_id();
        assert!(id.starts_with(ID_PREFIX));
        assert_eq!(id.len(), ID_PREFIX.len() + 32);
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_generate_id_sorts_by_creation() {
        let first = generate_id();
        let second = generate_id();
        assert!(first < second);
    }

    #[test]
    fn test_factory_applies_base_defaults() {
        let task = TaskFactory::default().create(TaskDraft::titled("Buy milk"));

        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, Category::Personal);
        assert!(!task.completed);
        assert!(task.deadline.is_none());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_factory_data_overrides_defaults() {
        let factory = TaskFactory::new(TaskDraft {
            priority: Some(Priority::Low),
            category: Some(Category::Work),
            ..TaskDraft::default()
        });

        let task = factory.create(TaskDraft::titled("Ship release").with_priority(Priority::High));

        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category, Category::Work);
    }

    #[test]
    fn test_factory_parses_deadline() {
        let task = TaskFactory::default().create(TaskDraft::titled("Dentist").with_deadline("2030-05-01"));
        assert_eq!(task.deadline, Some(date("2030-05-01")));

        let task = TaskFactory::default().create(TaskDraft::titled("Dentist").with_deadline("not a date"));
        assert!(task.deadline.is_none());
    }

    #[test]
    fn test_parse_deadline_formats() {
        assert_eq!(parse_deadline("2030-05-01"), Some(date("2030-05-01")));
        assert_eq!(parse_deadline(" 2030-05-01 "), Some(date("2030-05-01")));
        assert_eq!(parse_deadline("2030-05-01T10:00:00Z"), Some(date("2030-05-01")));
        assert_eq!(parse_deadline("2030-13-01"), None);
        assert_eq!(parse_deadline(""), None);
    }

    #[test]
    fn test_priority_and_category_keys() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("study".parse::<Category>().unwrap(), Category::Study);

        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.kind, "priority");
        assert!("hobby".parse::<Category>().is_err());
    }

    #[test]
    fn test_priority_weight() {
        assert!(Priority::High.weight() > Priority::Medium.weight());
        assert!(Priority::Medium.weight() > Priority::Low.weight());
    }

    #[test]
    fn test_task_serialization() {
        let task = TaskFactory::default().create(TaskDraft::titled("Read book").with_deadline("2030-01-02"));
        let json = serde_json::to_string(&task).unwrap();

        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
        assert!(json.contains("\"priority\":\"medium\""));
        assert!(json.contains("\"deadline\":\"2030-01-02\""));

        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_task_deserialize_browser_export() {
        let json = r#"{
            "id": "task_lq2x_abc1234",
            "title": "Gym",
            "description": "",
            "priority": "high",
            "category": "health",
            "completed": false,
            "deadline": "",
            "createdAt": "2024-01-01T10:00:00.000Z",
            "updatedAt": "2024-01-01T10:00:00.000Z"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.category, Category::Health);
        assert!(task.deadline.is_none());
    }

    #[test]
    fn test_deadline_status() {
        let today = date("2030-03-10");
        assert_eq!(DeadlineStatus::between(today, today), DeadlineStatus::Today);
        assert_eq!(DeadlineStatus::between(today, date("2030-03-11")), DeadlineStatus::Tomorrow);
        assert_eq!(DeadlineStatus::between(today, date("2030-03-09")), DeadlineStatus::Yesterday);
        assert_eq!(DeadlineStatus::between(today, date("2030-03-01")), DeadlineStatus::Overdue);
        assert_eq!(DeadlineStatus::between(today, date("2030-03-14")), DeadlineStatus::InDays(4));
        assert_eq!(
            DeadlineStatus::between(today, date("2030-04-01")).to_string(),
            "2030-04-01"
        );
        assert_eq!(DeadlineStatus::InDays(3).to_string(), "in 3 days");
    }

    #[test]
    fn test_is_urgent() {
        let today = date("2030-03-10");
        let mut task = TaskFactory::default().create(
            TaskDraft::titled("File taxes")
                .with_priority(Priority::High)
                .with_deadline("2030-03-11"),
        );
        assert!(task.is_urgent(today));

        task.deadline = Some(date("2030-03-20"));
        assert!(!task.is_urgent(today));

        task.deadline = Some(today);
        task.completed = true;
        assert!(!task.is_urgent(today));
    }
}
