// Derived views over the task collection: filter, search and sort

use crate::task::{Category, Priority, Task};
use std::cmp::Ordering;
use std::fmt;

/// Which tasks to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
    /// High priority, completed or not
    HighPriority,
    Category(Category),
}

impl Filter {
    /// Map a filter key to a filter, falling back to `All` for unknown keys
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "active" => Filter::Active,
            "completed" => Filter::Completed,
            "high" => Filter::HighPriority,
            other => other.parse::<Category>().map(Filter::Category).unwrap_or(Filter::All),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
            Filter::HighPriority => "high",
            Filter::Category(category) => category.as_str(),
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
            Filter::HighPriority => task.priority == Priority::High,
            Filter::Category(category) => task.category == category,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Priority,
    Deadline,
    /// Keep insertion order
    Insertion,
}

impl SortOrder {
    /// Map a sort key to an order, falling back to `Insertion` for unknown keys
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "newest" => SortOrder::Newest,
            "oldest" => SortOrder::Oldest,
            "priority" => SortOrder::Priority,
            "deadline" => SortOrder::Deadline,
            _ => SortOrder::Insertion,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Priority => "priority",
            SortOrder::Deadline => "deadline",
            SortOrder::Insertion => "insertion",
        }
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::Oldest => a.created_at.cmp(&b.created_at),
            SortOrder::Priority => b.priority.weight().cmp(&a.priority.weight()),
            SortOrder::Deadline => match (a.deadline, b.deadline) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortOrder::Insertion => Ordering::Equal,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Current view parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub filter: Filter,
    pub query: String,
    pub sort: SortOrder,
}

/// Keep the tasks that match `filter`
pub fn filter<'a>(tasks: impl IntoIterator<Item = &'a Task>, filter: Filter) -> Vec<&'a Task> {
    tasks.into_iter().filter(|t| filter.matches(t)).collect()
}

/// Case-insensitive substring search over title, description and category
///
/// A blank query keeps every task.
pub fn search<'a>(tasks: impl IntoIterator<Item = &'a Task>, query: &str) -> Vec<&'a Task> {
    if query.trim().is_empty() {
        return tasks.into_iter().collect();
    }

    let needle = query.to_lowercase();
    tasks.into_iter().filter(|t| matches_query(t, &needle)).collect()
}

fn matches_query(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task.category.as_str().contains(needle)
}

/// Order tasks by `order`; ties keep their input order
pub fn sort<'a>(tasks: impl IntoIterator<Item = &'a Task>, order: SortOrder) -> Vec<&'a Task> {
    let mut list: Vec<&Task> = tasks.into_iter().collect();
    if order != SortOrder::Insertion {
        // sort_by is stable
        list.sort_by(|a, b| order.compare(a, b));
    }
    list
}

/// Filter, then search, then sort
pub fn visible<'a>(tasks: impl IntoIterator<Item = &'a Task>, view: &View) -> Vec<&'a Task> {
    let filtered = filter(tasks, view.filter);
    let found = search(filtered, &view.query);
    sort(found, view.sort)
}
