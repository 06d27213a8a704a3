// Aggregate counts and other collection-wide summaries

use crate::task::{Category, Priority, Task};
use serde::Serialize;
use std::collections::HashSet;

/// Counts shown in the header of a task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    /// High priority and not yet completed
    pub high_priority: usize,
}

pub fn stats<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Stats {
    let mut stats = Stats::default();
    for task in tasks {
        stats.total += 1;
        if task.completed {
            stats.completed += 1;
        } else if task.priority == Priority::High {
            stats.high_priority += 1;
        }
    }
    stats.active = stats.total - stats.completed;
    stats
}

/// Share of completed tasks as a whole percentage, rounded half up
pub fn progress<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> u8 {
    let Stats { total, completed, .. } = stats(tasks);
    if total == 0 {
        return 0;
    }
    // completed <= total, so the result is at most 100
    u8::try_from((completed * 200 + total) / (2 * total)).unwrap_or(100)
}

/// Tasks whose title (ignoring case) and category repeat an earlier task
pub fn duplicates<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<&'a Task> {
    let mut seen: HashSet<(String, Category)> = HashSet::new();
    tasks
        .into_iter()
        .filter(|t| !seen.insert((t.title.to_lowercase(), t.category)))
        .collect()
}
