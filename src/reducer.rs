// Pure state transitions over the task collection

use crate::task::{Category, Priority, Task};
use chrono::{DateTime, NaiveDate, Utc};

/// Field changes applied by [`Action::UpdateTask`]
///
/// `None` leaves the field untouched. `id` and `created_at` cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub completed: Option<bool>,
    /// `Some(None)` clears the deadline
    pub deadline: Option<Option<NaiveDate>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }

    fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
    }
}

/// Intent raised against the task collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Append a task built by the factory
    AddTask(Task),
    UpdateTask { task_id: String, updates: TaskUpdate },
    DeleteTask { task_id: String },
    /// Flip `completed`
    ToggleTask { task_id: String },
    /// Remove every completed task
    ClearCompleted,
}

impl Action {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Action::AddTask(_) => "add_task",
            Action::UpdateTask { .. } => "update_task",
            Action::DeleteTask { .. } => "delete_task",
            Action::ToggleTask { .. } => "toggle_task",
            Action::ClearCompleted => "clear_completed",
        }
    }
}

/// Compute the collection that results from applying `action` to `tasks`
///
/// Actions that name an id not present in `tasks` leave it unchanged.
pub fn reduce(tasks: &[Task], action: Action) -> Vec<Task> {
    reduce_at(tasks, action, Utc::now())
}

/// [`reduce`] with an explicit clock reading for refreshed `updated_at` values
pub fn reduce_at(tasks: &[Task], action: Action, now: DateTime<Utc>) -> Vec<Task> {
    match action {
        Action::AddTask(task) => {
            // Ids stay unique even if a caller re-adds an existing task
            if tasks.iter().any(|t| t.id == task.id) {
                return tasks.to_vec();
            }
            let mut next = Vec::with_capacity(tasks.len() + 1);
            next.extend_from_slice(tasks);
            next.push(task);
            next
        }
        Action::UpdateTask { task_id, updates } => map_matching(tasks, &task_id, |task| {
            updates.apply_to(task);
            touch(task, now);
        }),
        Action::DeleteTask { task_id } => tasks.iter().filter(|t| t.id != task_id).cloned().collect(),
        Action::ToggleTask { task_id } => map_matching(tasks, &task_id, |task| {
            task.completed = !task.completed;
            touch(task, now);
        }),
        Action::ClearCompleted => tasks.iter().filter(|t| !t.completed).cloned().collect(),
    }
}

fn map_matching(tasks: &[Task], task_id: &str, mut mutate: impl FnMut(&mut Task)) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| {
            let mut task = t.clone();
            if task.id == task_id {
                mutate(&mut task);
            }
            task
        })
        .collect()
}

// updated_at never moves backwards, even if the clock does
fn touch(task: &mut Task, now: DateTime<Utc>) {
    task.updated_at = task.updated_at.max(now);
}
