// Application state: owns the collection and routes intents through the reducer

use crate::query::{self, View};
use crate::reducer::{Action, TaskUpdate, reduce};
use crate::stats::{self, Stats};
use crate::storage::{Storage, load_or_empty};
use crate::task::{Task, TaskDraft, TaskFactory};
use crate::transfer::{self, Format, TransferError};
use crate::validate::{ValidationErrors, Validator};
use thiserror::Error;
use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

/// Errors surfaced to the front end
#[derive(Debug, Error)]
pub enum AppError {
    /// The candidate was rejected; nothing was created
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The import was rejected; the collection is unchanged
    #[error(transparent)]
    Import(#[from] TransferError),

    /// The change is applied in memory but could not be saved
    #[error("changes kept in memory but not saved: {0}")]
    Persistence(String),
}

/// Owned application state
///
/// Intents go in through [`AppState::dispatch`]; every reduction is followed
/// by a save. A failed save leaves the in-memory collection authoritative.
pub struct AppState<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
    factory: TaskFactory,
    validator: Validator,
    /// Current filter, search query and sort order
    pub view: View,
}

impl<S: Storage> AppState<S> {
    /// Start from whatever `storage` holds, or from an empty list
    pub fn load(storage: S) -> Self {
        let tasks = load_or_empty(&storage);
        info!(count = tasks.len(), "Loaded task list");
        Self {
            storage,
            tasks,
            factory: TaskFactory::default(),
            validator: Validator::default(),
            view: View::default(),
        }
    }

    pub fn with_factory(mut self, factory: TaskFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn find(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Apply an intent, then persist
    pub fn dispatch(&mut self, action: Action) -> Result<(), AppError> {
        let kind = action.kind();
        self.tasks = reduce(&self.tasks, action);
        debug!(action = kind, count = self.tasks.len(), "Applied action");
        self.persist()
    }

    /// Validate `draft`, build a task from it and add it
    ///
    /// Returns the new id. On a save failure the task is still in memory.
    pub fn add(&mut self, draft: TaskDraft) -> Result<String, AppError> {
        self.validator.validate(&draft)?;

        let task = self.factory.create(draft);
        let id = task.id.clone();
        self.dispatch(Action::AddTask(task))?;
        Ok(id)
    }

    /// Validate the changed fields of `updates`, then apply them to `task_id`
    pub fn update(&mut self, task_id: &str, updates: TaskUpdate) -> Result<(), AppError> {
        self.update_on(task_id, updates, Local::now().date_naive())
    }

    /// [`AppState::update`] with `today` as the first acceptable deadline
    pub fn update_on(&mut self, task_id: &str, updates: TaskUpdate, today: NaiveDate) -> Result<(), AppError> {
        self.validator.validate_update_on(&updates, today)?;

        self.dispatch(Action::UpdateTask {
            task_id: task_id.to_string(),
            updates,
        })
    }

    /// Tasks to display: filter, then search, then sort
    pub fn visible(&self) -> Vec<&Task> {
        query::visible(&self.tasks, &self.view)
    }

    /// Counts over the whole collection
    pub fn stats(&self) -> Stats {
        stats::stats(&self.tasks)
    }

    pub fn export(&self, format: Format) -> Result<String, TransferError> {
        transfer::export(&self.tasks, format)
    }

    /// Replace the collection with the tasks in `text`
    ///
    /// Returns how many tasks were imported. A rejected document leaves the
    /// collection untouched.
    pub fn import(&mut self, text: &str, format: Format) -> Result<usize, AppError> {
        let tasks = transfer::import(text, format).inspect_err(|e| {
            warn!(error = %e, "Rejected import");
        })?;
        self.replace(tasks)
    }

    /// Replace the collection with an already-imported one
    ///
    /// `tasks` is expected to come from [`transfer::import`] or
    /// [`transfer::import_from_file`], which enforce unique ids.
    pub fn replace(&mut self, tasks: Vec<Task>) -> Result<usize, AppError> {
        let count = tasks.len();
        self.tasks = tasks;
        info!(count, "Replaced task list");
        self.persist()?;
        Ok(count)
    }

    fn persist(&mut self) -> Result<(), AppError> {
        match self.storage.save(&self.tasks) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = ?e, "Failed to save tasks, keeping in-memory state");
                Err(AppError::Persistence(format!("{:#}", e)))
            }
        }
    }
}
