// Taskboard - to-do list core: reducer, query pipeline, validation and persistence

pub mod app;
pub mod query;
pub mod reducer;
pub mod stats;
pub mod storage;
pub mod task;
pub mod transfer;
pub mod validate;

// Re-export main types for convenience
pub use app::{AppError, AppState};
pub use query::{Filter, SortOrder, View};
pub use reducer::{Action, TaskUpdate, reduce, reduce_at};
pub use stats::Stats;
pub use storage::{MemoryStorage, SqliteStorage, Storage};
pub use task::{Category, Priority, Task, TaskDraft, TaskFactory};
pub use transfer::{Format, TransferError};
pub use validate::{ValidationErrors, ValidationRules, Validator, validate};
