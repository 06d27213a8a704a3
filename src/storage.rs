// Persistence boundary: a small key-value store holding the task collection

use crate::task::Task;
use crate::transfer::{self, Format};
use chrono::Utc;
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Database filename inside the store directory
pub const DB_FILE: &str = "taskboard.db";

/// Key the task collection is stored under
pub const TASKS_KEY: &str = "tasks";

/// Load/save boundary for the task collection
pub trait Storage {
    /// Read the stored collection; an absent collection is an empty one
    fn load(&self) -> Result<Vec<Task>>;

    /// Replace the stored collection
    fn save(&mut self, tasks: &[Task]) -> Result<()>;
}

/// Load the stored collection, degrading to an empty one on any failure
pub fn load_or_empty<S: Storage + ?Sized>(storage: &S) -> Vec<Task> {
    match storage.load() {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!(error = ?e, "Failed to load tasks, starting with an empty list");
            Vec::new()
        }
    }
}

fn decode(raw: &str) -> Result<Vec<Task>> {
    transfer::import(raw, Format::Json).context("Stored tasks are corrupt")
}

fn encode(tasks: &[Task]) -> Result<String> {
    serde_json::to_string(tasks).context("Failed to serialize tasks")
}

/// SQLite-backed key-value storage
pub struct SqliteStorage {
    base_path: PathBuf,
    db: Connection,
}

impl SqliteStorage {
    /// Open or create a store in the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let db_path = base_path.join(DB_FILE);
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let store = Self { base_path, db };
        store.create_schema()?;

        info!(path = ?store.base_path, "Opened task store");
        Ok(store)
    }

    /// Get the directory this store lives in
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    /// Read a raw value
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Write a raw value, replacing any previous one
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

}

impl Storage for SqliteStorage {
    fn load(&self) -> Result<Vec<Task>> {
        match self.get(TASKS_KEY)? {
            Some(raw) => {
                let tasks = decode(&raw)?;
                debug!(count = tasks.len(), "Loaded tasks");
                Ok(tasks)
            }
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let raw = encode(tasks)?;
        self.set(TASKS_KEY, &raw).context("Failed to save tasks")
    }
}

/// In-memory storage holding the serialized collection
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    raw: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already-serialized value, which may be corrupt
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { raw: Some(raw.into()) }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Vec<Task>> {
        self.raw.as_deref().map(decode).unwrap_or_else(|| Ok(Vec::new()))
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        self.raw = Some(encode(tasks)?);
        Ok(())
    }
}
