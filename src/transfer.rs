// Import and export of the full task collection as JSON or YAML documents

use crate::task::Task;
use chrono::NaiveDate;
use eyre::{Context, Result};
use fs2::FileExt;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Why an import was rejected
///
/// A rejected import never changes the existing collection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("failed to parse {format} document: {message}")]
    Parse { format: Format, message: String },

    #[error("expected a list of tasks, found {found}")]
    NotAList { found: &'static str },

    #[error("record {index} is not a valid task: {message}")]
    InvalidRecord { index: usize, message: String },

    #[error("duplicate task id '{0}'")]
    DuplicateId(String),

    #[error("failed to serialize tasks as {format}: {message}")]
    Serialize { format: Format, message: String },
}

/// Document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// YAML for `.yaml`/`.yml` files, JSON for anything else
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()).map(str::to_lowercase).as_deref() {
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "JSON"),
            Format::Yaml => write!(f, "YAML"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(format!("unknown format '{}' (expected json or yaml)", other)),
        }
    }
}

/// Serialize the whole collection as a human-readable document
pub fn export(tasks: &[Task], format: Format) -> Result<String, TransferError> {
    let serialized = match format {
        Format::Json => serde_json::to_string_pretty(tasks).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::to_string(tasks).map_err(|e| e.to_string()),
    };
    serialized.map_err(|message| TransferError::Serialize { format, message })
}

/// Parse a document into a replacement collection
///
/// The top level must be a list; every element must decode as a task whose
/// `updatedAt` is not before its `createdAt`, and ids must be unique. Any failure rejects the whole document.
pub fn import(text: &str, format: Format) -> Result<Vec<Task>, TransferError> {
    let parsed: Result<Value, String> = match format {
        Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    };
    let value = parsed.map_err(|message| TransferError::Parse { format, message })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(TransferError::NotAList {
                found: describe(&other),
            });
        }
    };

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let task: Task = serde_json::from_value(item).map_err(|e| TransferError::InvalidRecord {
            index,
            message: e.to_string(),
        })?;
        if task.updated_at < task.created_at {
            return Err(TransferError::InvalidRecord {
                index,
                message: "updatedAt is earlier than createdAt".to_string(),
            });
        }
        if !seen.insert(task.id.clone()) {
            return Err(TransferError::DuplicateId(task.id));
        }
        tasks.push(task);
    }

    debug!(count = tasks.len(), %format, "Parsed task document");
    Ok(tasks)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Write an export to `path`, holding an exclusive lock while writing
pub fn export_to_file(tasks: &[Task], path: &Path, format: Format) -> Result<()> {
    let document = export(tasks, format)?;

    let mut file = File::create(path).with_context(|| format!("Failed to create export file {:?}", path))?;
    file.lock_exclusive().context("Failed to acquire file lock")?;

    file.write_all(document.as_bytes())?;
    file.sync_all()?;

    info!(path = ?path, count = tasks.len(), %format, "Exported tasks");
    Ok(())
}

/// Read and import a document from `path`
pub fn import_from_file(path: &Path, format: Format) -> Result<Vec<Task>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read import file {:?}", path))?;
    let tasks = import(&text, format).with_context(|| format!("Rejected import from {:?}", path))?;

    info!(path = ?path, count = tasks.len(), %format, "Read tasks for import");
    Ok(tasks)
}

/// Default export filename for a given day, e.g. `tasks_2030-01-31.json`
pub fn default_export_name(today: NaiveDate, format: Format) -> String {
    format!("tasks_{}.{}", today.format("%Y-%m-%d"), format.extension())
}
