use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, bail, eyre};
use std::path::PathBuf;
use taskboard::reducer::{Action, TaskUpdate};
use taskboard::stats::{duplicates, progress};
use taskboard::task::parse_deadline;
use taskboard::transfer::{self, Format};
use taskboard::{
    AppError, AppState, Category, Filter, Priority, SortOrder, SqliteStorage, Task, TaskDraft, ValidationErrors, View,
};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard CLI - a to-do list with filters, search, stats and import/export")]
#[command(version)]
struct Cli {
    /// Directory holding the task database (default: the user data directory)
    #[arg(short, long, env = "TASKBOARD_STORE")]
    store_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,
        /// work, personal, study or health
        #[arg(short, long)]
        category: Option<Category>,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,
    },

    /// List tasks: filter, then search, then sort
    List {
        /// all, active, completed, high, work, personal, study or health
        #[arg(short, long, default_value = "all")]
        filter: String,
        /// Case-insensitive text to look for in title, description and category
        #[arg(short = 'q', long, default_value = "")]
        search: String,
        /// newest, oldest, priority or deadline
        #[arg(long, default_value = "newest")]
        sort: String,
    },

    /// Show one task in full
    Show { id: String },

    /// Mark a task done, or not done again
    Toggle { id: String },

    /// Change fields of a task
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        category: Option<Category>,
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        #[arg(long)]
        clear_deadline: bool,
    },

    /// Delete a task
    Delete { id: String },

    /// Delete every completed task
    ClearCompleted,

    /// Show counts and progress
    Stats,

    /// Write all tasks to a JSON or YAML file
    Export {
        /// Output file (default: tasks_<today>.<format>)
        output: Option<PathBuf>,
        /// json or yaml (default: from the file extension)
        #[arg(long)]
        format: Option<Format>,
    },

    /// Replace all tasks with the contents of a JSON or YAML file
    Import {
        input: PathBuf,
        /// json or yaml (default: from the file extension)
        #[arg(long)]
        format: Option<Format>,
    },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store_path = cli.store_path.unwrap_or_else(default_store_path);
    let today = Local::now().date_naive();

    let storage = SqliteStorage::open(&store_path)?;
    let mut app = AppState::load(storage);

    match cli.command {
        Commands::Add {
            title,
            description,
            priority,
            category,
            deadline,
        } => {
            let draft = TaskDraft {
                title: Some(title.trim().to_string()),
                description: description.map(|d| d.trim().to_string()),
                priority,
                category,
                completed: None,
                deadline,
            };
            match app.add(draft) {
                Ok(id) => println!("{} {}", "Task added".green(), id.dimmed()),
                Err(AppError::Validation(errors)) => {
                    print_invalid(&errors);
                    bail!("Task not added");
                }
                Err(e) => warn_unsaved(e)?,
            }
        }
        Commands::List { filter, search, sort } => {
            app.view = View {
                filter: Filter::from_key(&filter),
                query: search,
                sort: SortOrder::from_key(&sort),
            };
            let visible = app.visible();
            if visible.is_empty() {
                println!("No tasks found");
            }
            for task in visible {
                print_task(task, today);
            }
        }
        Commands::Show { id } => {
            let task = app.find(&id).ok_or_else(|| eyre!("No task with id {}", id))?;
            print_details(task, today);
        }
        Commands::Toggle { id } => {
            require(&app, &id)?;
            app.dispatch(Action::ToggleTask { task_id: id.clone() }).or_else(warn_unsaved)?;
            if let Some(task) = app.find(&id) {
                print_task(task, today);
            }
        }
        Commands::Update {
            id,
            title,
            description,
            priority,
            category,
            deadline,
            clear_deadline,
        } => {
            require(&app, &id)?;
            let deadline = match (deadline, clear_deadline) {
                (_, true) => Some(None),
                (Some(raw), false) => Some(Some(
                    parse_deadline(&raw).ok_or_else(|| eyre!("Invalid deadline: {}", raw))?,
                )),
                (None, false) => None,
            };
            let updates = TaskUpdate {
                title: title.map(|t| t.trim().to_string()),
                description,
                priority,
                category,
                completed: None,
                deadline,
            };
            if updates.is_empty() {
                bail!("Nothing to update");
            }
            match app.update(&id, updates) {
                Ok(()) => {}
                Err(AppError::Validation(errors)) => {
                    print_invalid(&errors);
                    bail!("Task not updated");
                }
                Err(e) => warn_unsaved(e)?,
            }
            if let Some(task) = app.find(&id) {
                print_task(task, today);
            }
        }
        Commands::Delete { id } => {
            require(&app, &id)?;
            app.dispatch(Action::DeleteTask { task_id: id }).or_else(warn_unsaved)?;
            println!("{}", "Task deleted".yellow());
        }
        Commands::ClearCompleted => {
            let before = app.tasks().len();
            app.dispatch(Action::ClearCompleted).or_else(warn_unsaved)?;
            println!("Removed {} completed tasks", before - app.tasks().len());
        }
        Commands::Stats => {
            let stats = app.stats();
            println!("Total:         {}", stats.total);
            println!("Completed:     {}", stats.completed.to_string().green());
            println!("Active:        {}", stats.active);
            println!("High priority: {}", stats.high_priority.to_string().red());
            println!("Progress:      {}%", progress(app.tasks()));

            let dups = duplicates(app.tasks());
            if !dups.is_empty() {
                println!("Duplicates:    {}", dups.len().to_string().yellow());
            }
        }
        Commands::Export { output, format } => {
            let output = output.unwrap_or_else(|| {
                PathBuf::from(transfer::default_export_name(today, format.unwrap_or_default()))
            });
            let format = format.unwrap_or_else(|| Format::from_path(&output));
            transfer::export_to_file(app.tasks(), &output, format)?;
            println!("Exported {} tasks to {}", app.tasks().len(), output.display());
        }
        Commands::Import { input, format } => {
            let format = format.unwrap_or_else(|| Format::from_path(&input));
            let tasks = transfer::import_from_file(&input, format)?;
            match app.replace(tasks) {
                Ok(count) => println!("{} {} tasks", "Imported".green(), count),
                Err(e) => warn_unsaved(e)?,
            }
        }
    }

    Ok(())
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("taskboard"))
        .unwrap_or_else(|| PathBuf::from(".taskboard"))
}

fn require<S: taskboard::Storage>(app: &AppState<S>, id: &str) -> Result<()> {
    if app.find(id).is_none() {
        bail!("No task with id {}", id);
    }
    Ok(())
}

// A failed save is a warning: the change already happened in memory
fn warn_unsaved(error: AppError) -> Result<()> {
    match error {
        AppError::Persistence(message) => {
            eprintln!("{} {}", "warning:".yellow(), message);
            Ok(())
        }
        other => Err(other.into()),
    }
}

fn print_invalid(errors: &ValidationErrors) {
    for (field, message) in errors.iter() {
        println!("{} {}", format!("{}:", field).red(), message);
    }
}

fn print_task(task: &Task, today: NaiveDate) {
    let check = if task.completed { "[x]".green() } else { "[ ]".normal() };
    let title = if task.completed {
        task.title.as_str().dimmed()
    } else {
        task.title.as_str().bold()
    };
    let priority = match task.priority {
        Priority::High => "high".red(),
        Priority::Medium => "medium".yellow(),
        Priority::Low => "low".normal(),
    };
    let due = task
        .deadline_status(today)
        .map(|status| format!(" due {}", status))
        .unwrap_or_default();
    let urgent = if task.is_urgent(today) {
        format!(" {}", "urgent".red().bold())
    } else {
        String::new()
    };

    println!(
        "{} {} ({}, {}){}{}  {}",
        check,
        title,
        priority,
        task.category,
        due,
        urgent,
        task.id.as_str().dimmed()
    );
}

fn print_details(task: &Task, today: NaiveDate) {
    println!("{}", task.title.as_str().bold());
    if !task.description.is_empty() {
        println!("{}", task.description);
    }
    println!("  id:        {}", task.id);
    println!("  priority:  {}", task.priority);
    println!("  category:  {}", task.category);
    println!("  completed: {}", task.completed);
    if let (Some(deadline), Some(status)) = (task.deadline, task.deadline_status(today)) {
        println!("  deadline:  {} ({})", deadline, status);
    }
    println!("  created:   {}", task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!("  updated:   {}", task.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
}
