use std::path::PathBuf;

use clap::{Parser, Subcommand};

const VERSION: &str = env!("TODO_SVC_VERSION");

#[derive(Parser)]
#[command(
    name = "todo-svc",
    version = VERSION,
    about = "To-do task management backend",
    after_help = "\
NOTE:
  Data lives in --home, $TODO_HOME, or ./.todo (in that order).
  Run `todo-svc init` before any other command.

EXIT CODES:
  0  Success
  1  Error (validation, not found, storage, search unavailable)

PRIORITY:
  none|low|medium|high, or 0-3. `task create` rejects `none`.

DATES:
  RFC 3339 (2030-01-31T09:00:00Z) or a plain date (2030-01-31, midnight UTC).

EVENTS:
  Successful writes append a best-effort event to <home>/events.jsonl.
  A failed event never fails the write."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the data directory
    Init,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// List published task events
    Events,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task
    Create {
        /// Task description
        description: String,
        #[arg(long)]
        priority: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// Show a task
    Show {
        id: String,
    },
    /// Replace every field of a task
    #[command(after_help = "\
NOTE:
  Full replace: omitted --start/--due clear the date, omitted --done marks the task not done.")]
    Update {
        id: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        priority: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        due: Option<String>,
        /// Mark the task as done
        #[arg(long)]
        done: bool,
    },
    /// Delete a task
    Delete {
        id: String,
    },
    /// Search tasks
    Search {
        /// Description substring
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Filter by completion (true|false)
        #[arg(long)]
        done: Option<bool>,
        #[arg(long, default_value = "0")]
        from: u64,
        /// Page size (0 = default)
        #[arg(long, default_value = "0")]
        size: u64,
    },
}
