pub mod commands;
pub mod events;
pub mod init;
pub mod task;

pub use commands::*;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::config::Config;
use crate::db::{self, Db, SqliteTaskRepo, SqliteTaskSearch};
use crate::error::{FieldErrors, TodoError};
use crate::events::{jsonl::EVENTS_FILE, JsonlEventLog, TaskPublisher};
use crate::models::Priority;
use crate::output;
use crate::service::TaskService;

pub fn events_path(home: &Path) -> PathBuf {
    home.join(EVENTS_FILE)
}

/// Wires the SQLite record store, a second connection acting as the search
/// index, and the JSON-lines event log into a service.
pub fn open_service(home: &Path, config: &Config) -> Result<TaskService, TodoError> {
    let repo = SqliteTaskRepo::new(Db::new(db::open_db(home)?));
    let search = SqliteTaskSearch::new(Db::new(db::open_db(home)?));
    let notifier = TaskPublisher::new(JsonlEventLog::new(events_path(home)));
    Ok(TaskService::new(
        Arc::new(repo),
        Arc::new(search),
        Arc::new(notifier),
        config.breaker_config(),
    ))
}

/// Prints the not-initialized error and returns the exit code when `init`
/// has not been run for `home`.
pub fn require_init(home: &Path, json_output: bool) -> Option<i32> {
    if db::db_path(home).exists() {
        return None;
    }
    if json_output {
        print_json(&output::json::not_initialized(home));
    } else {
        eprintln!("Error: not initialized at {}. Run `todo-svc init` first.", home.display());
    }
    Some(1)
}

pub fn report_error(op: &str, err: &TodoError, json_output: bool) -> i32 {
    tracing::debug!(op, error = %err, "command failed");
    if json_output {
        print_json(&output::json::error(op, err));
    } else {
        output::text::print_error(op, err);
    }
    1
}

pub(crate) fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

fn field_error(field: &str, err: TodoError) -> TodoError {
    let message = err.message.clone();
    let mut fields = FieldErrors::new();
    fields.insert(field.to_string(), err);
    TodoError::invalid_argument(message).with_validations(fields)
}

pub fn parse_priority(raw: &str) -> Result<Priority, TodoError> {
    raw.parse().map_err(|e| field_error("priority", e))
}

/// RFC 3339, or `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, TodoError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(t.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Some(Utc.from_utc_datetime(&naive)))
        .ok_or_else(|| field_error(field, TodoError::invalid_argument(format!("invalid date: {raw}"))))
}
