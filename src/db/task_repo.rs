use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use crate::context::Context;
use crate::error::TodoError;
use crate::models::{CreateParams, Dates, Priority, Task};
use crate::service::TaskRepo;

use super::connection::Db;

pub(crate) const TASK_COLUMNS: &str = "id, description, priority, start_date, due_date, done";

/// Record store backed by the `tasks` table.
#[derive(Clone)]
pub struct SqliteTaskRepo {
    db: Db,
}

impl SqliteTaskRepo {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepo for SqliteTaskRepo {
    async fn create(&self, ctx: &Context, params: &CreateParams) -> Result<Task, TodoError> {
        let params = params.clone();
        self.db
            .call(ctx, move |conn| {
                let id = ulid::Ulid::new().to_string();
                insert_task(conn, &id, &params)?;
                get_task_by_id(conn, &id)
            })
            .await
    }

    async fn delete(&self, ctx: &Context, id: &str) -> Result<(), TodoError> {
        let id = id.to_string();
        self.db.call(ctx, move |conn| delete_task(conn, &id)).await
    }

    async fn find(&self, ctx: &Context, id: &str) -> Result<Task, TodoError> {
        let id = id.to_string();
        self.db.call(ctx, move |conn| get_task_by_id(conn, &id)).await
    }

    async fn update(
        &self,
        ctx: &Context,
        id: &str,
        description: &str,
        priority: Priority,
        dates: &Dates,
        is_done: bool,
    ) -> Result<(), TodoError> {
        let id = id.to_string();
        let description = description.to_string();
        let dates = *dates;
        self.db
            .call(ctx, move |conn| {
                update_task(conn, &id, &description, priority, &dates, is_done)
            })
            .await
    }
}

pub fn insert_task(conn: &Connection, id: &str, params: &CreateParams) -> Result<(), TodoError> {
    conn.execute(
        "INSERT INTO tasks (id, description, priority, start_date, due_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            params.description,
            params.priority.as_str(),
            params.dates.start.map(format_time),
            params.dates.due.map(format_time),
        ],
    )?;
    Ok(())
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<Task, TodoError> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        row_to_task,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => TodoError::not_found(id),
        _ => TodoError::from(e),
    })
}

pub fn update_task(
    conn: &Connection,
    id: &str,
    description: &str,
    priority: Priority,
    dates: &Dates,
    is_done: bool,
) -> Result<(), TodoError> {
    let changed = conn.execute(
        "UPDATE tasks SET description = ?1, priority = ?2, start_date = ?3, due_date = ?4,
         done = ?5, updated_at = datetime('now')
         WHERE id = ?6",
        params![
            description,
            priority.as_str(),
            dates.start.map(format_time),
            dates.due.map(format_time),
            is_done,
            id,
        ],
    )?;
    if changed == 0 {
        return Err(TodoError::not_found(id));
    }
    Ok(())
}

pub fn delete_task(conn: &Connection, id: &str) -> Result<(), TodoError> {
    let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(TodoError::not_found(id));
    }
    Ok(())
}

pub(crate) fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_time(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let priority: String = row.get(2)?;
    let priority = Priority::from_name(&priority).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            Box::new(TodoError::unknown(format!("unknown priority value: {priority}"))),
        )
    })?;
    Ok(Task {
        id: row.get(0)?,
        description: row.get(1)?,
        priority,
        dates: Dates {
            start: parse_time(3, row.get(3)?)?,
            due: parse_time(4, row.get(4)?)?,
        },
        is_done: row.get(5)?,
        ..Task::default()
    })
}
