use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::context::Context;
use crate::error::TodoError;
use crate::models::{SearchParams, SearchResults};
use crate::service::TaskSearchRepo;

use super::connection::Db;
use super::task_repo::{row_to_task, TASK_COLUMNS};

/// Window size used when a query asks for `size == 0`.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Search index over a (possibly separate) copy of the `tasks` table.
#[derive(Clone)]
pub struct SqliteTaskSearch {
    db: Db,
}

impl SqliteTaskSearch {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskSearchRepo for SqliteTaskSearch {
    async fn search(&self, ctx: &Context, params: &SearchParams) -> Result<SearchResults, TodoError> {
        let params = params.clone();
        self.db.call(ctx, move |conn| search_tasks(conn, &params)).await
    }
}

pub fn search_tasks(conn: &Connection, params: &SearchParams) -> Result<SearchResults, TodoError> {
    let (filter, mut args) = if params.is_zero() {
        (String::new(), Vec::new())
    } else {
        build_filter(params)
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM tasks{filter}"),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )?;

    let size = if params.size == 0 { DEFAULT_PAGE_SIZE } else { params.size };
    args.push(Value::Integer(clamp_i64(size)));
    args.push(Value::Integer(clamp_i64(params.from)));

    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks{filter} ORDER BY rowid ASC LIMIT ? OFFSET ?"
    ))?;
    let tasks = stmt
        .query_map(params_from_iter(args.iter()), row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchResults {
        tasks,
        total: total.max(0) as u64,
    })
}

fn build_filter(params: &SearchParams) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut args = Vec::new();

    if let Some(ref description) = params.description {
        clauses.push("description LIKE ? ESCAPE '\\'");
        args.push(Value::Text(format!("%{}%", escape_like(description))));
    }
    if let Some(priority) = params.priority {
        clauses.push("priority = ?");
        args.push(Value::Text(priority.as_str().to_string()));
    }
    if let Some(is_done) = params.is_done {
        clauses.push("done = ?");
        args.push(Value::Integer(i64::from(is_done)));
    }

    (format!(" WHERE {}", clauses.join(" AND ")), args)
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;
    use crate::db::task_repo::{insert_task, update_task};
    use crate::models::{CreateParams, Dates, Priority};

    fn seed(conn: &Connection) {
        let rows = [
            ("a", "buy milk", Priority::Low),
            ("b", "buy bread", Priority::High),
            ("c", "write report", Priority::High),
            ("d", "100% done_ish", Priority::Medium),
        ];
        for (id, description, priority) in rows {
            let p = CreateParams {
                description: description.into(),
                priority,
                dates: Dates::default(),
            };
            insert_task(conn, id, &p).unwrap();
        }
        update_task(conn, "c", "write report", Priority::High, &Dates::default(), true).unwrap();
    }

    #[test]
    fn no_filter_lists_everything() {
        let conn = open_in_memory().unwrap();
        seed(&conn);
        let res = search_tasks(&conn, &SearchParams::default()).unwrap();
        assert_eq!(res.total, 4);
        let ids: Vec<_> = res.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
    }

    #[test]
    fn filters_combine() {
        let conn = open_in_memory().unwrap();
        seed(&conn);

        let res = search_tasks(
            &conn,
            &SearchParams { description: Some("buy".into()), ..SearchParams::default() },
        )
        .unwrap();
        assert_eq!(res.total, 2);

        let res = search_tasks(
            &conn,
            &SearchParams {
                priority: Some(Priority::High),
                is_done: Some(false),
                ..SearchParams::default()
            },
        )
        .unwrap();
        assert_eq!(res.total, 1);
        assert_eq!(res.tasks[0].id, "b");
    }

    #[test]
    fn like_wildcards_are_literal() {
        let conn = open_in_memory().unwrap();
        seed(&conn);
        let res = search_tasks(
            &conn,
            &SearchParams { description: Some("0% d".into()), ..SearchParams::default() },
        )
        .unwrap();
        assert_eq!(res.total, 1);
        assert_eq!(res.tasks[0].id, "d");

        let res = search_tasks(
            &conn,
            &SearchParams { description: Some("_".into()), ..SearchParams::default() },
        )
        .unwrap();
        assert_eq!(res.total, 1);
    }

    #[test]
    fn total_ignores_the_window() {
        let conn = open_in_memory().unwrap();
        seed(&conn);
        let res = search_tasks(&conn, &SearchParams { from: 1, size: 2, ..SearchParams::default() }).unwrap();
        assert_eq!(res.total, 4);
        let ids: Vec<_> = res.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
    }
}
