use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::context::Context;
use crate::error::{ErrorCode, TodoError};

use super::migrations;

pub const DB_FILE: &str = "todo.db";

/// Path to the database inside the data directory.
pub fn db_path(home: &Path) -> PathBuf {
    home.join(DB_FILE)
}

/// Open an existing database. Fails if `init` has not run for `home`.
pub fn open_db(home: &Path) -> Result<Connection, TodoError> {
    let path = db_path(home);
    if !path.exists() {
        return Err(TodoError::unknown(format!(
            "todo-svc is not initialized at {}. Run `todo-svc init` first.",
            home.display()
        )));
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Create the data directory and database, then run migrations.
pub fn init_db(home: &Path) -> Result<PathBuf, TodoError> {
    fs::create_dir_all(home)?;
    let path = db_path(home);
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(path)
}

/// In-memory database with the schema applied.
pub fn open_in_memory() -> Result<Connection, TodoError> {
    let conn = Connection::open_in_memory()?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<(), TodoError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// A connection shared between async callers. Queries run on the blocking
/// pool and are abandoned if the caller's context ends first. Work still
/// queued for the connection when that happens is skipped; work already
/// running finishes and its result is dropped.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub async fn call<T, F>(&self, ctx: &Context, f: F) -> Result<T, TodoError>
    where
        F: FnOnce(&Connection) -> Result<T, TodoError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let queued = ctx.clone();
        ctx.run(async move {
            tokio::task::spawn_blocking(move || {
                let guard = conn.lock().unwrap_or_else(|poison| poison.into_inner());
                queued.err()?;
                f(&guard)
            })
            .await
            .map_err(|e| TodoError::wrap(e, ErrorCode::Unknown, "spawn_blocking"))?
        })
        .await
    }
}
