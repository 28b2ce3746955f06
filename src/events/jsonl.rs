use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::context::Context;
use crate::error::{ErrorCode, TodoError};

use super::publisher::PublishClient;

pub const EVENTS_FILE: &str = "events.jsonl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub channel: String,
    pub payload: Value,
    pub published_at: DateTime<Utc>,
}

/// Append-only event log, one JSON record per line.
pub struct JsonlEventLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Every record in the log, oldest first. A missing log reads as empty.
    /// Lines that do not parse (a torn append) are skipped with a warning.
    pub async fn read_all(&self) -> Result<Vec<EventRecord>, TodoError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TodoError::wrap(e, ErrorCode::Unknown, "events.read")),
        };
        let records: Vec<EventRecord> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(idx, line)| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), line = idx + 1, error = %e, "skipping malformed event");
                    None
                }
            })
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl PublishClient for JsonlEventLog {
    async fn publish(&self, ctx: &Context, channel: &str, payload: Value) -> Result<(), TodoError> {
        let record = EventRecord {
            channel: channel.to_string(),
            payload,
            published_at: Utc::now(),
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        ctx.run(async {
            let _guard = self.write_lock.lock().await;
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| TodoError::wrap(e, ErrorCode::Unknown, "events.open"))?;
            file.write_all(&line)
                .await
                .map_err(|e| TodoError::wrap(e, ErrorCode::Unknown, "events.write"))?;
            file.flush()
                .await
                .map_err(|e| TodoError::wrap(e, ErrorCode::Unknown, "events.write"))
        })
        .await
    }
}
