use serde::{Deserialize, Serialize};

use super::task::{Dates, Priority, Task};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateParams {
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub dates: Dates,
}

impl CreateParams {
    /// The task these params describe, without an identifier.
    pub fn to_task(&self) -> Task {
        Task {
            description: self.description.clone(),
            priority: self.priority,
            dates: self.dates,
            ..Task::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub is_done: Option<bool>,
    #[serde(default)]
    pub from: u64,
    #[serde(default)]
    pub size: u64,
}

impl SearchParams {
    /// True when no filter is set. Pagination does not count as a filter.
    pub fn is_zero(&self) -> bool {
        self.description.is_none() && self.priority.is_none() && self.is_done.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub tasks: Vec<Task>,
    pub total: u64,
}
