pub mod task;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::TodoError;
use crate::models::{CreateParams, Dates, Priority, SearchParams, SearchResults, Task};

pub use task::TaskService;

/// Durable, authoritative store of task records.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    async fn create(&self, ctx: &Context, params: &CreateParams) -> Result<Task, TodoError>;
    async fn delete(&self, ctx: &Context, id: &str) -> Result<(), TodoError>;
    async fn find(&self, ctx: &Context, id: &str) -> Result<Task, TodoError>;
    async fn update(
        &self,
        ctx: &Context,
        id: &str,
        description: &str,
        priority: Priority,
        dates: &Dates,
        is_done: bool,
    ) -> Result<(), TodoError>;
}

/// Filtered, paginated queries over a secondary index that may be down.
#[async_trait]
pub trait TaskSearchRepo: Send + Sync {
    async fn search(&self, ctx: &Context, params: &SearchParams) -> Result<SearchResults, TodoError>;
}

/// Downstream change events. Delivery is not guaranteed.
#[async_trait]
pub trait TaskNotifier: Send + Sync {
    async fn created(&self, ctx: &Context, task: &Task) -> Result<(), TodoError>;
    async fn deleted(&self, ctx: &Context, id: &str) -> Result<(), TodoError>;
    async fn updated(&self, ctx: &Context, task: &Task) -> Result<(), TodoError>;
}
