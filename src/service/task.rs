use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::breaker::{BreakerConfig, CircuitBreaker, State};
use crate::context::Context;
use crate::error::{ErrorCode, TodoError};
use crate::models::{CreateParams, Dates, Priority, SearchParams, SearchResults, Task};
use crate::validation::Validate;

use super::{TaskNotifier, TaskRepo, TaskSearchRepo};

/// Orchestrates the record store, the search index and change events.
///
/// Only the search path sits behind the circuit breaker. Notifications are
/// sent after a successful write and their failures are logged and counted,
/// never returned.
pub struct TaskService {
    repo: Arc<dyn TaskRepo>,
    search: Arc<dyn TaskSearchRepo>,
    notifier: Arc<dyn TaskNotifier>,
    breaker: CircuitBreaker,
    notification_failures: AtomicU64,
}

impl TaskService {
    pub fn new(
        repo: Arc<dyn TaskRepo>,
        search: Arc<dyn TaskSearchRepo>,
        notifier: Arc<dyn TaskNotifier>,
        breaker: BreakerConfig,
    ) -> Self {
        let breaker = CircuitBreaker::new(breaker).with_state_change_hook(Arc::new(
            |old: State, new: State| {
                tracing::info!(old = %old, new = %new, "state changed");
            },
        ));
        Self {
            repo,
            search,
            notifier,
            breaker,
            notification_failures: AtomicU64::new(0),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Notifications dropped since this service was built.
    pub fn notification_failures(&self) -> u64 {
        self.notification_failures.load(Ordering::Relaxed)
    }

    #[tracing::instrument(name = "Task.By", skip_all)]
    pub async fn by(&self, ctx: &Context, params: &SearchParams) -> Result<SearchResults, TodoError> {
        let Some(call) = self.breaker.try_call(ctx) else {
            return Err(TodoError::unknown("service not ready"));
        };

        let result = self
            .search
            .search(ctx, params)
            .await
            .map_err(|e| TodoError::wrap(e, ErrorCode::Unknown, "search"));

        call.finish(result)
    }

    #[tracing::instrument(name = "Task.Create", skip_all)]
    pub async fn create(&self, ctx: &Context, params: &CreateParams) -> Result<Task, TodoError> {
        params
            .validate()
            .map_err(|e| TodoError::wrap(e, ErrorCode::InvalidArgument, "params.validate"))?;

        let task = self
            .repo
            .create(ctx, params)
            .await
            .map_err(|e| TodoError::wrap_unknown(e, "repo.create"))?;

        // Not transactional: the record stays even if the event is lost.
        let sent = self.notifier.created(ctx, &task).await;
        self.observe_notification("created", &task.id, sent);

        Ok(task)
    }

    #[tracing::instrument(name = "Task.Delete", skip(self, ctx))]
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<(), TodoError> {
        self.repo
            .delete(ctx, id)
            .await
            .map_err(|e| TodoError::wrap_unknown(e, "repo.delete"))?;

        let sent = self.notifier.deleted(ctx, id).await;
        self.observe_notification("deleted", id, sent);

        Ok(())
    }

    #[tracing::instrument(name = "Task.Task", skip(self, ctx))]
    pub async fn task(&self, ctx: &Context, id: &str) -> Result<Task, TodoError> {
        self.repo
            .find(ctx, id)
            .await
            .map_err(|e| TodoError::wrap_unknown(e, "repo.find"))
    }

    /// Replaces every mutable field of task `id`.
    #[tracing::instrument(name = "Task.Update", skip(self, ctx, description, dates))]
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        description: &str,
        priority: Priority,
        dates: &Dates,
        is_done: bool,
    ) -> Result<(), TodoError> {
        self.repo
            .update(ctx, id, description, priority, dates, is_done)
            .await
            .map_err(|e| TodoError::wrap_unknown(e, "repo.update"))?;

        match self.repo.find(ctx, id).await {
            Ok(task) => {
                let sent = self.notifier.updated(ctx, &task).await;
                self.observe_notification("updated", id, sent);
            }
            Err(e) => {
                tracing::debug!(task_id = id, error = %e, "skipping update notification");
            }
        }

        Ok(())
    }

    fn observe_notification(&self, event: &'static str, id: &str, sent: Result<(), TodoError>) {
        if let Err(e) = sent {
            self.notification_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(event, task_id = id, error = %e, "notification dropped");
        }
    }
}
