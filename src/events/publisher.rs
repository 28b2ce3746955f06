use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::Context;
use crate::error::TodoError;
use crate::models::Task;
use crate::service::TaskNotifier;

use super::{CHANNEL_CREATED, CHANNEL_DELETED, CHANNEL_UPDATED};

/// Transport that puts a JSON payload on a named channel.
#[async_trait]
pub trait PublishClient: Send + Sync {
    async fn publish(&self, ctx: &Context, channel: &str, payload: Value) -> Result<(), TodoError>;
}

/// Maps task changes onto channels of a [`PublishClient`].
pub struct TaskPublisher<C> {
    client: C,
}

impl<C: PublishClient> TaskPublisher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: PublishClient> TaskNotifier for TaskPublisher<C> {
    async fn created(&self, ctx: &Context, task: &Task) -> Result<(), TodoError> {
        let payload = serde_json::to_value(task)?;
        self.client.publish(ctx, CHANNEL_CREATED, payload).await
    }

    async fn deleted(&self, ctx: &Context, id: &str) -> Result<(), TodoError> {
        self.client.publish(ctx, CHANNEL_DELETED, json!(id)).await
    }

    async fn updated(&self, ctx: &Context, task: &Task) -> Result<(), TodoError> {
        let payload = serde_json::to_value(task)?;
        self.client.publish(ctx, CHANNEL_UPDATED, payload).await
    }
}
