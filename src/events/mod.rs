pub mod jsonl;
pub mod publisher;

pub use jsonl::{EventRecord, JsonlEventLog};
pub use publisher::{PublishClient, TaskPublisher};

pub const CHANNEL_CREATED: &str = "tasks.event.created";
pub const CHANNEL_DELETED: &str = "tasks.event.deleted";
pub const CHANNEL_UPDATED: &str = "tasks.event.updated";
