pub mod connection;
pub mod migrations;
pub mod search_repo;
pub mod task_repo;

pub use connection::*;
pub use search_repo::SqliteTaskSearch;
pub use task_repo::SqliteTaskRepo;
