pub mod config;
pub mod connection;
pub mod error;
pub mod repositories;
pub mod store;

pub use config::DatabaseConfig;
pub use connection::database::Database;
pub use error::{DbError, Result};
pub use repositories::column_repository::ColumnRepository;
pub use repositories::project_repository::ProjectRepository;
pub use repositories::task_repository::{TaskFilter, TaskRepository};
pub use store::SqliteBoardStore;

const DEFAULT_DATABASE_FILENAME: &str = "flowboard.db";
