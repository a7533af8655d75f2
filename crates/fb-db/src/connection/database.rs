use crate::{DatabaseConfig, DbError, Result};

use std::panic::Location;
use std::path::Path;

use error_location::ErrorLocation;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub struct Database;

impl Database {
    /// Open the configured SQLite database, creating the file and its
    /// parent directory if missing, with foreign keys on and migrations
    /// applied.
    pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
        let db_path = Path::new(&config.path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DbError::Initialization {
                        message: format!("Failed to create database directory: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::initialize(&pool).await?;
        Ok(pool)
    }

    /// In-memory database; single connection so the data survives the
    /// whole pool lifetime.
    pub async fn connect_in_memory() -> Result<SqlitePool> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::initialize(&pool).await?;
        Ok(pool)
    }

    async fn initialize(pool: &SqlitePool) -> Result<()> {
        sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| DbError::Migration {
                message: format!("Migration failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(())
    }
}
