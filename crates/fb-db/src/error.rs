use std::panic::Location;

use error_location::ErrorLocation;
use fb_core::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLx error: {source} {location}")]
    Sqlx {
        source: sqlx::Error,
        location: ErrorLocation,
    },

    #[error("Migration error: {message} {location}")]
    Migration {
        message: String,
        location: ErrorLocation,
    },

    #[error("Database initialization failed: {message} {location}")]
    Initialization {
        message: String,
        location: ErrorLocation,
    },

    #[error("Row decode failed: {message} {location}")]
    RowDecode {
        message: String,
        location: ErrorLocation,
    },

    #[error("{entity} not found: {id} {location}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
        location: ErrorLocation,
    },

    #[error("Cannot delete the default column: {column_id} {location}")]
    DefaultColumnDelete {
        column_id: Uuid,
        location: ErrorLocation,
    },
}

impl From<sqlx::Error> for DbError {
    #[track_caller]
    fn from(source: sqlx::Error) -> Self {
        Self::Sqlx {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<DbError> for StoreError {
    #[track_caller]
    fn from(err: DbError) -> Self {
        StoreError::new(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
