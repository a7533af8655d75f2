use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {message} {location}")]
    Validation {
        message: String,
        field: Option<String>,
        location: ErrorLocation,
    },

    #[error("{entity} not found: {id} {location}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
        location: ErrorLocation,
    },

    #[error("Invariant violation: {message} {location}")]
    InvariantViolation {
        message: String,
        location: ErrorLocation,
    },
}

pub type Result<T> = StdResult<T, CoreError>;
