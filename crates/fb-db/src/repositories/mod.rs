pub mod column_repository;
pub mod project_repository;
pub mod task_repository;

use crate::{DbError, Result};

use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use uuid::Uuid;

// Shared row-decoding helpers. Queries are bound at runtime, so decode
// failures surface as RowDecode errors rather than panics.

#[track_caller]
pub(crate) fn parse_uuid(value: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| DbError::RowDecode {
        message: format!("Invalid UUID in {}: {}", field, e),
        location: ErrorLocation::from(Location::caller()),
    })
}

#[track_caller]
pub(crate) fn parse_optional_uuid(value: Option<&str>, field: &str) -> Result<Option<Uuid>> {
    value.map(|v| parse_uuid(v, field)).transpose()
}

#[track_caller]
pub(crate) fn parse_timestamp(value: i64, field: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(value, 0).ok_or_else(|| DbError::RowDecode {
        message: format!("Invalid timestamp in {}: {}", field, value),
        location: ErrorLocation::from(Location::caller()),
    })
}

pub(crate) fn parse_optional_timestamp(value: Option<i64>) -> Option<DateTime<Utc>> {
    value.and_then(|ts| DateTime::from_timestamp(ts, 0))
}
