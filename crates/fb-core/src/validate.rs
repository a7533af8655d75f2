//! Input validation applied before any mutation touches the model.

use crate::models::task::{PRIORITY_HIGHEST, PRIORITY_LOWEST};
use crate::{CoreError, Result};

use std::panic::Location;

use error_location::ErrorLocation;

const TITLE_MAX_LENGTH: usize = 500;
const COLUMN_NAME_MAX_LENGTH: usize = 120;

/// Validates mutation inputs from the UI layer.
pub struct MutationValidator;

impl MutationValidator {
    #[track_caller]
    pub fn validate_title(title: &str) -> Result<()> {
        Self::validate_string(title, "title", TITLE_MAX_LENGTH)
    }

    #[track_caller]
    pub fn validate_column_name(name: &str) -> Result<()> {
        Self::validate_string(name, "name", COLUMN_NAME_MAX_LENGTH)
    }

    #[track_caller]
    pub fn validate_color(color: &str) -> Result<()> {
        if color.is_empty() {
            return Err(CoreError::Validation {
                message: "color cannot be empty".to_string(),
                field: Some("color".to_string()),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    #[track_caller]
    pub fn validate_priority(priority: i32) -> Result<()> {
        if !(PRIORITY_HIGHEST..=PRIORITY_LOWEST).contains(&priority) {
            return Err(CoreError::Validation {
                message: format!(
                    "priority must be between {} and {}, got {}",
                    PRIORITY_HIGHEST, PRIORITY_LOWEST, priority
                ),
                field: Some("priority".to_string()),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    #[track_caller]
    fn validate_string(value: &str, field_name: &str, max_length: usize) -> Result<()> {
        if value.trim().is_empty() {
            return Err(CoreError::Validation {
                message: format!("{} cannot be empty", field_name),
                field: Some(field_name.to_string()),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if value.len() > max_length {
            return Err(CoreError::Validation {
                message: format!("{} must not exceed {} characters", field_name, max_length),
                field: Some(field_name.to_string()),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}
