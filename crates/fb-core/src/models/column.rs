use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Color assigned to columns created without an explicit one.
pub const DEFAULT_COLUMN_COLOR: &str = "#94a3b8";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: Uuid,
    pub project_id: Uuid,

    pub name: String,
    pub color: String,
    pub sort_order: i32,

    /// Exactly one column per project. Receives tasks when their column
    /// is deleted; cannot itself be deleted.
    pub is_default: bool,
    /// At most one column per project. Receives tasks on completion.
    pub is_done: bool,

    // Audit
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Column {
    pub fn new(project_id: Uuid, name: String, color: String, sort_order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            name,
            color,
            sort_order,
            is_default: false,
            is_done: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_default(project_id: Uuid, name: String, color: String, sort_order: i32) -> Self {
        let mut column = Self::new(project_id, name, color, sort_order);
        column.is_default = true;
        column
    }

    pub fn new_done(project_id: Uuid, name: String, color: String, sort_order: i32) -> Self {
        let mut column = Self::new(project_id, name, color, sort_order);
        column.is_done = true;
        column
    }
}
