use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PRIORITY_HIGHEST: i32 = 1;
pub const PRIORITY_LOWEST: i32 = 4;
/// New tasks default to the lowest priority.
pub const PRIORITY_DEFAULT: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,

    // Ownership
    pub project_id: Uuid,
    pub column_id: Uuid,
    /// A task with a parent is a subtask. Nesting is one level deep; the
    /// subtask sequence is ordered per parent, outside the column order.
    pub parent_id: Option<Uuid>,
    pub position: i32,

    // Content
    pub title: String,
    pub description: Option<String>,
    pub priority: i32,
    pub due_date: Option<DateTime<Utc>>,

    // Orthogonal to ordering
    pub completed_at: Option<DateTime<Utc>>,
    pub archived: bool,

    // Audit
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(project_id: Uuid, column_id: Uuid, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            column_id,
            parent_id: None,
            position: 0,
            title,
            description: None,
            priority: PRIORITY_DEFAULT,
            due_date: None,
            completed_at: None,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// A subtask inherits its parent's column and priority.
    pub fn new_subtask(parent: &Task, title: String) -> Self {
        let mut task = Self::new(parent.project_id, parent.column_id, title);
        task.parent_id = Some(parent.id);
        task.priority = parent.priority;
        task
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Partial content update for a task. Ordering fields are never patched
/// here; moves go through the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<i32>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub archived: Option<bool>,
}
