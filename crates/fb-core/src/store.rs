//! Persistence collaborator contract.
//!
//! The board model is persistence-agnostic: anything that can satisfy
//! this trait can back a [`crate::sync::SyncController`]. The sync
//! controller treats every store failure uniformly (roll back, notify),
//! so the error type is an opaque message carrier rather than a taxonomy.

use crate::models::column::Column;
use crate::models::project::Project;
use crate::models::task::Task;

use std::panic::Location;

use async_trait::async_trait;
use error_location::ErrorLocation;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
#[error("Store error: {message} {location}")]
pub struct StoreError {
    pub message: String,
    pub location: ErrorLocation,
}

impl StoreError {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Everything needed to hydrate one project's board.
    async fn fetch_board(&self, project_id: Uuid)
    -> StoreResult<(Project, Vec<Column>, Vec<Task>)>;

    /// Re-home one task and set its position. The store stamps or clears
    /// `completed_at` according to the target column's done flag.
    async fn move_task(&self, task_id: Uuid, column_id: Uuid, position: i32) -> StoreResult<Task>;

    /// Rewrite every listed task's position (and column) to match the
    /// given dense order.
    async fn set_column_task_order(
        &self,
        column_id: Uuid,
        ordered_task_ids: &[Uuid],
    ) -> StoreResult<()>;

    /// Rewrite every column's sort order to match the given sequence.
    async fn set_project_column_order(
        &self,
        project_id: Uuid,
        ordered_column_ids: &[Uuid],
    ) -> StoreResult<()>;

    async fn create_column(&self, column: &Column) -> StoreResult<()>;

    async fn update_column(&self, column: &Column) -> StoreResult<()>;

    /// Relocate any remaining tasks to the project's default column and
    /// delete the column, in one transaction. Fails for the default
    /// column.
    async fn delete_column(&self, column_id: Uuid) -> StoreResult<()>;

    async fn create_task(&self, task: &Task) -> StoreResult<()>;

    async fn update_task(&self, task: &Task) -> StoreResult<()>;

    /// Delete a task (subtasks cascade) and renormalize sibling
    /// positions, in one transaction.
    async fn delete_task(&self, task_id: Uuid) -> StoreResult<()>;
}
