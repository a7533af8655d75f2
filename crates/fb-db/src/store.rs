//! SQLite-backed persistence collaborator.
//!
//! Implements the `BoardStore` contract on top of the repositories.
//! Multi-row rewrites (order rewrites, the relocate-then-delete compound,
//! sibling renormalization) each run in one transaction, so a failure
//! leaves persisted positions untouched and the controller's rollback
//! keeps both sides consistent.

use crate::{ColumnRepository, DbError, ProjectRepository, Result, TaskRepository};

use std::panic::Location;

use async_trait::async_trait;
use chrono::Utc;
use error_location::ErrorLocation;
use fb_core::{BoardStore, Column, Project, StoreError, StoreResult, Task};
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct SqliteBoardStore {
    pool: SqlitePool,
}

impl SqliteBoardStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_board_inner(
        &self,
        project_id: Uuid,
    ) -> Result<(Project, Vec<Column>, Vec<Task>)> {
        let project = ProjectRepository::find_by_id(&self.pool, project_id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "project",
                id: project_id,
                location: ErrorLocation::from(Location::caller()),
            })?;
        let columns = ColumnRepository::find_by_project(&self.pool, project_id).await?;
        let tasks = TaskRepository::find_by_project(&self.pool, project_id).await?;
        Ok((project, columns, tasks))
    }

    async fn move_task_inner(&self, task_id: Uuid, column_id: Uuid, position: i32) -> Result<Task> {
        let mut tx = self.pool.begin().await?;

        let column = ColumnRepository::find_by_id(&mut *tx, column_id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "column",
                id: column_id,
                location: ErrorLocation::from(Location::caller()),
            })?;

        TaskRepository::set_position(&mut *tx, task_id, column_id, position).await?;
        // Landing in the done column stamps completion; anywhere else
        // clears it.
        let completed_at = if column.is_done { Some(Utc::now()) } else { None };
        TaskRepository::set_completed(&mut *tx, task_id, completed_at).await?;

        let task = TaskRepository::find_by_id(&mut *tx, task_id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "task",
                id: task_id,
                location: ErrorLocation::from(Location::caller()),
            })?;

        tx.commit().await?;
        Ok(task)
    }

    async fn set_column_task_order_inner(
        &self,
        column_id: Uuid,
        ordered_task_ids: &[Uuid],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (index, task_id) in ordered_task_ids.iter().enumerate() {
            TaskRepository::set_position(&mut *tx, *task_id, column_id, index as i32).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_project_column_order_inner(
        &self,
        ordered_column_ids: &[Uuid],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (index, column_id) in ordered_column_ids.iter().enumerate() {
            ColumnRepository::set_sort_order(&mut *tx, *column_id, index as i32).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_column_inner(&self, column_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let column = ColumnRepository::find_by_id(&mut *tx, column_id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "column",
                id: column_id,
                location: ErrorLocation::from(Location::caller()),
            })?;
        if column.is_default {
            return Err(DbError::DefaultColumnDelete {
                column_id,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let default = ColumnRepository::find_default(&mut *tx, column.project_id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "default column",
                id: column.project_id,
                location: ErrorLocation::from(Location::caller()),
            })?;

        // Append the column's remaining tasks to the default column,
        // keeping their relative order.
        let mut next = TaskRepository::find_max_position(&mut *tx, default.id, None).await? + 1;
        let tasks = TaskRepository::find_by_column(&mut *tx, column_id).await?;
        for task in tasks {
            TaskRepository::set_position(&mut *tx, task.id, default.id, next).await?;
            next += 1;
        }
        // Subtasks follow their parents; only their column back-reference
        // needs re-homing.
        sqlx::query(
            r#"UPDATE tasks SET column_id = ? WHERE column_id = ? AND parent_id IS NOT NULL"#,
        )
        .bind(default.id.to_string())
        .bind(column_id.to_string())
        .execute(&mut *tx)
        .await?;

        ColumnRepository::delete(&mut *tx, column_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_task_inner(&self, task_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let task = TaskRepository::find_by_id(&mut *tx, task_id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "task",
                id: task_id,
                location: ErrorLocation::from(Location::caller()),
            })?;
        TaskRepository::delete(&mut *tx, task_id).await?;

        // Renormalize the surviving siblings to dense positions.
        let siblings = match task.parent_id {
            None => TaskRepository::find_by_column(&mut *tx, task.column_id).await?,
            Some(parent_id) => TaskRepository::find_children(&mut *tx, parent_id).await?,
        };
        for (index, sibling) in siblings.iter().enumerate() {
            TaskRepository::set_position(&mut *tx, sibling.id, sibling.column_id, index as i32)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl BoardStore for SqliteBoardStore {
    async fn fetch_board(
        &self,
        project_id: Uuid,
    ) -> StoreResult<(Project, Vec<Column>, Vec<Task>)> {
        self.fetch_board_inner(project_id).await.map_err(StoreError::from)
    }

    async fn move_task(&self, task_id: Uuid, column_id: Uuid, position: i32) -> StoreResult<Task> {
        self.move_task_inner(task_id, column_id, position)
            .await
            .map_err(StoreError::from)
    }

    async fn set_column_task_order(
        &self,
        column_id: Uuid,
        ordered_task_ids: &[Uuid],
    ) -> StoreResult<()> {
        self.set_column_task_order_inner(column_id, ordered_task_ids)
            .await
            .map_err(StoreError::from)
    }

    async fn set_project_column_order(
        &self,
        _project_id: Uuid,
        ordered_column_ids: &[Uuid],
    ) -> StoreResult<()> {
        self.set_project_column_order_inner(ordered_column_ids)
            .await
            .map_err(StoreError::from)
    }

    async fn create_column(&self, column: &Column) -> StoreResult<()> {
        ColumnRepository::create(&self.pool, column)
            .await
            .map_err(StoreError::from)
    }

    async fn update_column(&self, column: &Column) -> StoreResult<()> {
        ColumnRepository::update(&self.pool, column)
            .await
            .map_err(StoreError::from)
    }

    async fn delete_column(&self, column_id: Uuid) -> StoreResult<()> {
        self.delete_column_inner(column_id).await.map_err(StoreError::from)
    }

    async fn create_task(&self, task: &Task) -> StoreResult<()> {
        TaskRepository::create(&self.pool, task)
            .await
            .map_err(StoreError::from)
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        TaskRepository::update(&self.pool, task)
            .await
            .map_err(StoreError::from)
    }

    async fn delete_task(&self, task_id: Uuid) -> StoreResult<()> {
        self.delete_task_inner(task_id).await.map_err(StoreError::from)
    }
}
