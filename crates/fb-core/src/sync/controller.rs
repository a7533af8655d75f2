//! Optimistic sync controller.
//!
//! Bridges the in-memory board and the persistence collaborator: every
//! operation mutates the local model first, then issues the matching
//! store calls. On any store failure the pre-operation snapshot is
//! restored and a notice is recorded; nothing is retried automatically.
//!
//! Operations go through `&mut self`, so persistence calls for one board
//! are fully serialized: a later-issued call can never overwrite an
//! earlier one's ordering writes.

use crate::board::{BoardSnapshot, BoardState, MoveDelta};
use crate::error::CoreError;
use crate::models::column::{Column, DEFAULT_COLUMN_COLOR};
use crate::models::task::{Task, TaskPatch};
use crate::planner::MovePlan;
use crate::store::{BoardStore, StoreError};
use crate::sync::notice::{OpPhase, SyncNotice};
use crate::validate::MutationValidator;

use std::collections::VecDeque;
use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Persistence failed, board rolled back: {source}")]
    Store {
        #[source]
        source: StoreError,
    },
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// What an executed plan actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedPlan {
    None,
    Task(MoveDelta),
    Columns(Vec<Uuid>),
}

/// In-flight drag gesture: the pre-gesture snapshot plus the columns the
/// previews have touched. Commit persists against this snapshot so a
/// failing commit reverts the whole gesture, previews included.
#[derive(Debug)]
struct GestureState {
    task_id: Uuid,
    snapshot: BoardSnapshot,
    touched: Vec<Uuid>,
}

pub struct SyncController<S> {
    store: S,
    board: BoardState,
    phase: OpPhase,
    notices: VecDeque<SyncNotice>,
    gesture: Option<GestureState>,
}

impl<S: BoardStore> SyncController<S> {
    pub fn new(store: S, board: BoardState) -> Self {
        Self {
            store,
            board,
            phase: OpPhase::Idle,
            notices: VecDeque::new(),
            gesture: None,
        }
    }

    /// Fetch and hydrate one project's board from the store.
    pub async fn load(store: S, project_id: Uuid) -> SyncResult<Self> {
        let (project, columns, tasks) = store
            .fetch_board(project_id)
            .await
            .map_err(|source| SyncError::Store { source })?;
        let board = BoardState::hydrate(project, columns, tasks)?;
        Ok(Self::new(store, board))
    }

    /// The board is an explicit, inspectable value: the UI re-reads it
    /// after every applied operation.
    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn phase(&self) -> OpPhase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notices(&self) -> &VecDeque<SyncNotice> {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<SyncNotice> {
        self.notices.drain(..).collect()
    }

    // ---- Gestures --------------------------------------------------- //

    /// Apply a preview move locally, with no persistence call. The first
    /// preview of a gesture captures the rollback snapshot; the commit
    /// on release persists (or reverts) everything at once.
    pub fn preview(&mut self, plan: &MovePlan) -> SyncResult<AppliedPlan> {
        let MovePlan::TaskMove {
            task_id,
            target_column,
            target_index,
        } = *plan
        else {
            return Ok(AppliedPlan::None);
        };
        let pre = self.board.snapshot();
        let delta = self.board.apply_move(task_id, target_column, target_index)?;
        let gesture = self.gesture.get_or_insert_with(|| GestureState {
            task_id,
            snapshot: pre,
            touched: Vec::new(),
        });
        for column_id in delta.changed_columns() {
            if !gesture.touched.contains(&column_id) {
                gesture.touched.push(column_id);
            }
        }
        Ok(AppliedPlan::Task(delta))
    }

    /// Apply and persist a planner plan. A `NoOp` release with an active
    /// preview commits the previewed state as final.
    pub async fn execute(&mut self, plan: MovePlan) -> SyncResult<AppliedPlan> {
        match plan {
            MovePlan::TaskMove {
                task_id,
                target_column,
                target_index,
            } => self
                .move_task(task_id, target_column, target_index)
                .await
                .map(AppliedPlan::Task),
            MovePlan::ColumnReorder { ordered_columns } => {
                self.reorder_columns(&ordered_columns).await?;
                Ok(AppliedPlan::Columns(ordered_columns))
            }
            MovePlan::NoOp => match self.commit_gesture().await? {
                Some(delta) => Ok(AppliedPlan::Task(delta)),
                None => Ok(AppliedPlan::None),
            },
        }
    }

    async fn commit_gesture(&mut self) -> SyncResult<Option<MoveDelta>> {
        let Some(gesture) = self.gesture.take() else {
            return Ok(None);
        };
        if gesture.touched.is_empty() {
            return Ok(None);
        }
        let task_id = gesture.task_id;
        let Some((column_id, index)) = self.board.task_position(task_id) else {
            self.board.restore(gesture.snapshot);
            return Err(SyncError::Core(CoreError::NotFound {
                entity: "task",
                id: task_id,
                location: ErrorLocation::from(Location::caller()),
            }));
        };
        self.gesture = Some(gesture);
        self.move_task(task_id, column_id, index).await.map(Some)
    }

    // ---- Ordering operations ---------------------------------------- //

    /// Move a task to `target_column` at `target_index` and persist the
    /// resulting order of every affected column. A self-target move
    /// without a pending preview is a no-op: no mutation, no call.
    pub async fn move_task(
        &mut self,
        task_id: Uuid,
        target_column: Uuid,
        target_index: usize,
    ) -> SyncResult<MoveDelta> {
        debug!(
            "move task {} -> column {} index {}",
            task_id, target_column, target_index
        );

        let gesture = self.gesture.take();
        let previewed = gesture.is_some();
        let (snapshot, prior_touched) = match gesture {
            Some(g) => (g.snapshot, g.touched),
            None => (self.board.snapshot(), Vec::new()),
        };

        self.phase = OpPhase::Applying;
        let delta = match self.board.apply_move(task_id, target_column, target_index) {
            Ok(delta) => delta,
            Err(err) => {
                if previewed {
                    self.board.restore(snapshot);
                }
                self.phase = OpPhase::Idle;
                return Err(SyncError::Core(err));
            }
        };

        if !delta.moved && !previewed {
            self.phase = OpPhase::Committed;
            return Ok(delta);
        }

        let mut columns = prior_touched;
        for column_id in delta.changed_columns() {
            if !columns.contains(&column_id) {
                columns.push(column_id);
            }
        }
        if columns.is_empty() {
            columns.push(delta.target_column);
        }

        self.phase = OpPhase::Persisting;
        match self.persist_task_move(task_id, &columns).await {
            Ok(()) => {
                self.phase = OpPhase::Committed;
                Ok(delta)
            }
            Err(source) => Err(self.roll_back("move task", snapshot, source)),
        }
    }

    /// Rewrite the column order and persist it. Passing the current
    /// order is a no-op with no persistence call.
    pub async fn reorder_columns(&mut self, ordered: &[Uuid]) -> SyncResult<()> {
        if ordered == self.board.ordered_column_ids() {
            return Ok(());
        }
        debug!("reorder columns for project {}", self.board.project().id);

        let snapshot = self.board.snapshot();
        self.phase = OpPhase::Applying;
        if let Err(err) = self.board.apply_column_reorder(ordered) {
            self.phase = OpPhase::Idle;
            return Err(err.into());
        }

        self.phase = OpPhase::Persisting;
        match self
            .store
            .set_project_column_order(self.board.project().id, ordered)
            .await
        {
            Ok(()) => {
                self.phase = OpPhase::Committed;
                Ok(())
            }
            Err(source) => Err(self.roll_back("reorder columns", snapshot, source)),
        }
    }

    // ---- Column lifecycle ------------------------------------------- //

    /// Create a column appended at the end of the board.
    pub async fn create_column(&mut self, name: &str, color: Option<String>) -> SyncResult<Column> {
        MutationValidator::validate_column_name(name)?;
        let color = color.unwrap_or_else(|| DEFAULT_COLUMN_COLOR.to_string());
        MutationValidator::validate_color(&color)?;

        let column = Column::new(
            self.board.project().id,
            name.to_string(),
            color,
            self.board.column_count() as i32,
        );

        let snapshot = self.board.snapshot();
        self.phase = OpPhase::Applying;
        if let Err(err) = self.board.insert_column(column.clone()) {
            self.phase = OpPhase::Idle;
            return Err(err.into());
        }

        self.phase = OpPhase::Persisting;
        match self.store.create_column(&column).await {
            Ok(()) => {
                self.phase = OpPhase::Committed;
                Ok(column)
            }
            Err(source) => Err(self.roll_back("create column", snapshot, source)),
        }
    }

    /// Rename and/or recolor a column.
    pub async fn update_column(
        &mut self,
        column_id: Uuid,
        name: Option<String>,
        color: Option<String>,
    ) -> SyncResult<Column> {
        if let Some(name) = &name {
            MutationValidator::validate_column_name(name)?;
        }
        if let Some(color) = &color {
            MutationValidator::validate_color(color)?;
        }

        let snapshot = self.board.snapshot();
        self.phase = OpPhase::Applying;
        let column = match self.board.set_column_content(column_id, name, color) {
            Ok(column) => column,
            Err(err) => {
                self.phase = OpPhase::Idle;
                return Err(err.into());
            }
        };

        self.phase = OpPhase::Persisting;
        match self.store.update_column(&column).await {
            Ok(()) => {
                self.phase = OpPhase::Committed;
                Ok(column)
            }
            Err(source) => Err(self.roll_back("update column", snapshot, source)),
        }
    }

    /// Delete a non-default column. Remaining tasks are relocated to the
    /// end of the default column, in their original relative order, as
    /// part of the same persisted transaction; if any half fails the
    /// whole operation rolls back and the column stays.
    pub async fn delete_column(&mut self, column_id: Uuid) -> SyncResult<Vec<Uuid>> {
        let column = self.board.column(column_id).ok_or_else(|| CoreError::NotFound {
            entity: "column",
            id: column_id,
            location: ErrorLocation::from(Location::caller()),
        })?;
        // Forbidden outright; this never reaches the applying phase.
        if column.is_default {
            return Err(SyncError::Core(CoreError::InvariantViolation {
                message: "cannot delete the default column".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }));
        }
        debug!("delete column {} ({})", column_id, column.name);

        let snapshot = self.board.snapshot();
        self.phase = OpPhase::Applying;
        let relocated = match self.board.remove_column(column_id) {
            Ok(relocated) => relocated,
            Err(err) => {
                self.phase = OpPhase::Idle;
                return Err(err.into());
            }
        };

        self.phase = OpPhase::Persisting;
        match self.store.delete_column(column_id).await {
            Ok(()) => {
                self.phase = OpPhase::Committed;
                Ok(relocated)
            }
            Err(source) => Err(self.roll_back("delete column", snapshot, source)),
        }
    }

    // ---- Task lifecycle --------------------------------------------- //

    /// Create a task appended at the end of a column.
    pub async fn create_task(
        &mut self,
        column_id: Uuid,
        title: &str,
        description: Option<String>,
        priority: Option<i32>,
        due_date: Option<DateTime<Utc>>,
    ) -> SyncResult<Task> {
        MutationValidator::validate_title(title)?;
        if let Some(priority) = priority {
            MutationValidator::validate_priority(priority)?;
        }
        if self.board.column(column_id).is_none() {
            return Err(SyncError::Core(CoreError::NotFound {
                entity: "column",
                id: column_id,
                location: ErrorLocation::from(Location::caller()),
            }));
        }

        let mut task = Task::new(self.board.project().id, column_id, title.to_string());
        task.description = description;
        if let Some(priority) = priority {
            task.priority = priority;
        }
        task.due_date = due_date;

        self.insert_and_persist(task, "create task").await
    }

    /// Create a subtask appended at the end of the parent's checklist.
    pub async fn create_subtask(&mut self, parent_id: Uuid, title: &str) -> SyncResult<Task> {
        MutationValidator::validate_title(title)?;
        let parent = self.board.task(parent_id).ok_or_else(|| CoreError::NotFound {
            entity: "task",
            id: parent_id,
            location: ErrorLocation::from(Location::caller()),
        })?;
        if parent.is_subtask() {
            return Err(SyncError::Core(CoreError::InvariantViolation {
                message: "subtasks nest one level deep".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }));
        }

        let task = Task::new_subtask(parent, title.trim().to_string());
        self.insert_and_persist(task, "create subtask").await
    }

    async fn insert_and_persist(&mut self, task: Task, operation: &'static str) -> SyncResult<Task> {
        let snapshot = self.board.snapshot();
        self.phase = OpPhase::Applying;
        if let Err(err) = self.board.insert_task(task.clone()) {
            self.phase = OpPhase::Idle;
            return Err(err.into());
        }
        // The board assigned the end-of-sequence position.
        let task = self.board.task(task.id).cloned().unwrap_or(task);

        self.phase = OpPhase::Persisting;
        match self.store.create_task(&task).await {
            Ok(()) => {
                self.phase = OpPhase::Committed;
                Ok(task)
            }
            Err(source) => Err(self.roll_back(operation, snapshot, source)),
        }
    }

    /// Content-only update; ordering is never patched here.
    pub async fn update_task(&mut self, task_id: Uuid, patch: TaskPatch) -> SyncResult<Task> {
        if let Some(title) = &patch.title {
            MutationValidator::validate_title(title)?;
        }
        if let Some(priority) = patch.priority {
            MutationValidator::validate_priority(priority)?;
        }

        let snapshot = self.board.snapshot();
        self.phase = OpPhase::Applying;
        let task = match self.board.set_task_content(task_id, &patch) {
            Ok(task) => task,
            Err(err) => {
                self.phase = OpPhase::Idle;
                return Err(err.into());
            }
        };

        self.phase = OpPhase::Persisting;
        match self.store.update_task(&task).await {
            Ok(()) => {
                self.phase = OpPhase::Committed;
                Ok(task)
            }
            Err(source) => Err(self.roll_back("update task", snapshot, source)),
        }
    }

    /// Delete a task or subtask; sibling positions are renormalized on
    /// both sides of the store boundary.
    pub async fn delete_task(&mut self, task_id: Uuid) -> SyncResult<()> {
        let snapshot = self.board.snapshot();
        self.phase = OpPhase::Applying;
        if let Err(err) = self.board.remove_task(task_id) {
            self.phase = OpPhase::Idle;
            return Err(err.into());
        }

        self.phase = OpPhase::Persisting;
        match self.store.delete_task(task_id).await {
            Ok(()) => {
                self.phase = OpPhase::Committed;
                Ok(())
            }
            Err(source) => Err(self.roll_back("delete task", snapshot, source)),
        }
    }

    /// Toggle completion. Completing a top-level task moves it to the
    /// end of the done column (when the board has one); un-completing
    /// moves it back to the end of the default column. Subtasks just
    /// flip the flag.
    pub async fn toggle_complete(&mut self, task_id: Uuid) -> SyncResult<Task> {
        let task = self
            .board
            .task(task_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "task",
                id: task_id,
                location: ErrorLocation::from(Location::caller()),
            })?;
        let completing = !task.is_completed();
        let stamp = if completing { Some(Utc::now()) } else { None };

        let snapshot = self.board.snapshot();
        self.phase = OpPhase::Applying;

        if task.is_subtask() {
            let updated = match self.board.set_task_completed(task_id, stamp) {
                Ok(updated) => updated,
                Err(err) => {
                    self.phase = OpPhase::Idle;
                    return Err(err.into());
                }
            };
            self.phase = OpPhase::Persisting;
            return match self.store.update_task(&updated).await {
                Ok(()) => {
                    self.phase = OpPhase::Committed;
                    Ok(updated)
                }
                Err(source) => Err(self.roll_back("toggle complete", snapshot, source)),
            };
        }

        let current_column = task.column_id;
        let target_column = if completing {
            self.board.done_column_id().unwrap_or(current_column)
        } else {
            self.board.default_column_id().unwrap_or(current_column)
        };

        let delta = match self.toggle_apply(task_id, stamp, current_column, target_column) {
            Ok(delta) => delta,
            Err(err) => {
                self.board.restore(snapshot);
                self.phase = OpPhase::Idle;
                return Err(err.into());
            }
        };

        self.phase = OpPhase::Persisting;
        let persisted = match &delta {
            Some(delta) => self.persist_task_move(task_id, &delta.changed_columns()).await,
            None => match self.board.task(task_id) {
                Some(updated) => self.store.update_task(updated).await,
                None => Err(StoreError::new(format!(
                    "task {} vanished before persisting",
                    task_id
                ))),
            },
        };
        match persisted {
            Ok(()) => {
                self.phase = OpPhase::Committed;
                Ok(self.board.task(task_id).cloned().unwrap_or(task))
            }
            Err(source) => Err(self.roll_back("toggle complete", snapshot, source)),
        }
    }

    fn toggle_apply(
        &mut self,
        task_id: Uuid,
        stamp: Option<DateTime<Utc>>,
        current_column: Uuid,
        target_column: Uuid,
    ) -> crate::Result<Option<MoveDelta>> {
        self.board.set_task_completed(task_id, stamp)?;
        if target_column == current_column {
            return Ok(None);
        }
        let end = self.board.ordered_task_ids(target_column)?.len();
        Ok(Some(self.board.apply_move(task_id, target_column, end)?))
    }

    // ---- Persistence helpers ---------------------------------------- //

    /// `move_task` for the task's current spot, then the full dense
    /// order of every affected column, so persisted positions always
    /// match the in-memory indices.
    async fn persist_task_move(&self, task_id: Uuid, columns: &[Uuid]) -> Result<(), StoreError> {
        let task = self.board.task(task_id).ok_or_else(|| {
            StoreError::new(format!("task {} vanished before persisting", task_id))
        })?;
        self.store
            .move_task(task.id, task.column_id, task.position)
            .await?;
        for &column_id in columns {
            let ordered = self
                .board
                .ordered_task_ids(column_id)
                .map_err(|err| StoreError::new(err.to_string()))?;
            self.store.set_column_task_order(column_id, ordered).await?;
        }
        Ok(())
    }

    fn roll_back(
        &mut self,
        operation: &'static str,
        snapshot: BoardSnapshot,
        source: StoreError,
    ) -> SyncError {
        warn!("{} failed, rolling back: {}", operation, source);
        self.board.restore(snapshot);
        self.phase = OpPhase::RolledBack;
        self.notices.push_back(SyncNotice {
            operation,
            message: source.to_string(),
        });
        SyncError::Store { source }
    }
}
