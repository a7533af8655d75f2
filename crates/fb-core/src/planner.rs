//! Move planner: turns raw drag gestures into concrete plans.
//!
//! A gesture is a drag subject (a task card or a column header) plus a
//! stream of "landed over" ids ending in a release. The planner is pure:
//! it reads the board and produces [`MovePlan`]s; applying previews and
//! persisting commits is the sync controller's job.

use crate::board::BoardState;
use crate::{CoreError, Result};

use std::panic::Location;

use error_location::ErrorLocation;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
    /// Move one task into a column at an index (clamped by the board).
    TaskMove {
        task_id: Uuid,
        target_column: Uuid,
        target_index: usize,
    },
    /// Rewrite the board's column order.
    ColumnReorder { ordered_columns: Vec<Uuid> },
    /// Nothing to do. Released with an active preview, the controller
    /// commits the previewed state as final.
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragSubject {
    Task(Uuid),
    Column(Uuid),
}

/// One drag gesture, from pick-up to release.
#[derive(Debug, Clone, Copy)]
pub struct DragSession {
    subject: DragSubject,
}

impl DragSession {
    /// Classify the picked-up id. Subtasks are not draggable on the
    /// board; their ordering lives in the parent's checklist.
    #[track_caller]
    pub fn begin(board: &BoardState, active_id: Uuid) -> Result<Self> {
        if let Some(task) = board.task(active_id) {
            if task.is_subtask() {
                return Err(CoreError::Validation {
                    message: format!("subtask {} cannot be dragged on the board", active_id),
                    field: None,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            return Ok(Self {
                subject: DragSubject::Task(active_id),
            });
        }
        if board.column(active_id).is_some() {
            return Ok(Self {
                subject: DragSubject::Column(active_id),
            });
        }
        Err(CoreError::NotFound {
            entity: "drag subject",
            id: active_id,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Mid-gesture hover. Yields a preview move only when a dragged task
    /// hovers over a different column than its current one; same-column
    /// shuffling waits for the release.
    pub fn drag_over(&self, board: &BoardState, over_id: Uuid) -> Option<MovePlan> {
        let DragSubject::Task(task_id) = self.subject else {
            return None;
        };
        let (target_column, over_task) = resolve_target(board, over_id)?;
        let current_column = board.find_column_of(task_id)?;
        if target_column == current_column {
            return None;
        }
        let target_index = match over_task {
            Some(over_task_id) => board.task_position(over_task_id)?.1,
            None => board.ordered_task_ids(target_column).ok()?.len(),
        };
        Some(MovePlan::TaskMove {
            task_id,
            target_column,
            target_index,
        })
    }

    /// Release. Resolves the final plan: a task lands at the over-task's
    /// current index (end of column when dropped on the column itself),
    /// a dragged column is re-slotted with a single-step array move.
    pub fn drag_end(self, board: &BoardState, over: Option<Uuid>) -> MovePlan {
        match self.subject {
            DragSubject::Column(column_id) => Self::plan_column_drop(board, column_id, over),
            DragSubject::Task(task_id) => Self::plan_task_drop(board, task_id, over),
        }
    }

    fn plan_column_drop(board: &BoardState, column_id: Uuid, over: Option<Uuid>) -> MovePlan {
        let Some(over_id) = over else {
            return MovePlan::NoOp;
        };
        if over_id == column_id || board.column(over_id).is_none() {
            return MovePlan::NoOp;
        }
        let ids = board.ordered_column_ids();
        let (Some(old_index), Some(new_index)) = (
            ids.iter().position(|id| *id == column_id),
            ids.iter().position(|id| *id == over_id),
        ) else {
            return MovePlan::NoOp;
        };
        let mut ordered = ids.to_vec();
        let moved = ordered.remove(old_index);
        ordered.insert(new_index, moved);
        MovePlan::ColumnReorder {
            ordered_columns: ordered,
        }
    }

    fn plan_task_drop(board: &BoardState, task_id: Uuid, over: Option<Uuid>) -> MovePlan {
        let Some(over_id) = over else {
            return MovePlan::NoOp;
        };
        if over_id == task_id {
            return MovePlan::NoOp;
        }
        let Some((target_column, over_task)) = resolve_target(board, over_id) else {
            return MovePlan::NoOp;
        };
        let Some((current_column, _)) = board.task_position(task_id) else {
            return MovePlan::NoOp;
        };

        let target_index = match over_task {
            Some(over_task_id) => match board.task_position(over_task_id) {
                Some((_, index)) => index,
                None => return MovePlan::NoOp,
            },
            // Dropped on the column surface itself: within the current
            // column this is not a reorder; into another column it is an
            // append.
            None if target_column == current_column => return MovePlan::NoOp,
            None => match board.ordered_task_ids(target_column) {
                Ok(ids) => ids.len(),
                Err(_) => return MovePlan::NoOp,
            },
        };

        MovePlan::TaskMove {
            task_id,
            target_column,
            target_index,
        }
    }
}

/// A landed-over id is either a column or a task; tasks resolve to their
/// owning column.
fn resolve_target(board: &BoardState, over_id: Uuid) -> Option<(Uuid, Option<Uuid>)> {
    if board.column(over_id).is_some() {
        return Some((over_id, None));
    }
    board
        .find_column_of(over_id)
        .map(|column_id| (column_id, Some(over_id)))
}
