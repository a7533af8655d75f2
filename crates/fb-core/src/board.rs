//! Board aggregate: the in-memory state of one project's board.
//!
//! Owns the ordered column sequence, one task sequence per column, the
//! reverse task-to-column index, and the entity payloads. Every mutation
//! leaves positions dense and unique; multi-step mutations restore a
//! snapshot on any internal failure so the aggregate is never observed
//! half-moved.

use crate::models::checklists::Checklists;
use crate::models::column::Column;
use crate::models::project::Project;
use crate::models::task::{Task, TaskPatch};
use crate::sequence::Sequence;
use crate::{CoreError, Result};

use std::collections::{HashMap, HashSet};
use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use uuid::Uuid;

/// Precise outcome of a task move: which columns' orderings changed.
/// Callers update only the affected views instead of refreshing the
/// whole board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveDelta {
    pub task_id: Uuid,
    pub source_column: Uuid,
    pub target_column: Uuid,
    /// `false` when the move resolved to the task's current spot.
    pub moved: bool,
}

impl MoveDelta {
    pub fn changed_columns(&self) -> Vec<Uuid> {
        if !self.moved {
            Vec::new()
        } else if self.source_column == self.target_column {
            vec![self.source_column]
        } else {
            vec![self.source_column, self.target_column]
        }
    }
}

/// Deep copy of a [`BoardState`], the rollback unit for optimistic sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    state: BoardState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    project: Project,
    column_order: Sequence,
    columns: HashMap<Uuid, Column>,
    task_order: HashMap<Uuid, Sequence>,
    owner: HashMap<Uuid, Uuid>,
    tasks: HashMap<Uuid, Task>,
    checklists: Checklists,
}

impl BoardState {
    /// Build the aggregate from persisted rows. Columns and tasks are
    /// ordered by their stored `sort_order`/`position`, then renumbered
    /// to dense indices.
    pub fn hydrate(project: Project, mut columns: Vec<Column>, mut tasks: Vec<Task>) -> Result<Self> {
        columns.sort_by_key(|column| column.sort_order);

        let defaults = columns.iter().filter(|column| column.is_default).count();
        if defaults != 1 {
            return Err(CoreError::InvariantViolation {
                message: format!("project must have exactly one default column, found {}", defaults),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let done = columns.iter().filter(|column| column.is_done).count();
        if done > 1 {
            return Err(CoreError::InvariantViolation {
                message: format!("project may have at most one done column, found {}", done),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut state = Self {
            project,
            column_order: Sequence::new(),
            columns: HashMap::new(),
            task_order: HashMap::new(),
            owner: HashMap::new(),
            tasks: HashMap::new(),
            checklists: Checklists::new(),
        };

        for column in columns {
            state.column_order.push(column.id)?;
            state.task_order.insert(column.id, Sequence::new());
            state.columns.insert(column.id, column);
        }

        tasks.sort_by_key(|task| task.position);
        let (subtasks, top_level): (Vec<Task>, Vec<Task>) =
            tasks.into_iter().partition(Task::is_subtask);

        for task in top_level {
            let seq = state
                .task_order
                .get_mut(&task.column_id)
                .ok_or_else(|| CoreError::NotFound {
                    entity: "column",
                    id: task.column_id,
                    location: ErrorLocation::from(Location::caller()),
                })?;
            seq.push(task.id)?;
            state.owner.insert(task.id, task.column_id);
            state.tasks.insert(task.id, task);
        }

        for task in subtasks {
            let Some(parent_id) = task.parent_id else {
                continue;
            };
            let parent = state.tasks.get(&parent_id).ok_or_else(|| CoreError::NotFound {
                entity: "task",
                id: parent_id,
                location: ErrorLocation::from(Location::caller()),
            })?;
            if parent.is_subtask() {
                return Err(CoreError::InvariantViolation {
                    message: format!("subtasks nest one level deep, parent {} is a subtask", parent_id),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            state.checklists.append(parent_id, task.id)?;
            state.tasks.insert(task.id, task);
        }

        let column_ids: Vec<Uuid> = state.column_order.ordered_ids().to_vec();
        for column_id in column_ids {
            state.renumber_column(column_id);
        }
        state.renumber_columns();

        Ok(state)
    }

    // ---- Read side -------------------------------------------------- //

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn column_count(&self) -> usize {
        self.column_order.len()
    }

    pub fn column(&self, column_id: Uuid) -> Option<&Column> {
        self.columns.get(&column_id)
    }

    pub fn ordered_column_ids(&self) -> &[Uuid] {
        self.column_order.ordered_ids()
    }

    pub fn ordered_columns(&self) -> Vec<&Column> {
        self.column_order
            .iter()
            .filter_map(|id| self.columns.get(id))
            .collect()
    }

    pub fn task(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    #[track_caller]
    pub fn ordered_task_ids(&self, column_id: Uuid) -> Result<&[Uuid]> {
        self.task_order
            .get(&column_id)
            .map(Sequence::ordered_ids)
            .ok_or_else(|| CoreError::NotFound {
                entity: "column",
                id: column_id,
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[track_caller]
    pub fn ordered_tasks(&self, column_id: Uuid) -> Result<Vec<&Task>> {
        Ok(self
            .ordered_task_ids(column_id)?
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .collect())
    }

    /// The column currently owning a top-level task, if any.
    pub fn find_column_of(&self, task_id: Uuid) -> Option<Uuid> {
        self.owner.get(&task_id).copied()
    }

    /// Owning column and index of a top-level task.
    pub fn task_position(&self, task_id: Uuid) -> Option<(Uuid, usize)> {
        let column_id = self.find_column_of(task_id)?;
        let index = self.task_order.get(&column_id)?.position_of(task_id)?;
        Some((column_id, index))
    }

    pub fn default_column_id(&self) -> Option<Uuid> {
        self.column_order
            .iter()
            .find(|id| self.columns.get(*id).is_some_and(|c| c.is_default))
            .copied()
    }

    pub fn done_column_id(&self) -> Option<Uuid> {
        self.column_order
            .iter()
            .find(|id| self.columns.get(*id).is_some_and(|c| c.is_done))
            .copied()
    }

    pub fn checklists(&self) -> &Checklists {
        &self.checklists
    }

    pub fn subtasks_of(&self, parent_id: Uuid) -> Vec<&Task> {
        self.checklists
            .for_parent(parent_id)
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .collect()
    }

    // ---- Mutations -------------------------------------------------- //

    /// Move a task into `target_column_id` at `target_index` (clamped).
    /// Atomic: the removal, insertion and reverse-index update all land,
    /// or the aggregate is restored unchanged.
    #[track_caller]
    pub fn apply_move(
        &mut self,
        task_id: Uuid,
        target_column_id: Uuid,
        target_index: usize,
    ) -> Result<MoveDelta> {
        let source_column_id = self.find_column_of(task_id).ok_or_else(|| CoreError::NotFound {
            entity: "task",
            id: task_id,
            location: ErrorLocation::from(Location::caller()),
        })?;
        if !self.columns.contains_key(&target_column_id) {
            return Err(CoreError::NotFound {
                entity: "column",
                id: target_column_id,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let snapshot = self.snapshot();
        match self.apply_move_inner(task_id, source_column_id, target_column_id, target_index) {
            Ok(delta) => Ok(delta),
            Err(err) => {
                self.restore(snapshot);
                Err(err)
            }
        }
    }

    fn apply_move_inner(
        &mut self,
        task_id: Uuid,
        source_column_id: Uuid,
        target_column_id: Uuid,
        target_index: usize,
    ) -> Result<MoveDelta> {
        let delta = MoveDelta {
            task_id,
            source_column: source_column_id,
            target_column: target_column_id,
            moved: true,
        };

        if source_column_id == target_column_id {
            let moved = self.seq_mut(source_column_id)?.move_to(task_id, target_index)?;
            if moved {
                self.renumber_column(source_column_id);
            }
            return Ok(MoveDelta { moved, ..delta });
        }

        self.seq_mut(source_column_id)?.remove(task_id)?;
        self.seq_mut(target_column_id)?.insert_at(task_id, target_index)?;
        self.owner.insert(task_id, target_column_id);
        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.column_id = target_column_id;
        }
        self.renumber_column(source_column_id);
        self.renumber_column(target_column_id);
        Ok(delta)
    }

    /// Rewrite the column order to match `ordered` exactly. The id set
    /// must match the existing columns; nothing is silently dropped or
    /// added.
    #[track_caller]
    pub fn apply_column_reorder(&mut self, ordered: &[Uuid]) -> Result<()> {
        if ordered.len() != self.column_order.len() {
            return Err(CoreError::InvariantViolation {
                message: format!(
                    "column reorder must list every column exactly once: got {}, have {}",
                    ordered.len(),
                    self.column_order.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let mut seen = HashSet::new();
        for id in ordered {
            if !self.columns.contains_key(id) || !seen.insert(*id) {
                return Err(CoreError::InvariantViolation {
                    message: format!("column reorder references unknown or duplicate column {}", id),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
        self.column_order = Sequence::from_ids(ordered.to_vec());
        self.renumber_columns();
        Ok(())
    }

    /// Append a new column at the end of the board.
    #[track_caller]
    pub fn insert_column(&mut self, column: Column) -> Result<()> {
        if column.project_id != self.project.id {
            return Err(CoreError::Validation {
                message: format!("column {} belongs to a different project", column.id),
                field: Some("project_id".to_string()),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if column.is_default {
            return Err(CoreError::InvariantViolation {
                message: "project already has a default column".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if column.is_done && self.done_column_id().is_some() {
            return Err(CoreError::InvariantViolation {
                message: "project already has a done column".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.column_order.push(column.id)?;
        self.task_order.insert(column.id, Sequence::new());
        self.columns.insert(column.id, column);
        self.renumber_columns();
        Ok(())
    }

    /// Remove a non-default column, relocating its remaining tasks to the
    /// end of the default column in their original relative order.
    /// Returns the relocated task ids.
    #[track_caller]
    pub fn remove_column(&mut self, column_id: Uuid) -> Result<Vec<Uuid>> {
        let column = self.columns.get(&column_id).ok_or_else(|| CoreError::NotFound {
            entity: "column",
            id: column_id,
            location: ErrorLocation::from(Location::caller()),
        })?;
        if column.is_default {
            return Err(CoreError::InvariantViolation {
                message: "cannot delete the default column".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let default_id = self.default_column_id().ok_or_else(|| CoreError::InvariantViolation {
            message: "project has no default column".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let snapshot = self.snapshot();
        match self.remove_column_inner(column_id, default_id) {
            Ok(relocated) => Ok(relocated),
            Err(err) => {
                self.restore(snapshot);
                Err(err)
            }
        }
    }

    fn remove_column_inner(&mut self, column_id: Uuid, default_id: Uuid) -> Result<Vec<Uuid>> {
        let relocated: Vec<Uuid> = self
            .task_order
            .remove(&column_id)
            .map(|seq| seq.ordered_ids().to_vec())
            .unwrap_or_default();

        for &task_id in &relocated {
            self.seq_mut(default_id)?.push(task_id)?;
            self.owner.insert(task_id, default_id);
            if let Some(task) = self.tasks.get_mut(&task_id) {
                task.column_id = default_id;
            }
        }
        // Subtasks are homed in their parent's column; re-home any left
        // pointing at the removed column.
        for task in self.tasks.values_mut() {
            if task.is_subtask() && task.column_id == column_id {
                task.column_id = default_id;
            }
        }

        self.column_order.remove(column_id)?;
        self.columns.remove(&column_id);
        self.renumber_column(default_id);
        self.renumber_columns();
        Ok(relocated)
    }

    /// Insert a task built by the caller: top-level tasks are appended to
    /// their column, subtasks to their parent's checklist.
    #[track_caller]
    pub fn insert_task(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(CoreError::Validation {
                message: format!("task id already present: {}", task.id),
                field: Some("id".to_string()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        match task.parent_id {
            None => {
                let column_id = task.column_id;
                self.seq_mut(column_id)?.push(task.id)?;
                self.owner.insert(task.id, column_id);
                self.tasks.insert(task.id, task);
                self.renumber_column(column_id);
            }
            Some(parent_id) => {
                let parent = self.tasks.get(&parent_id).ok_or_else(|| CoreError::NotFound {
                    entity: "task",
                    id: parent_id,
                    location: ErrorLocation::from(Location::caller()),
                })?;
                if parent.is_subtask() {
                    return Err(CoreError::InvariantViolation {
                        message: "subtasks nest one level deep".to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                self.checklists.append(parent_id, task.id)?;
                let mut task = task;
                task.position = (self.checklists.for_parent(parent_id).len() - 1) as i32;
                self.tasks.insert(task.id, task);
            }
        }
        Ok(())
    }

    /// Remove a task (and, for a top-level task, its whole checklist).
    /// Sibling positions are renumbered. Returns the removed payload.
    #[track_caller]
    pub fn remove_task(&mut self, task_id: Uuid) -> Result<Task> {
        let task = self
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "task",
                id: task_id,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let snapshot = self.snapshot();
        let result = match task.parent_id {
            Some(parent_id) => self.checklists.remove(parent_id, task_id),
            None => self.remove_top_level_inner(task_id),
        };
        match result {
            Ok(()) => {
                self.tasks.remove(&task_id);
                Ok(task)
            }
            Err(err) => {
                self.restore(snapshot);
                Err(err)
            }
        }
    }

    fn remove_top_level_inner(&mut self, task_id: Uuid) -> Result<()> {
        let column_id = self.owner.remove(&task_id).ok_or_else(|| CoreError::InvariantViolation {
            message: format!("task {} missing from the ownership index", task_id),
            location: ErrorLocation::from(Location::caller()),
        })?;
        self.seq_mut(column_id)?.remove(task_id)?;
        for subtask_id in self.checklists.remove_parent(task_id) {
            self.tasks.remove(&subtask_id);
        }
        self.renumber_column(column_id);
        Ok(())
    }

    /// Content-only column update; ordering untouched.
    #[track_caller]
    pub fn set_column_content(
        &mut self,
        column_id: Uuid,
        name: Option<String>,
        color: Option<String>,
    ) -> Result<Column> {
        let column = self.columns.get_mut(&column_id).ok_or_else(|| CoreError::NotFound {
            entity: "column",
            id: column_id,
            location: ErrorLocation::from(Location::caller()),
        })?;
        if let Some(name) = name {
            column.name = name;
        }
        if let Some(color) = color {
            column.color = color;
        }
        column.updated_at = Utc::now();
        Ok(column.clone())
    }

    /// Content-only task update; ordering untouched.
    #[track_caller]
    pub fn set_task_content(&mut self, task_id: Uuid, patch: &TaskPatch) -> Result<Task> {
        let task = self.task_mut(task_id)?;
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(archived) = patch.archived {
            task.archived = archived;
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    #[track_caller]
    pub fn set_task_completed(
        &mut self,
        task_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Task> {
        let task = self.task_mut(task_id)?;
        task.completed_at = completed_at;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    // ---- Snapshot / restore ---------------------------------------- //

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot { state: self.clone() }
    }

    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        *self = snapshot.state;
    }

    // ---- Internal --------------------------------------------------- //

    #[track_caller]
    fn task_mut(&mut self, task_id: Uuid) -> Result<&mut Task> {
        self.tasks.get_mut(&task_id).ok_or_else(|| CoreError::NotFound {
            entity: "task",
            id: task_id,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn seq_mut(&mut self, column_id: Uuid) -> Result<&mut Sequence> {
        self.task_order.get_mut(&column_id).ok_or_else(|| CoreError::NotFound {
            entity: "column",
            id: column_id,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Rewrite payload positions to the dense indices of the sequence.
    fn renumber_column(&mut self, column_id: Uuid) {
        let ids: Vec<Uuid> = match self.task_order.get(&column_id) {
            Some(seq) => seq.ordered_ids().to_vec(),
            None => return,
        };
        for (index, id) in ids.iter().enumerate() {
            if let Some(task) = self.tasks.get_mut(id) {
                task.position = index as i32;
            }
        }
    }

    fn renumber_columns(&mut self) {
        let ids: Vec<Uuid> = self.column_order.ordered_ids().to_vec();
        for (index, id) in ids.iter().enumerate() {
            if let Some(column) = self.columns.get_mut(id) {
                column.sort_order = index as i32;
            }
        }
    }
}
