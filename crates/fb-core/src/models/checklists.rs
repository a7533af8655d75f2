//! Subtask checklists: one ordered list per parent task.
//!
//! Checklist ordering is a separate domain from column ordering; a
//! subtask never appears in a column sequence and cannot be dragged
//! across columns on its own.

use crate::sequence::Sequence;
use crate::{CoreError, Result};

use std::collections::HashMap;
use std::panic::Location;

use error_location::ErrorLocation;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklists {
    by_parent: HashMap<Uuid, Sequence>,
}

impl Checklists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered subtask ids for a parent; empty when it has none.
    pub fn for_parent(&self, parent_id: Uuid) -> &[Uuid] {
        self.by_parent
            .get(&parent_id)
            .map(Sequence::ordered_ids)
            .unwrap_or(&[])
    }

    pub fn contains(&self, parent_id: Uuid, subtask_id: Uuid) -> bool {
        self.by_parent
            .get(&parent_id)
            .is_some_and(|seq| seq.contains(subtask_id))
    }

    #[track_caller]
    pub fn append(&mut self, parent_id: Uuid, subtask_id: Uuid) -> Result<()> {
        self.by_parent.entry(parent_id).or_default().push(subtask_id)
    }

    #[track_caller]
    pub fn remove(&mut self, parent_id: Uuid, subtask_id: Uuid) -> Result<()> {
        let seq = self
            .by_parent
            .get_mut(&parent_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "checklist",
                id: parent_id,
                location: ErrorLocation::from(Location::caller()),
            })?;
        seq.remove(subtask_id)?;
        if seq.is_empty() {
            self.by_parent.remove(&parent_id);
        }
        Ok(())
    }

    /// Drop a parent's whole checklist, returning the subtask ids it held.
    pub fn remove_parent(&mut self, parent_id: Uuid) -> Vec<Uuid> {
        self.by_parent
            .remove(&parent_id)
            .map(|seq| seq.ordered_ids().to_vec())
            .unwrap_or_default()
    }
}
