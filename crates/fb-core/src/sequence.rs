//! Ordered-list primitive: a total order over a set of ids.
//!
//! Positions are dense zero-based indices, recomputed on every mutation.
//! Containers are small human-curated lists, so a full rewrite of sibling
//! positions per operation is the simple and sufficient choice.

use crate::{CoreError, Result};

use std::panic::Location;

use error_location::ErrorLocation;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    ids: Vec<Uuid>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: Vec<Uuid>) -> Self {
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.ids.iter().position(|existing| *existing == id)
    }

    pub fn ordered_ids(&self) -> &[Uuid] {
        &self.ids
    }

    /// Insert `id` at `index`, clamped to `[0, len]`. Everything at or
    /// after the index shifts down by one position.
    #[track_caller]
    pub fn insert_at(&mut self, id: Uuid, index: usize) -> Result<()> {
        if self.contains(id) {
            return Err(CoreError::Validation {
                message: format!("id already present in sequence: {}", id),
                field: None,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let index = index.min(self.ids.len());
        self.ids.insert(index, id);
        Ok(())
    }

    /// Append `id` at the end of the sequence.
    #[track_caller]
    pub fn push(&mut self, id: Uuid) -> Result<()> {
        self.insert_at(id, self.ids.len())
    }

    /// Remove `id`, returning the index it occupied. Everything after it
    /// shifts up by one position.
    #[track_caller]
    pub fn remove(&mut self, id: Uuid) -> Result<usize> {
        match self.position_of(id) {
            Some(index) => {
                self.ids.remove(index);
                Ok(index)
            }
            None => Err(CoreError::NotFound {
                entity: "sequence entry",
                id,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Move `id` to `new_index` (clamped to the valid range) as a single
    /// observable transition. Returns `false` when the clamped target is
    /// the current index and nothing changed.
    #[track_caller]
    pub fn move_to(&mut self, id: Uuid, new_index: usize) -> Result<bool> {
        let current = self.position_of(id).ok_or_else(|| CoreError::NotFound {
            entity: "sequence entry",
            id,
            location: ErrorLocation::from(Location::caller()),
        })?;
        let target = new_index.min(self.ids.len().saturating_sub(1));
        if target == current {
            return Ok(false);
        }
        self.ids.remove(current);
        self.ids.insert(target, id);
        Ok(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uuid> {
        self.ids.iter()
    }
}
