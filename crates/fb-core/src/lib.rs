pub mod board;
pub mod error;
pub mod models;
pub mod planner;
pub mod sequence;
pub mod store;
pub mod sync;
pub mod validate;

pub use board::{BoardSnapshot, BoardState, MoveDelta};
pub use error::{CoreError, Result};
pub use models::checklists::Checklists;
pub use models::column::{Column, DEFAULT_COLUMN_COLOR};
pub use models::project::Project;
pub use models::task::{PRIORITY_DEFAULT, PRIORITY_HIGHEST, PRIORITY_LOWEST, Task, TaskPatch};
pub use planner::{DragSession, MovePlan};
pub use sequence::Sequence;
pub use store::{BoardStore, StoreError, StoreResult};
pub use sync::{AppliedPlan, OpPhase, SyncController, SyncError, SyncNotice, SyncResult};
pub use validate::MutationValidator;

#[cfg(test)]
mod tests;
