mod controller;
mod notice;

pub use controller::{AppliedPlan, SyncController, SyncError, SyncResult};
pub use notice::{OpPhase, SyncNotice};
