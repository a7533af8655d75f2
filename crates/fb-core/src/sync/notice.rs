/// Lifecycle of one controller operation. `Committed` and `RolledBack`
/// are terminal; the next operation starts the machine over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpPhase {
    #[default]
    Idle,
    Applying,
    Persisting,
    Committed,
    RolledBack,
}

/// User-visible failure notification, recorded when an operation rolls
/// back. The UI layer decides presentation; nothing here blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotice {
    pub operation: &'static str,
    pub message: String,
}
