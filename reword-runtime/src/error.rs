//! Error type for the interactive session surface.

use reword_store::StoreError;
use reword_sync::SyncError;
use thiserror::Error;

/// Errors surfaced by interactive session operations.
///
/// Background sync and re-scan failures are logged and swallowed inside
/// the session loop instead; only user-initiated calls propagate.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("no rule with id {0}")]
    UnknownRule(reword_types::RuleId),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
