//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A slot payload failed to parse. Discarded and retried on next poll.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Storage error from the local rule store.
    #[error("storage error: {0}")]
    Storage(#[from] reword_store::StoreError),

    /// Serialization error while encoding an outgoing payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The slot channel is gone (host shutting down).
    #[error("channel closed")]
    ChannelClosed,
}
