//! Error types for the engine layer.

use crate::document::NodeId;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in document and substitution operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A node id does not refer to a node attached to the tree.
    #[error("node {0:?} is not attached to the tree")]
    Detached(NodeId),

    /// An operation expected a text node.
    #[error("node {0:?} is not a text node")]
    NotText(NodeId),

    /// An operation expected a marker node.
    #[error("node {0:?} is not a marker node")]
    NotMarker(NodeId),

    /// An operation expected an element node.
    #[error("node {0:?} is not an element node")]
    NotElement(NodeId),
}
