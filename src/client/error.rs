//! Error types for the graph client

use crate::graph::GraphError;
use crate::persistence::StorageError;
use thiserror::Error;

/// Errors returned by graph client operations.
///
/// Split into two classes for callers that keep going on partial failure:
/// transient errors affect one operation, fatal errors mean the store itself is gone.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The store cannot be reached at all (closed, connection exhausted)
    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    /// A single operation could not be applied
    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Whether the error means no further operation can succeed
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClientError::Unavailable(_) | ClientError::Storage(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    #[test]
    fn test_classification() {
        assert!(ClientError::Unavailable("closed".into()).is_fatal());
        assert!(!ClientError::Operation("missing source".into()).is_fatal());
        assert!(!ClientError::from(GraphError::NodeNotFound(NodeId::new(1))).is_fatal());
        assert!(ClientError::from(StorageError::ColumnFamily("nodes".into())).is_fatal());
    }
}
