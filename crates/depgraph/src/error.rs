//! Error types for dependency graph operations.
//!
//! Expected absence (a lookup that finds nothing) is never an error: lookups
//! return the invalid handle instead. [`GraphError`] covers lookups that
//! require presence, persistence failures and malformed persisted state.

use thiserror::Error;

/// Result type alias for depgraph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error type for all recoverable graph failures.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A node that the caller required is absent or tombstoned.
    #[error("Node for {node} is not available or deleted")]
    NodeNotAvailable {
        /// Human-readable description of the requested node
        node: String,
    },

    /// Node id beyond the end of the node table.
    #[error("Out of bounds: node {id} (graph size {size})")]
    NodeOutOfBounds {
        /// Requested id
        id: u32,
        /// Number of physical node slots
        size: usize,
    },

    /// Node id refers to a tombstone.
    #[error("Deleted node: {id}")]
    DeletedNode {
        /// Requested id
        id: u32,
    },

    /// Storage backend error (RocksDB, missing blob, poisoned lock)
    #[error("Storage error: {message}")]
    Storage {
        /// Detailed error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation is not legal in the current graph state
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },
}

impl GraphError {
    /// Create a storage error from a message and optional source.
    pub fn storage<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a "not available or deleted" error for a described node.
    pub fn not_available(node: impl Into<String>) -> Self {
        Self::NodeNotAvailable { node: node.into() }
    }
}
