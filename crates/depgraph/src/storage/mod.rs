//! Key-value storage used to persist a [`BuildDepGraph`](crate::BuildDepGraph).
//!
//! The graph is written as a small set of blobs under one key prefix, so a
//! backend only needs plain get/put with an atomic batch, plus a prefix scan
//! and deletes for discarding a saved graph:
//! - [`MemoryBackend`]: in-process map, used by tests and short-lived tools
//! - `RocksDBBackend`: on-disk store, behind the `rocksdb-backend` feature

mod memory;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use memory::MemoryBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDBBackend;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Key-value pair returned by prefix scans.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Storage backend interface.
///
/// Every operation is explicit and returns `Result`. Batches must be atomic.
pub trait StorageBackend: Send + Sync {
    /// Store a key-value pair.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the write fails.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Retrieve a value by key, `Ok(None)` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the read fails.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Delete a key. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the delete fails.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Check if a key exists.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the check fails.
    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// All pairs whose key starts with `prefix`, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if iteration fails.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>>;

    /// Apply a batch of writes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the batch fails;
    /// nothing is applied in that case.
    fn write_batch(&mut self, operations: Vec<BatchOperation>) -> Result<()>;

    /// Flush buffered writes. Nothing is flushed implicitly.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the flush fails.
    fn flush(&mut self) -> Result<()>;
}

/// One write of an atomic batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchOperation {
    /// Put a key-value pair
    Put {
        /// Key to write
        key: Vec<u8>,
        /// Value to write
        value: Vec<u8>,
    },
    /// Delete a key
    Delete {
        /// Key to delete
        key: Vec<u8>,
    },
}

impl BatchOperation {
    /// Put operation from borrowed parts.
    pub fn put(key: &[u8], value: Vec<u8>) -> Self {
        BatchOperation::Put {
            key: key.to_vec(),
            value,
        }
    }
}
