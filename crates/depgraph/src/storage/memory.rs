//! In-memory storage backend.
//!
//! Nothing survives the last clone of the backend being dropped.

use super::{BatchOperation, KeyValue, StorageBackend};
use crate::error::{GraphError, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory storage backend using a BTreeMap.
///
/// Clones share the same table, so a graph saved through one clone can be
/// loaded through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<Table>>,
}

fn poisoned() -> GraphError {
    GraphError::storage("Memory backend lock poisoned", None::<std::io::Error>)
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored pairs. A poisoned table counts as empty.
    pub fn len(&self) -> usize {
        self.read().map_or(0, |data| data.len())
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all stored pairs.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the lock is poisoned.
    pub fn clear(&mut self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>> {
        self.data.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>> {
        self.data.write().map_err(|_| poisoned())
    }
}

impl StorageBackend for MemoryBackend {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.write()?.remove(key);
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.read()?.contains_key(key))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        let data = self.read()?;
        Ok(data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn write_batch(&mut self, operations: Vec<BatchOperation>) -> Result<()> {
        let mut data = self.write()?;
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
