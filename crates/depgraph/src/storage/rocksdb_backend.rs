//! RocksDB storage backend.
//!
//! A saved graph is a couple of large values, so the default options move
//! values past [`BLOB_THRESHOLD`] into blob files and compress them with LZ4.
//! Batches map onto a RocksDB `WriteBatch`, so a saved graph is either fully
//! written or not at all.

use super::{BatchOperation, KeyValue, StorageBackend};
use crate::error::{GraphError, Result};
use log::{debug, info};
use rocksdb::{DBCompressionType, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;

/// Values at least this large go to blob files.
pub const BLOB_THRESHOLD: u64 = 64 * 1024;

/// RocksDB-backed persistent storage.
#[derive(Clone)]
pub struct RocksDBBackend {
    db: Arc<DB>,
}

impl RocksDBBackend {
    /// Open or create a database at `path` with options tuned for graph blobs.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, Self::blob_options())
    }

    /// Open a database with caller-tuned options.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the database cannot be opened.
    pub fn open_with_options<P: AsRef<Path>>(path: P, opts: Options) -> Result<Self> {
        let path = path.as_ref();
        let db = DB::open(&opts, path).map_err(|e| {
            GraphError::storage(format!("Failed to open graph store at {path:?}"), Some(e))
        })?;
        info!("Opened graph store at {}", path.display());
        Ok(Self { db: Arc::new(db) })
    }

    /// Default options: create if missing, blob files for large values, LZ4.
    pub fn blob_options() -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_enable_blob_files(true);
        opts.set_min_blob_size(BLOB_THRESHOLD);
        opts.set_blob_compression_type(DBCompressionType::Lz4);
        opts.set_compression_type(DBCompressionType::Lz4);
        opts
    }
}

impl StorageBackend for RocksDBBackend {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .put(key, value)
            .map_err(|e| GraphError::storage("Failed to write graph store", Some(e)))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| GraphError::storage("Failed to read graph store", Some(e)))
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.db
            .delete(key)
            .map_err(|e| GraphError::storage("Failed to delete from graph store", Some(e)))
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        self.get(key).map(|value| value.is_some())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        let mut results = Vec::new();
        for item in self.db.prefix_iterator(prefix) {
            let (key, value) =
                item.map_err(|e| GraphError::storage("Failed to scan graph store", Some(e)))?;
            // Without a prefix extractor the iterator runs past the prefix.
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }

    fn write_batch(&mut self, operations: Vec<BatchOperation>) -> Result<()> {
        let mut batch = WriteBatch::default();
        let count = operations.len();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }
        self.db
            .write(batch)
            .map_err(|e| GraphError::storage("Failed to write graph batch", Some(e)))?;
        debug!("Wrote batch of {count} operations");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| GraphError::storage("Failed to flush graph store", Some(e)))
    }
}
