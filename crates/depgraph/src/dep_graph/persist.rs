//! Saving and loading a [`BuildDepGraph`] through a [`StorageBackend`].

use super::kinds::SymbolId;
use super::node_data::FileNodeData;
use super::{BuildDepGraph, DepCompactGraph};
use crate::error::{GraphError, Result};
use crate::storage::{BatchOperation, StorageBackend};
use log::{debug, info};

/// Common prefix of every key written by [`BuildDepGraph::save`].
pub const BLOB_KEY_PREFIX: &[u8] = b"depgraph:";

/// Storage key of the node table blob.
pub const GRAPH_BLOB_KEY: &[u8] = b"depgraph:graph";

/// Storage key of the file side data blob.
pub const NODE_DATA_BLOB_KEY: &[u8] = b"depgraph:node_data";

impl BuildDepGraph {
    /// Encode the graph and the file side data.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if encoding fails.
    pub fn to_blobs(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let graph = serde_json::to_vec(&self.base)
            .map_err(|e| GraphError::serialization("Failed to encode graph", Some(e)))?;
        let entries: Vec<(SymbolId, FileNodeData)> =
            self.node_data.iter().map(|(id, data)| (*id, *data)).collect();
        let node_data = serde_json::to_vec(&entries)
            .map_err(|e| GraphError::serialization("Failed to encode node data", Some(e)))?;
        Ok((graph, node_data))
    }

    /// Decode a graph from its blobs and rebuild the id maps.
    ///
    /// Change flags are recomputed from the stored tombstones.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] for malformed blobs, including
    /// unknown node or dependency kinds and edges past the node table.
    pub fn from_blobs(graph: &[u8], node_data: Option<&[u8]>) -> Result<Self> {
        let base: DepCompactGraph = serde_json::from_slice(graph)
            .map_err(|e| GraphError::serialization("Failed to decode graph", Some(e)))?;
        let entries: Vec<(SymbolId, FileNodeData)> = match node_data {
            Some(bytes) => serde_json::from_slice(bytes)
                .map_err(|e| GraphError::serialization("Failed to decode node data", Some(e)))?,
            None => Vec::new(),
        };
        let mut loaded = Self {
            base,
            node_data: entries.into_iter().collect(),
            ..Self::default()
        };
        loaded.rebuild_id_maps();
        Ok(loaded)
    }

    /// Write both blobs in one batch and flush.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if encoding fails and
    /// [`GraphError::Storage`] if the backend rejects the batch or the flush.
    pub fn save(&self, storage: &mut dyn StorageBackend) -> Result<()> {
        let (graph, node_data) = self.to_blobs()?;
        let bytes = graph.len() + node_data.len();
        storage.write_batch(vec![
            BatchOperation::put(GRAPH_BLOB_KEY, graph),
            BatchOperation::put(NODE_DATA_BLOB_KEY, node_data),
        ])?;
        storage.flush()?;
        info!(
            "Saved dependency graph: {} slots, {} bytes",
            self.size(),
            bytes
        );
        Ok(())
    }

    /// Read a graph saved by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the graph blob is missing or the
    /// backend fails, [`GraphError::Serialization`] if a blob is malformed.
    pub fn load(storage: &dyn StorageBackend) -> Result<Self> {
        let graph = storage.get(GRAPH_BLOB_KEY)?.ok_or_else(|| {
            GraphError::storage("Dependency graph blob is missing", None::<std::io::Error>)
        })?;
        let node_data = storage.get(NODE_DATA_BLOB_KEY)?;
        let loaded = Self::from_blobs(&graph, node_data.as_deref())?;
        info!("Loaded dependency graph: {} slots", loaded.size());
        Ok(loaded)
    }

    /// True if `storage` holds a graph blob.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the backend fails.
    pub fn is_saved(storage: &dyn StorageBackend) -> Result<bool> {
        storage.exists(GRAPH_BLOB_KEY)
    }

    /// Delete every blob under [`BLOB_KEY_PREFIX`] and flush.
    ///
    /// Returns the number of deleted keys. Keys outside the prefix are left
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the scan, a delete or the flush
    /// fails.
    pub fn discard_saved(storage: &mut dyn StorageBackend) -> Result<usize> {
        let keys: Vec<Vec<u8>> = storage
            .scan_prefix(BLOB_KEY_PREFIX)?
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        for key in &keys {
            storage.delete(key)?;
        }
        storage.flush()?;
        debug!("Discarded {} saved graph blobs", keys.len());
        Ok(keys.len())
    }
}
