//! The build dependency graph.
//!
//! [`BuildDepGraph`] specializes [`CompactGraph`] with [`DepTreeNode`]
//! payloads and packed [`DependencyKind`] edges, and adds lookup of nodes by
//! `(kind, symbol id)` and by name.

mod deps;
mod kinds;
mod node_data;
mod persist;
mod sort;
mod symbols;

pub use deps::{dep_node_with_kind, out_together_dependency, DepShape};
pub use kinds::{CacheId, DepTreeNode, DependencyKind, NodeClass, NodeKind, SymbolId};
pub use node_data::FileNodeData;
pub use persist::{BLOB_KEY_PREFIX, GRAPH_BLOB_KEY, NODE_DATA_BLOB_KEY};
pub use sort::EdgePriority;
pub use symbols::{NameStore, SymbolTable};

use crate::error::{GraphError, Result};
use crate::graph::{CompactGraph, EdgeMut, EdgeRef, NodeId, NodeMut, NodeRef, NodeRemap, PackedEdge};
use log::{debug, trace};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::ops::Deref;

/// Packed edge of the build graph.
pub type DepEdge = PackedEdge<DependencyKind>;

/// Base graph type of [`BuildDepGraph`].
pub type DepCompactGraph = CompactGraph<DepTreeNode, DepEdge>;

/// Read-only node handle of the build graph.
pub type DepNodeRef<'g> = NodeRef<'g, DepTreeNode, DepEdge>;

/// Mutable node handle of the build graph.
///
/// The payload is not writable through the handle since it keys the id
/// maps; use [`BuildDepGraph::set_node_value`].
pub struct DepNodeMut<'g> {
    inner: NodeMut<'g, DepTreeNode, DepEdge>,
}

impl<'g> DepNodeMut<'g> {
    fn new(inner: NodeMut<'g, DepTreeNode, DepEdge>) -> Self {
        Self { inner }
    }

    /// Slot id.
    pub fn id(&self) -> NodeId {
        self.inner.id()
    }

    /// True for a live node.
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    /// Node payload.
    pub fn value(&self) -> DepTreeNode {
        self.inner.value()
    }

    /// Read-only view of the same node.
    pub fn view(&self) -> DepNodeRef<'_> {
        self.inner.view()
    }

    /// Append an outgoing dependency.
    pub fn add_dep(&mut self, to: NodeId, dep: DependencyKind) -> DepEdgeMut<'_> {
        self.inner.add_edge(to, dep)
    }

    /// Append an outgoing dependency unless an identical one exists.
    pub fn add_unique_dep(&mut self, to: NodeId, dep: DependencyKind) -> (DepEdgeMut<'_>, bool) {
        self.inner.add_unique_edge(to, dep)
    }

    /// Tombstone all outgoing dependencies.
    pub fn clear_edges(&mut self) {
        self.inner.clear_edges();
    }

    /// Tombstone the node.
    pub fn delete(self) {
        self.inner.delete();
    }
}

/// Read-only edge handle of the build graph.
pub type DepEdgeRef<'g> = EdgeRef<'g, DepTreeNode, DepEdge>;

/// Mutable edge handle of the build graph.
pub type DepEdgeMut<'g> = EdgeMut<'g, DepTreeNode, DepEdge>;

/// Relocation request: old `(namespace, id)` key to its replacement payload.
pub type NodeRelocationMap = FxHashMap<CacheId, DepTreeNode>;

/// Build dependency graph with name-indexed lookup.
///
/// Read access goes through `Deref` to the underlying [`DepCompactGraph`].
/// Mutations that could desynchronize the id maps are only available on
/// this type.
#[derive(Debug, Clone, Default)]
pub struct BuildDepGraph {
    base: DepCompactGraph,
    // Both maps are valid for the current generation only.
    file_ids: FxHashMap<SymbolId, NodeId>,
    command_ids: FxHashMap<SymbolId, NodeId>,
    node_data: BTreeMap<SymbolId, FileNodeData>,
}

impl Deref for BuildDepGraph {
    type Target = DepCompactGraph;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl BuildDepGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying generic graph.
    pub fn graph(&self) -> &DepCompactGraph {
        &self.base
    }

    /// Node for `(kind, elem_id)`, created if absent.
    ///
    /// An existing node must have a kind of the same [`NodeClass`].
    pub fn add_node(&mut self, kind: NodeKind, elem_id: SymbolId) -> DepNodeMut<'_> {
        let found = self.lookup(kind, elem_id);
        if self.base.contains(found) {
            debug_assert!(
                self.base.get(found).value().kind.is_type_compatible_with(kind),
                "node {found} re-added as incompatible kind {kind}"
            );
            return DepNodeMut::new(self.base.get_mut(found));
        }
        let id = self.base.add_node(DepTreeNode::new(kind, elem_id)).id();
        self.sync_name_id(id);
        if elem_id != SymbolId::NONE && kind.uses_file_id() {
            self.node_data.entry(elem_id).or_default();
        }
        DepNodeMut::new(self.base.get_mut(id))
    }

    /// Node for `(kind, name)`, interning the name first.
    pub fn add_named_node(
        &mut self,
        names: &mut dyn SymbolTable,
        kind: NodeKind,
        name: &str,
    ) -> DepNodeMut<'_> {
        let elem_id = names.add_name(kind, name);
        self.add_node(kind, elem_id)
    }

    /// Mutable handle for `id`.
    pub fn get_mut(&mut self, id: NodeId) -> DepNodeMut<'_> {
        DepNodeMut::new(self.base.get_mut(id))
    }

    /// Replace the payload of a live node and re-register it under its new
    /// `(kind, elem_id)` key.
    ///
    /// A [`NodeKind::Deleted`] payload tombstones the node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DeletedNode`] or [`GraphError::NodeOutOfBounds`]
    /// if `id` is not live, and [`GraphError::InvalidOperation`] if the new
    /// kind is of a different [`NodeClass`].
    pub fn set_node_value(&mut self, id: NodeId, value: DepTreeNode) -> Result<()> {
        let old = self.base.get_valid(id)?.value();
        if value.kind == NodeKind::Deleted {
            self.base.delete_node(id);
            return Ok(());
        }
        if !old.kind.is_type_compatible_with(value.kind) {
            return Err(GraphError::InvalidOperation {
                message: format!("node {id} of kind {} cannot become {}", old.kind, value.kind),
            });
        }
        let map = if old.kind.uses_file_id() {
            &mut self.file_ids
        } else {
            &mut self.command_ids
        };
        if map.get(&old.elem_id) == Some(&id) {
            map.remove(&old.elem_id);
        }
        self.base.get_mut(id).set_value(value);
        self.sync_name_id(id);
        if value.elem_id != SymbolId::NONE && value.kind.uses_file_id() {
            self.node_data.entry(value.elem_id).or_default();
        }
        trace!("Node {id} changed from {old:?} to {value:?}");
        Ok(())
    }

    /// Append a dependency edge.
    pub fn add_dep(&mut self, from: NodeId, to: NodeId, dep: DependencyKind) -> DepEdgeMut<'_> {
        self.base.add_edge(from, to, dep)
    }

    /// Append a dependency edge unless an identical one exists.
    pub fn add_unique_dep(
        &mut self,
        from: NodeId,
        to: NodeId,
        dep: DependencyKind,
    ) -> (DepEdgeMut<'_>, bool) {
        self.base.add_unique_edge(from, to, dep)
    }

    /// Tombstone a node.
    pub fn delete_node(&mut self, id: NodeId) {
        self.base.delete_node(id);
    }

    /// Tombstone every edge touching a tombstoned node.
    pub fn delete_hanging_edges(&mut self) {
        self.base.delete_hanging_edges();
    }

    /// Tombstone the hanging edges of one node.
    pub fn delete_node_hanging_edges(&mut self, id: NodeId) {
        self.base.delete_node_hanging_edges(id);
    }

    /// Tombstone every outgoing edge of a node.
    pub fn clear_edges(&mut self, id: NodeId) {
        self.base.clear_edges(id);
    }

    /// Replace edges of one node by lists of new targets.
    pub fn replace_edges_with_list(
        &mut self,
        id: NodeId,
        replaces: &FxHashMap<NodeId, Vec<NodeId>>,
    ) {
        self.base.replace_edges_with_list(id, replaces);
    }

    /// Forget accumulated changes of a compacted graph.
    pub fn mark_unchanged(&mut self) {
        self.base.mark_unchanged();
    }

    /// Record that no hanging edges are left.
    pub fn assert_no_hanging_edges(&mut self) {
        self.base.assert_no_hanging_edges();
    }

    /// Physically drop tombstoned edges. Node ids are kept.
    pub fn compact_edges(&mut self) {
        self.base.compact_edges();
    }

    /// Node registered for `(kind, elem_id)`, the invalid handle if none.
    ///
    /// A tombstoned node is returned as is; check `is_valid()`.
    pub fn get_node_by_id(&self, kind: NodeKind, elem_id: SymbolId) -> DepNodeRef<'_> {
        self.base.get(self.lookup(kind, elem_id))
    }

    /// Node registered for a file-namespace id.
    pub fn get_file_node_by_id(&self, elem_id: SymbolId) -> DepNodeRef<'_> {
        self.get_node_by_id(NodeKind::File, elem_id)
    }

    /// Node registered for a command-namespace id.
    pub fn get_command_node_by_id(&self, elem_id: SymbolId) -> DepNodeRef<'_> {
        self.get_node_by_id(NodeKind::BuildCommand, elem_id)
    }

    /// Node registered for a namespace-qualified key.
    pub fn get_node_by_cache_id(&self, cache_id: CacheId) -> DepNodeRef<'_> {
        let kind = if cache_id.is_file() {
            NodeKind::File
        } else {
            NodeKind::BuildCommand
        };
        self.get_node_by_id(kind, cache_id.elem_id())
    }

    /// Node for `(kind, name)`, the invalid handle if the name is unknown.
    pub fn get_node(&self, names: &dyn SymbolTable, kind: NodeKind, name: &str) -> DepNodeRef<'_> {
        match names.id_by_name(kind, name) {
            Some(elem_id) => self.get_node_by_id(kind, elem_id),
            None => self.base.get(NodeId::INVALID),
        }
    }

    /// Node for `(kind, name)` that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotAvailable`] if the name is unknown, has no
    /// node, or the node is tombstoned.
    pub fn get_valid_node(
        &self,
        names: &dyn SymbolTable,
        kind: NodeKind,
        name: &str,
    ) -> Result<DepNodeRef<'_>> {
        let node = self.get_node(names, kind, name);
        if node.is_valid() {
            Ok(node)
        } else {
            Err(GraphError::not_available(name))
        }
    }

    /// Redirect edges from relocated symbols to their replacements.
    ///
    /// Every old node that had a live replacement is tombstoned.
    pub fn relocate_nodes(&mut self, relocated: &NodeRelocationMap) {
        let mut replaces = FxHashMap::default();
        for (old, new) in relocated {
            debug_assert_eq!(old.is_file(), new.kind.uses_file_id());
            let map = self.map_for(new.kind);
            debug_assert!(map.contains_key(&new.elem_id));
            if let (Some(&from), Some(&to)) = (map.get(&old.elem_id()), map.get(&new.elem_id)) {
                replaces.insert(from, to);
            }
        }
        if !replaces.is_empty() {
            debug!("Relocating {} nodes", replaces.len());
            self.base.replace_edges(&replaces);
        }
    }

    /// Compact the graph and rebuild the id maps for the new generation.
    pub fn compact(&mut self) -> NodeRemap {
        let remap = self.base.compact();
        self.rebuild_id_maps();
        remap
    }

    /// Side data of a file symbol.
    pub fn node_data(&self, elem_id: SymbolId) -> Option<&FileNodeData> {
        self.node_data.get(&elem_id)
    }

    /// Side data of a file symbol, created with defaults if absent.
    pub fn node_data_mut(&mut self, elem_id: SymbolId) -> &mut FileNodeData {
        self.node_data.entry(elem_id).or_default()
    }

    /// All file side data.
    pub fn file_node_data(&self) -> &BTreeMap<SymbolId, FileNodeData> {
        &self.node_data
    }

    /// Human-readable name of a node.
    ///
    /// Slow, for diagnostics only.
    pub fn node_name(&self, names: &dyn SymbolTable, id: NodeId) -> String {
        let node = self.base.get(id);
        if !node.is_valid() {
            return "<invalid node>".to_string();
        }
        let value = node.value();
        match names.name_by_id(value.kind, value.elem_id) {
            Some(name) => name.to_string(),
            None => format!("<unnamed {} {}>", value.kind, value.elem_id),
        }
    }

    /// Return to the empty state.
    pub fn reset(&mut self) {
        self.base.reset();
        self.file_ids.clear();
        self.command_ids.clear();
        self.node_data.clear();
    }

    fn lookup(&self, kind: NodeKind, elem_id: SymbolId) -> NodeId {
        if elem_id == SymbolId::NONE {
            return NodeId::INVALID;
        }
        self.map_for(kind)
            .get(&elem_id)
            .copied()
            .unwrap_or(NodeId::INVALID)
    }

    fn map_for(&self, kind: NodeKind) -> &FxHashMap<SymbolId, NodeId> {
        if kind.uses_file_id() {
            &self.file_ids
        } else {
            &self.command_ids
        }
    }

    fn sync_name_id(&mut self, id: NodeId) {
        let value = self.base.get(id).value();
        if value.kind == NodeKind::Deleted || value.elem_id == SymbolId::NONE {
            return;
        }
        let map = if value.kind.uses_file_id() {
            &mut self.file_ids
        } else {
            &mut self.command_ids
        };
        map.insert(value.elem_id, id);
        trace!("Registered {} {} as node {id}", value.kind, value.elem_id);
    }

    fn rebuild_id_maps(&mut self) {
        self.file_ids.clear();
        self.command_ids.clear();
        let ids: Vec<NodeId> = self.base.nodes().map(|node| node.id()).collect();
        for id in ids {
            self.sync_name_id(id);
        }
    }
}
