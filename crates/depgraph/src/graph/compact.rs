//! Array-backed mutable multigraph with tombstone deletion.

use super::handles::{EdgeMut, EdgeRef, NodeMut, NodeRef, Nodes};
use super::types::{ChangeFlags, EdgeStorage, NodeId, NodeValue};
use crate::error::{GraphError, Result};
use log::{info, trace};
use rustc_hash::FxHashMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;

/// One node table entry: payload plus outgoing edges in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Slot<N, E> {
    pub(crate) value: N,
    pub(crate) edges: Vec<E>,
}

impl<N: NodeValue, E> Slot<N, E> {
    fn sentinel() -> Self {
        Self {
            value: N::DELETED,
            edges: Vec::new(),
        }
    }

    fn is_live(&self) -> bool {
        !self.value.is_deleted()
    }
}

/// Old-to-new id mapping produced by [`CompactGraph::compact`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRemap {
    // Empty when no node moved.
    moves: Vec<NodeId>,
}

impl NodeRemap {
    /// New id of `old`, [`NodeId::INVALID`] if the node was dropped.
    pub fn get(&self, old: NodeId) -> NodeId {
        if self.moves.is_empty() {
            return old;
        }
        self.moves
            .get(old.index())
            .copied()
            .unwrap_or(NodeId::INVALID)
    }

    /// True when compaction kept every id in place.
    pub fn is_identity(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Generic directed multigraph with dense ids and deferred compaction.
///
/// Node 0 always exists and is always deleted. Deleting a node or an edge
/// writes a tombstone, storage only shrinks in [`compact`](Self::compact).
/// A [`ChangeFlags`] mask records what happened since the last
/// [`mark_unchanged`](Self::mark_unchanged) and drives the fast path of
/// edge validity checks.
#[derive(Debug, Clone)]
pub struct CompactGraph<N, E> {
    slots: Vec<Slot<N, E>>,
    changes: ChangeFlags,
}

impl<N: NodeValue, E: EdgeStorage> Default for CompactGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeValue, E: EdgeStorage> CompactGraph<N, E> {
    /// Create a graph holding only the sentinel slot.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::sentinel()],
            changes: ChangeFlags::empty(),
        }
    }

    /// Number of physical slots, including node 0 and tombstones.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.slots.iter().skip(1).filter(|s| s.is_live()).count()
    }

    /// Number of live edges over all live nodes.
    pub fn edge_count(&self) -> usize {
        self.nodes().map(|node| node.edges().count()).sum()
    }

    /// Changes accumulated since the last [`mark_unchanged`](Self::mark_unchanged).
    pub fn changed(&self) -> ChangeFlags {
        self.changes
    }

    /// True if anything changed at all.
    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Record an externally performed change.
    pub fn notify_changed(&mut self, flags: ChangeFlags) {
        self.changes |= flags;
    }

    /// Forget accumulated changes.
    ///
    /// Only legal while nothing is tombstoned; compact first.
    pub fn mark_unchanged(&mut self) {
        debug_assert!(
            !self.has_anything_deleted(),
            "mark_unchanged on a graph with tombstones"
        );
        self.changes = ChangeFlags::empty();
    }

    /// True if some node or edge was tombstoned since the last compaction.
    pub fn has_anything_deleted(&self) -> bool {
        self.changes
            .intersects(ChangeFlags::EDGE_DELETED | ChangeFlags::NODE_DELETED)
    }

    /// True if live edges may still touch tombstoned nodes.
    pub fn may_have_hanging_edges(&self) -> bool {
        self.changes.contains(ChangeFlags::HANGING_EDGES)
    }

    /// Record that node removal left no hanging edges behind.
    pub fn assert_no_hanging_edges(&mut self) {
        debug_assert!(!self.scan_hanging_edges());
        self.changes.remove(ChangeFlags::HANGING_EDGES);
    }

    /// Full scan for a live edge touching a tombstoned node.
    ///
    /// Slow, meant for checks in tests and diagnostics.
    pub fn has_hanging_edges(&self) -> bool {
        let has = self.scan_hanging_edges();
        debug_assert!(!has || self.may_have_hanging_edges());
        has
    }

    /// True if `id` names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() != 0 && self.slots.get(id.index()).is_some_and(Slot::is_live)
    }

    /// Handle for `id`.
    ///
    /// Out-of-range ids and id 0 yield the invalid handle; tombstones keep
    /// their id and report `is_valid() == false`.
    pub fn get(&self, id: NodeId) -> NodeRef<'_, N, E> {
        NodeRef::new(self, self.clamp(id))
    }

    /// Mutable handle for `id`, same rules as [`get`](Self::get).
    pub fn get_mut(&mut self, id: NodeId) -> NodeMut<'_, N, E> {
        let id = self.clamp(id);
        NodeMut::new(self, id)
    }

    /// Handle for a node that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeOutOfBounds`] past the end of the table and
    /// [`GraphError::DeletedNode`] for tombstones and id 0.
    pub fn get_valid(&self, id: NodeId) -> Result<NodeRef<'_, N, E>> {
        match self.slots.get(id.index()) {
            None => Err(GraphError::NodeOutOfBounds {
                id: id.get(),
                size: self.slots.len(),
            }),
            Some(slot) if id.is_invalid() || !slot.is_live() => {
                Err(GraphError::DeletedNode { id: id.get() })
            }
            Some(_) => Ok(NodeRef::new(self, id)),
        }
    }

    /// Append a new node. Tombstoned slots are never reused before compaction.
    pub fn add_node(&mut self, value: N) -> NodeMut<'_, N, E> {
        let raw = self.slots.len();
        assert!(
            raw <= E::MAX_NODE_ID as usize,
            "node table is full ({raw} slots)"
        );
        self.slots.push(Slot {
            value,
            edges: Vec::new(),
        });
        self.changes |= ChangeFlags::NODE_ADDED;
        // Born dead: the slot is a tombstone until compaction.
        if value.is_deleted() {
            self.changes |= ChangeFlags::NODE_DELETED;
        }
        let id = NodeId::new(raw as u32);
        trace!("Added node {id}: {value:?}");
        NodeMut::new(self, id)
    }

    /// Append an edge `from -> to`. Both endpoints must be live.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, value: E::Value) -> EdgeMut<'_, N, E> {
        debug_assert!(self.contains(from), "edge from dead node {from}");
        debug_assert!(self.contains(to), "edge to dead node {to}");
        let edges = &mut self.slots[from.index()].edges;
        edges.push(E::new(to, value));
        let index = edges.len() - 1;
        self.changes |= ChangeFlags::EDGE_ADDED;
        EdgeMut::new(self, from, index)
    }

    /// Append `from -> to` unless an identical live edge already exists.
    ///
    /// Returns the edge and whether it was inserted.
    pub fn add_unique_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        value: E::Value,
    ) -> (EdgeMut<'_, N, E>, bool) {
        let existing = self.slots[from.index()]
            .edges
            .iter()
            .position(|e| e.target() == to && e.value() == value);
        match existing {
            Some(index) => (EdgeMut::new(self, from, index), false),
            None => (self.add_edge(from, to, value), true),
        }
    }

    /// Tombstone a node. Deleting twice is a no-op.
    pub fn delete_node(&mut self, id: NodeId) {
        debug_assert!(id.index() < self.slots.len(), "delete of out-of-range node {id}");
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return;
        };
        if id.is_invalid() || !slot.is_live() {
            return;
        }
        slot.value = N::DELETED;
        self.changes |= ChangeFlags::NODE_DELETED | ChangeFlags::HANGING_EDGES;
        trace!("Deleted node {id}");
    }

    /// Tombstone every outgoing edge of a node.
    pub fn clear_edges(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return;
        };
        let mut deleted = false;
        for edge in slot.edges.iter_mut().filter(|e| !e.is_deleted()) {
            edge.delete();
            deleted = true;
        }
        if deleted {
            self.changes |= ChangeFlags::EDGE_DELETED;
        }
    }

    /// Stable-sort a node's edges. The comparator may inspect the graph.
    pub fn sort_edges_by<F>(&mut self, id: NodeId, mut compare: F)
    where
        F: FnMut(&Self, &E, &E) -> Ordering,
    {
        if self.slots.get(id.index()).is_none() {
            return;
        }
        let mut edges = std::mem::take(&mut self.slots[id.index()].edges);
        let graph: &Self = self;
        edges.sort_by(|a, b| compare(graph, a, b));
        self.slots[id.index()].edges = edges;
        self.changes |= ChangeFlags::EDGE_CHANGED;
    }

    /// Tombstone every edge touching a tombstoned node, over the whole graph.
    pub fn delete_hanging_edges(&mut self) {
        for raw in 0..self.slots.len() {
            self.delete_hanging_edges_at(raw);
        }
        self.changes.remove(ChangeFlags::HANGING_EDGES);
    }

    /// Tombstone the hanging edges of one node.
    ///
    /// If the node itself is tombstoned all its edges go. The graph-wide
    /// hanging flag is left alone.
    pub fn delete_node_hanging_edges(&mut self, id: NodeId) {
        if id.index() < self.slots.len() {
            self.delete_hanging_edges_at(id.index());
        }
    }

    /// Redirect matching edge targets everywhere and tombstone the old targets.
    pub fn replace_edges(&mut self, replaces: &FxHashMap<NodeId, NodeId>) {
        for raw in 1..self.slots.len() {
            if self.slots[raw].is_live() {
                self.replace_edges_at(raw, replaces);
            }
        }
        for old in replaces.keys() {
            self.delete_node(*old);
        }
        self.changes |= ChangeFlags::EDGE_CHANGED;
    }

    /// Redirect matching edge targets of one node.
    pub fn replace_node_edges(&mut self, id: NodeId, replaces: &FxHashMap<NodeId, NodeId>) {
        debug_assert!(self.contains(id));
        if self.contains(id) {
            self.replace_edges_at(id.index(), replaces);
        }
        self.changes |= ChangeFlags::EDGE_CHANGED;
    }

    /// Replace each matching edge of one node with zero or more edges.
    ///
    /// An empty list tombstones the edge. Otherwise the first target takes
    /// over the edge in place and the rest are appended with the same value.
    pub fn replace_edges_with_list(
        &mut self,
        id: NodeId,
        replaces: &FxHashMap<NodeId, Vec<NodeId>>,
    ) {
        debug_assert!(self.contains(id));
        if !self.contains(id) {
            return;
        }
        let count = self.slots[id.index()].edges.len();
        for index in 0..count {
            let edge = self.slots[id.index()].edges[index];
            let Some(targets) = replaces.get(&edge.target()) else {
                continue;
            };
            let Some((first, rest)) = targets.split_first() else {
                self.slots[id.index()].edges[index].delete();
                self.changes |= ChangeFlags::EDGE_DELETED;
                continue;
            };
            debug_assert!(targets.iter().all(|t| self.contains(*t)));
            self.slots[id.index()].edges[index].set_target(*first);
            for target in rest {
                self.slots[id.index()]
                    .edges
                    .push(E::new(*target, edge.value()));
            }
            if !rest.is_empty() {
                self.changes |= ChangeFlags::EDGE_ADDED;
            }
        }
        self.changes |= ChangeFlags::EDGE_CHANGED;
    }

    /// Physically drop tombstoned edges without renumbering nodes.
    pub fn compact_edges(&mut self) {
        if !self.changes.contains(ChangeFlags::EDGE_DELETED) {
            return;
        }
        for slot in &mut self.slots {
            Self::compact_slot_edges(slot);
        }
        self.changes.remove(ChangeFlags::EDGE_DELETED);
    }

    /// Drop tombstoned nodes and edges and renumber surviving nodes.
    ///
    /// Every previously obtained id becomes stale; translate through the
    /// returned [`NodeRemap`].
    ///
    /// Only the deletion and hanging edge flags are cleared. The added and
    /// changed flags still describe the graph against the last
    /// [`mark_unchanged`](Self::mark_unchanged) point and stay set until
    /// that is called again.
    pub fn compact(&mut self) -> NodeRemap {
        if !self.has_anything_deleted() {
            return NodeRemap::default();
        }
        if !self.changes.contains(ChangeFlags::NODE_DELETED) {
            debug_assert!(!self.may_have_hanging_edges());
            self.compact_edges();
            return NodeRemap::default();
        }

        let before = self.slots.len();
        let mut moves = vec![NodeId::INVALID; before];
        let mut next = 0u32;
        for (old, slot) in self.slots.iter().enumerate() {
            if old == 0 || slot.is_live() {
                moves[old] = NodeId::new(next);
                next += 1;
            }
        }

        let mut index = 0usize;
        self.slots.retain(|slot| {
            let keep = index == 0 || slot.is_live();
            index += 1;
            keep
        });

        for slot in &mut self.slots {
            for edge in &mut slot.edges {
                let target = moves[edge.target().index()];
                if target.is_invalid() {
                    edge.delete();
                } else {
                    edge.set_target(target);
                }
            }
            Self::compact_slot_edges(slot);
        }
        self.changes.remove(
            ChangeFlags::EDGE_DELETED | ChangeFlags::NODE_DELETED | ChangeFlags::HANGING_EDGES,
        );
        info!(
            "Compacted graph: {} -> {} slots",
            before,
            self.slots.len()
        );
        NodeRemap { moves }
    }

    /// Iterate over live nodes in id order.
    pub fn nodes(&self) -> Nodes<'_, N, E> {
        Nodes::new(self)
    }

    /// Return to the freshly created state.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.slots.push(Slot::sentinel());
        self.changes = ChangeFlags::empty();
    }

    /// Three-tier validity check of the edge at `index` of `from`.
    pub(crate) fn edge_is_valid(&self, from: NodeId, index: usize) -> bool {
        let Some(edge) = self
            .slots
            .get(from.index())
            .and_then(|slot| slot.edges.get(index))
        else {
            return false;
        };
        if !self.has_anything_deleted() {
            return true;
        }
        if !self.may_have_hanging_edges() {
            return !edge.is_deleted();
        }
        !edge.is_deleted() && self.contains(edge.target()) && self.contains(from)
    }

    pub(crate) fn slot(&self, id: NodeId) -> &Slot<N, E> {
        &self.slots[id.index()]
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> &mut Slot<N, E> {
        &mut self.slots[id.index()]
    }

    /// First live edge index at or after `index`, or the edge count.
    pub(crate) fn next_valid_edge(&self, from: NodeId, mut index: usize) -> usize {
        let len = self.slots.get(from.index()).map_or(0, |s| s.edges.len());
        while index < len && !self.edge_is_valid(from, index) {
            index += 1;
        }
        index.min(len)
    }

    pub(crate) fn raw_edge_count(&self, from: NodeId) -> usize {
        self.slots.get(from.index()).map_or(0, |s| s.edges.len())
    }

    pub(crate) fn edge_ref(&self, from: NodeId, index: usize) -> EdgeRef<'_, N, E> {
        EdgeRef::new(self, from, index)
    }

    fn clamp(&self, id: NodeId) -> NodeId {
        if id.index() < self.slots.len() {
            id
        } else {
            NodeId::INVALID
        }
    }

    fn delete_hanging_edges_at(&mut self, raw: usize) {
        let source_live = raw != 0 && self.slots[raw].is_live();
        let mut edges = std::mem::take(&mut self.slots[raw].edges);
        let mut deleted = false;
        for edge in edges.iter_mut().filter(|e| !e.is_deleted()) {
            if !source_live || !self.contains(edge.target()) {
                edge.delete();
                deleted = true;
            }
        }
        self.slots[raw].edges = edges;
        if deleted {
            self.changes |= ChangeFlags::EDGE_DELETED;
        }
    }

    fn replace_edges_at(&mut self, raw: usize, replaces: &FxHashMap<NodeId, NodeId>) {
        for edge in &mut self.slots[raw].edges {
            if let Some(&target) = replaces.get(&edge.target()) {
                edge.set_target(target);
            }
        }
    }

    fn compact_slot_edges(slot: &mut Slot<N, E>) {
        if !slot.is_live() {
            slot.edges.clear();
            return;
        }
        slot.edges.retain(|e| !e.is_deleted());
    }

    fn scan_hanging_edges(&self) -> bool {
        self.slots.iter().skip(1).any(|slot| {
            slot.edges.iter().any(|edge| {
                !edge.is_deleted() && (!slot.is_live() || !self.contains(edge.target()))
            })
        })
    }

    /// Rebuild change flags from the stored tombstones.
    fn recompute_changes(&mut self) {
        let mut changes = ChangeFlags::empty();
        for slot in self.slots.iter().skip(1) {
            if !slot.is_live() {
                changes |= ChangeFlags::NODE_DELETED;
            }
            for edge in &slot.edges {
                if edge.is_deleted() {
                    changes |= ChangeFlags::EDGE_DELETED;
                } else if !slot.is_live() || !self.contains(edge.target()) {
                    changes |= ChangeFlags::HANGING_EDGES;
                }
            }
        }
        self.changes = changes;
    }

    fn from_slots(slots: Vec<Slot<N, E>>) -> std::result::Result<Self, String> {
        match slots.first() {
            Some(first) if first.value.is_deleted() && first.edges.is_empty() => {}
            _ => return Err("node table must start with an empty deleted slot".to_string()),
        }
        let size = slots.len();
        for (raw, slot) in slots.iter().enumerate() {
            if let Some(edge) = slot.edges.iter().find(|e| e.target().index() >= size) {
                return Err(format!(
                    "edge of node {raw} points past the node table ({} >= {size})",
                    edge.target()
                ));
            }
        }
        let mut graph = Self {
            slots,
            changes: ChangeFlags::empty(),
        };
        graph.recompute_changes();
        Ok(graph)
    }
}

impl<N: Serialize, E: Serialize> Serialize for CompactGraph<N, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.slots.serialize(serializer)
    }
}

impl<'de, N, E> Deserialize<'de> for CompactGraph<N, E>
where
    N: NodeValue + Deserialize<'de>,
    E: EdgeStorage + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let slots = Vec::<Slot<N, E>>::deserialize(deserializer)?;
        Self::from_slots(slots).map_err(de::Error::custom)
    }
}
