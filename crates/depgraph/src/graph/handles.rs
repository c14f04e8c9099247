//! Node and edge handles bound to one graph instance.
//!
//! Handles borrow the graph, so none of them can survive a call to
//! [`CompactGraph::compact`] or a drop of the graph.

use super::compact::CompactGraph;
use super::types::{ChangeFlags, EdgeStorage, NodeId, NodeValue};
use std::cmp::Ordering;
use std::fmt;

/// Read-only view of one node slot.
pub struct NodeRef<'g, N, E> {
    graph: &'g CompactGraph<N, E>,
    id: NodeId,
}

impl<N, E> Clone for NodeRef<'_, N, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N, E> Copy for NodeRef<'_, N, E> {}

impl<'g, N: NodeValue, E: EdgeStorage> NodeRef<'g, N, E> {
    pub(crate) fn new(graph: &'g CompactGraph<N, E>, id: NodeId) -> Self {
        Self { graph, id }
    }

    /// Slot id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// True for a live node.
    pub fn is_valid(&self) -> bool {
        self.graph.contains(self.id)
    }

    /// Node payload, the deleted sentinel for tombstones.
    pub fn value(&self) -> N {
        self.graph.slot(self.id).value
    }

    /// Live outgoing edges in stored order.
    pub fn edges(&self) -> Edges<'g, N, E> {
        Edges::new(self.graph, self.id)
    }

    /// Graph the handle is bound to.
    pub fn graph(&self) -> &'g CompactGraph<N, E> {
        self.graph
    }
}

impl<N: NodeValue, E: EdgeStorage> fmt::Debug for NodeRef<'_, N, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("value", &self.value())
            .finish()
    }
}

impl<N, E> PartialEq for NodeRef<'_, N, E> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

/// Mutable view of one node slot.
pub struct NodeMut<'g, N, E> {
    graph: &'g mut CompactGraph<N, E>,
    id: NodeId,
}

impl<'g, N: NodeValue, E: EdgeStorage> NodeMut<'g, N, E> {
    pub(crate) fn new(graph: &'g mut CompactGraph<N, E>, id: NodeId) -> Self {
        Self { graph, id }
    }

    /// Slot id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// True for a live node.
    pub fn is_valid(&self) -> bool {
        self.graph.contains(self.id)
    }

    /// Node payload.
    pub fn value(&self) -> N {
        self.graph.slot(self.id).value
    }

    /// Overwrite the payload of a live node.
    ///
    /// Writing the deleted sentinel tombstones the node the same way
    /// [`CompactGraph::delete_node`] does.
    pub fn set_value(&mut self, value: N) {
        debug_assert!(self.is_valid(), "set_value on dead node {}", self.id);
        if !self.is_valid() {
            return;
        }
        if value.is_deleted() {
            self.graph.delete_node(self.id);
            return;
        }
        self.graph.slot_mut(self.id).value = value;
    }

    /// Read-only view of the same node.
    pub fn view(&self) -> NodeRef<'_, N, E> {
        NodeRef::new(self.graph, self.id)
    }

    /// Live outgoing edges in stored order.
    pub fn edges(&self) -> Edges<'_, N, E> {
        Edges::new(self.graph, self.id)
    }

    /// Append an outgoing edge.
    pub fn add_edge(&mut self, to: NodeId, value: E::Value) -> EdgeMut<'_, N, E> {
        self.graph.add_edge(self.id, to, value)
    }

    /// Append an outgoing edge unless an identical one exists.
    pub fn add_unique_edge(&mut self, to: NodeId, value: E::Value) -> (EdgeMut<'_, N, E>, bool) {
        self.graph.add_unique_edge(self.id, to, value)
    }

    /// Tombstone all outgoing edges.
    pub fn clear_edges(&mut self) {
        self.graph.clear_edges(self.id);
    }

    /// Stable-sort outgoing edges.
    pub fn sort_edges_by<F>(&mut self, compare: F)
    where
        F: FnMut(&CompactGraph<N, E>, &E, &E) -> Ordering,
    {
        self.graph.sort_edges_by(self.id, compare);
    }

    /// Tombstone the node.
    pub fn delete(self) {
        self.graph.delete_node(self.id);
    }
}

/// Read-only view of one stored edge.
pub struct EdgeRef<'g, N, E> {
    graph: &'g CompactGraph<N, E>,
    from: NodeId,
    index: usize,
}

impl<N, E> Clone for EdgeRef<'_, N, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N, E> Copy for EdgeRef<'_, N, E> {}

impl<'g, N: NodeValue, E: EdgeStorage> EdgeRef<'g, N, E> {
    pub(crate) fn new(graph: &'g CompactGraph<N, E>, from: NodeId, index: usize) -> Self {
        Self { graph, from, index }
    }

    fn raw(&self) -> &'g E {
        &self.graph.slot(self.from).edges[self.index]
    }

    /// Source node.
    pub fn from(&self) -> NodeRef<'g, N, E> {
        NodeRef::new(self.graph, self.from)
    }

    /// Target node.
    pub fn to(&self) -> NodeRef<'g, N, E> {
        self.graph.get(self.to_id())
    }

    /// Source node id.
    pub fn from_id(&self) -> NodeId {
        self.from
    }

    /// Target node id, [`NodeId::INVALID`] for a tombstoned edge.
    pub fn to_id(&self) -> NodeId {
        self.raw().target()
    }

    /// Edge payload.
    pub fn value(&self) -> E::Value {
        self.raw().value()
    }

    /// Position of the edge in its source's edge list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Three-tier validity check.
    pub fn is_valid(&self) -> bool {
        self.graph.edge_is_valid(self.from, self.index)
    }
}

impl<N: NodeValue, E: EdgeStorage> fmt::Debug for EdgeRef<'_, N, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeRef")
            .field("from", &self.from)
            .field("to", &self.to_id())
            .field("value", &self.value())
            .finish()
    }
}

/// Mutable view of one stored edge.
pub struct EdgeMut<'g, N, E> {
    graph: &'g mut CompactGraph<N, E>,
    from: NodeId,
    index: usize,
}

impl<'g, N: NodeValue, E: EdgeStorage> EdgeMut<'g, N, E> {
    pub(crate) fn new(graph: &'g mut CompactGraph<N, E>, from: NodeId, index: usize) -> Self {
        Self { graph, from, index }
    }

    /// Read-only view of the same edge.
    pub fn view(&self) -> EdgeRef<'_, N, E> {
        EdgeRef::new(self.graph, self.from, self.index)
    }

    /// Source node id.
    pub fn from_id(&self) -> NodeId {
        self.from
    }

    /// Target node id.
    pub fn to_id(&self) -> NodeId {
        self.view().to_id()
    }

    /// Edge payload.
    pub fn value(&self) -> E::Value {
        self.view().value()
    }

    /// True for a live edge.
    pub fn is_valid(&self) -> bool {
        self.view().is_valid()
    }

    /// Replace the edge payload.
    pub fn set_value(&mut self, value: E::Value) {
        self.graph.slot_mut(self.from).edges[self.index].set_value(value);
        self.graph.notify_changed(ChangeFlags::EDGE_CHANGED);
    }

    /// Tombstone the edge.
    pub fn delete(self) {
        self.graph.slot_mut(self.from).edges[self.index].delete();
        self.graph.notify_changed(ChangeFlags::EDGE_DELETED);
    }
}

/// Iterator over the live edges of one node.
pub struct Edges<'g, N, E> {
    graph: &'g CompactGraph<N, E>,
    from: NodeId,
    index: usize,
    len: usize,
}

impl<N, E> Clone for Edges<'_, N, E> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph,
            from: self.from,
            index: self.index,
            len: self.len,
        }
    }
}

impl<'g, N: NodeValue, E: EdgeStorage> Edges<'g, N, E> {
    fn new(graph: &'g CompactGraph<N, E>, from: NodeId) -> Self {
        let len = if graph.contains(from) {
            graph.raw_edge_count(from)
        } else {
            0
        };
        Self {
            graph,
            from,
            index: 0,
            len,
        }
    }
}

impl<'g, N: NodeValue, E: EdgeStorage> Iterator for Edges<'g, N, E> {
    type Item = EdgeRef<'g, N, E>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.len {
            let index = self.index;
            self.index += 1;
            if self.graph.edge_is_valid(self.from, index) {
                return Some(EdgeRef::new(self.graph, self.from, index));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.len - self.index))
    }
}

/// Iterator over live nodes in id order, skipping node 0 and tombstones.
pub struct Nodes<'g, N, E> {
    graph: &'g CompactGraph<N, E>,
    next: usize,
}

impl<'g, N: NodeValue, E: EdgeStorage> Nodes<'g, N, E> {
    pub(crate) fn new(graph: &'g CompactGraph<N, E>) -> Self {
        Self { graph, next: 1 }
    }
}

impl<'g, N: NodeValue, E: EdgeStorage> Iterator for Nodes<'g, N, E> {
    type Item = NodeRef<'g, N, E>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.graph.size() {
            let id = NodeId::new(self.next as u32);
            self.next += 1;
            if self.graph.contains(id) {
                return Some(NodeRef::new(self.graph, id));
            }
        }
        None
    }
}
