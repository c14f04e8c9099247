//! Collection of module peers over the direct-peer subgraph.

use super::dfs::iterate_all;
use super::state::IterState;
use super::visitor::{NoReentry, Visitor};
use crate::dep_graph::{DepCompactGraph, DepEdge, DepNodeRef, DepShape, DepTreeNode};
use crate::graph::NodeId;

/// Callbacks driven by [`PeersVisitor`].
pub trait PeerCollector {
    /// A module is visited for the first time. Returning `false` skips its
    /// peers, for example when they were already collected.
    fn start(&mut self, _module: DepNodeRef<'_>) -> bool {
        true
    }

    /// `peer` is a direct peer of `module`. Fires for every peer edge,
    /// including peers whose own subgraph was finished earlier.
    fn collect(&mut self, module: DepNodeRef<'_>, peer: DepNodeRef<'_>);

    /// Every peer of `module` was collected.
    fn finish(&mut self, _module: DepNodeRef<'_>) {}
}

/// No-reentry walk along direct peer edges that drives a [`PeerCollector`].
///
/// Frame data is `true` for frames whose node was started.
#[derive(Debug)]
pub struct PeersVisitor<'c, C> {
    base: NoReentry<()>,
    collector: &'c mut C,
}

impl<'c, C: PeerCollector> PeersVisitor<'c, C> {
    /// Create a visitor feeding `collector`.
    pub fn new(collector: &'c mut C) -> Self {
        Self {
            base: NoReentry::new(),
            collector,
        }
    }
}

impl<C: PeerCollector> Visitor<DepTreeNode, DepEdge> for PeersVisitor<'_, C> {
    type FrameData = bool;

    fn enter(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, bool>) -> bool {
        if !self.base.enter(state) {
            return false;
        }
        let node = state.top_node();
        let started = node.value().kind.is_module() && self.collector.start(node);
        if let Some(top) = state.top_mut() {
            top.data = started;
        }
        started
    }

    fn leave(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, bool>) {
        self.base.leave();
        if state.top().is_some_and(|top| top.data) {
            self.collector.finish(state.top_node());
        }
    }

    fn left(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, bool>) {
        self.base.left(state);
        if let Some(dep) = state.next_dep() {
            self.collector.collect(dep.from(), dep.to());
        }
    }

    fn accept_dep(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, bool>) -> bool {
        let direct = state
            .next_dep()
            .is_some_and(|dep| DepShape::of(&dep).is_direct_peerdir());
        direct && self.base.accept_dep(state)
    }
}

/// Run `collector` over the direct peers reachable from `module`.
pub fn collect_peers<C: PeerCollector>(graph: &DepCompactGraph, module: NodeId, collector: &mut C) {
    let mut visitor = PeersVisitor::new(collector);
    iterate_all(graph, module, &mut visitor);
}
