use super::GraphLoops;
use crate::dep_graph::{DepEdge, DepShape, DepTreeNode};
use crate::graph::NodeId;
use crate::traversal::{IterState, NoReentry, Visitor};
use std::collections::BTreeSet;

type State<'g> = IterState<'g, DepTreeNode, DepEdge, ()>;

/// Collects nodes that belong to bad loops or depend on them through
/// loop-generating edges.
pub(crate) struct CollectBadNodesVisitor<'l> {
    base: NoReentry<bool>,
    loops: &'l GraphLoops,
    pub(crate) nodes: BTreeSet<NodeId>,
}

impl<'l> CollectBadNodesVisitor<'l> {
    pub(crate) fn new(loops: &'l GraphLoops) -> Self {
        Self {
            base: NoReentry::new(),
            loops,
            nodes: BTreeSet::new(),
        }
    }
}

impl Visitor<DepTreeNode, DepEdge> for CollectBadNodesVisitor<'_> {
    type FrameData = ();

    fn enter(&mut self, state: &mut State<'_>) -> bool {
        let fresh = self.base.enter(state);
        if fresh {
            let in_bad_loop = self
                .loops
                .node_loop(state.top_node().id())
                .is_some_and(|id| self.loops.is_bad(id));
            if let Some(entry) = self.base.current_mut() {
                entry.data |= in_bad_loop;
            }
        }
        fresh
    }

    fn leave(&mut self, state: &mut State<'_>) {
        self.base.leave();
        if self.base.current().is_some_and(|entry| entry.data) {
            self.nodes.insert(state.top_node().id());
        }
    }

    fn left(&mut self, state: &mut State<'_>) {
        let child = self.base.current_slot();
        self.base.left(state);
        let child_removed = child
            .and_then(|slot| self.base.entry_at(slot))
            .is_some_and(|entry| entry.data);
        if child_removed {
            if let Some(entry) = self.base.current_mut() {
                entry.data = true;
            }
        }
    }

    fn accept_dep(&mut self, state: &mut State<'_>) -> bool {
        let loop_gen = state
            .next_dep()
            .is_some_and(|dep| DepShape::of(&dep).is_loop_gen());
        loop_gen && self.base.accept_dep(state)
    }
}
