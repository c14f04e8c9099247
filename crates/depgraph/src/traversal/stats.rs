//! No-reentry visitor that records basic facts about every visited node.

use super::state::IterState;
use super::visitor::{NoReentry, Visitor, VisitorEntry};
use crate::dep_graph::{DepEdge, DepTreeNode, DependencyKind};
use crate::graph::NodeId;

/// Facts gathered by [`StatsVisitor`] for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStats<R> {
    /// Node is of a file kind
    pub is_file: bool,
    /// Node has a `BuildFrom` edge
    pub has_build_from: bool,
    /// Node is a file with a `BuildCommand` edge
    pub has_build_cmd: bool,
    /// Caller payload
    pub extra: R,
}

/// The default traversal visitor: no reentry plus [`EntryStats`].
///
/// Build-step detection reads `has_build_from` and `has_build_cmd` after the
/// node was fully visited.
#[derive(Debug, Clone)]
pub struct StatsVisitor<R = ()> {
    base: NoReentry<EntryStats<R>>,
}

impl<R: Default> Default for StatsVisitor<R> {
    fn default() -> Self {
        Self {
            base: NoReentry::new(),
        }
    }
}

impl<R: Default> StatsVisitor<R> {
    /// Create an empty visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying no-reentry records.
    pub fn records(&self) -> &NoReentry<EntryStats<R>> {
        &self.base
    }

    /// Mutable access to the underlying records.
    pub fn records_mut(&mut self) -> &mut NoReentry<EntryStats<R>> {
        &mut self.base
    }

    /// Stats of a visited node.
    pub fn stats(&self, node: NodeId) -> Option<&EntryStats<R>> {
        self.base.entry(node).map(|entry| &entry.data)
    }

    /// Record of the node on top of the stack.
    pub fn current(&self) -> Option<&VisitorEntry<EntryStats<R>>> {
        self.base.current()
    }
}

impl<R: Default> Visitor<DepTreeNode, DepEdge> for StatsVisitor<R> {
    type FrameData = ();

    fn enter(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, ()>) -> bool {
        let fresh = self.base.enter(state);
        if fresh {
            let is_file = state.top_node().value().kind.is_file();
            if let Some(entry) = self.base.current_mut() {
                entry.data.is_file = is_file;
            }
        }
        fresh
    }

    fn leave(&mut self, _state: &mut IterState<'_, DepTreeNode, DepEdge, ()>) {
        self.base.leave();
    }

    fn left(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, ()>) {
        self.base.left(state);
    }

    fn accept_dep(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, ()>) -> bool {
        if let Some(dep) = state.next_dep() {
            let kind = dep.value();
            let from_file = dep.from().value().kind.is_file();
            if let Some(entry) = self.base.current_mut() {
                match kind {
                    DependencyKind::BuildFrom => entry.data.has_build_from = true,
                    DependencyKind::BuildCommand if from_file => entry.data.has_build_cmd = true,
                    _ => {}
                }
            }
        }
        self.base.accept_dep(state)
    }
}
