//! Non-recursive depth-first traversal driven by a [`Visitor`].

use super::state::IterState;
use super::visitor::Visitor;
use crate::graph::{CompactGraph, EdgeStorage, NodeId, NodeValue};
use bitflags::bitflags;
use log::trace;

/// Depth-first iterator over an [`IterState`].
///
/// The iterator remembers the stack depth it started at and never pops
/// below it, so a visitor may run a nested traversal on the state it was
/// handed.
pub struct DepthFirstIterator<'s, 'g, N, E, V: Visitor<N, E>> {
    state: &'s mut IterState<'g, N, E, V::FrameData>,
    visitor: &'s mut V,
    bottom: Option<usize>,
}

impl<'s, 'g, N, E, V> DepthFirstIterator<'s, 'g, N, E, V>
where
    N: NodeValue,
    E: EdgeStorage,
    V: Visitor<N, E>,
{
    /// Uninitialized iterator; call [`init`](Self::init) first.
    pub fn new(state: &'s mut IterState<'g, N, E, V::FrameData>, visitor: &'s mut V) -> Self {
        Self {
            state,
            visitor,
            bottom: None,
        }
    }

    /// Push `start` and enter it.
    ///
    /// Returns `false` if the visitor refused the start node, in which case
    /// the frame is already gone.
    pub fn init(&mut self, start: NodeId) -> bool {
        debug_assert!(self.bottom.is_none(), "iterator initialized twice");
        self.bottom = Some(self.state.len());
        if !self.push(start) {
            self.pop();
            return false;
        }
        true
    }

    /// Advance to the next entered node.
    ///
    /// Returns `true` with the new node on top of the stack, `false` once
    /// the traversal unwound to its starting depth.
    pub fn step(&mut self) -> bool {
        while !self.done() {
            let graph = self.state.graph();
            if let Some(top) = self.state.top() {
                // After a pop the accepted edge led to the child just left.
                if top.accepted() && graph.contains(top.node()) {
                    self.state.advance();
                }
            }
            while self.state.is_dep() {
                if self.visitor.accept_dep(self.state) {
                    self.state.accept_top();
                    break;
                }
                self.state.advance();
            }
            if self.state.is_dep() {
                if let Some(target) = self.state.next_dep().map(|dep| dep.to_id()) {
                    if self.push(target) {
                        return true;
                    }
                }
            }
            self.pop();
        }
        false
    }

    /// Run the traversal to completion.
    pub fn run(&mut self) {
        while self.step() {}
    }

    /// True once the stack is back at its starting depth.
    pub fn done(&self) -> bool {
        self.bottom.map_or(true, |bottom| self.state.len() <= bottom)
    }

    /// Current traversal state.
    pub fn state(&self) -> &IterState<'g, N, E, V::FrameData> {
        self.state
    }

    /// Visitor driving the traversal.
    pub fn visitor(&self) -> &V {
        self.visitor
    }

    fn push(&mut self, node: NodeId) -> bool {
        self.state.push(node);
        trace!("DFS push {node} at depth {}", self.state.len());
        if self.state.top_node().is_valid() {
            self.visitor.enter(self.state)
        } else {
            false
        }
    }

    fn pop(&mut self) {
        if self.state.top_node().is_valid() {
            self.visitor.leave(self.state);
        }
        self.state.pop();
        let above_bottom = self.bottom.map_or(false, |bottom| self.state.len() > bottom);
        if above_bottom && self.state.top_node().is_valid() {
            self.visitor.left(self.state);
        }
    }
}

/// Traverse everything reachable from `start` on a fresh state.
pub fn iterate_all<N, E, V>(graph: &CompactGraph<N, E>, start: NodeId, visitor: &mut V)
where
    N: NodeValue,
    E: EdgeStorage,
    V: Visitor<N, E>,
{
    let mut state = IterState::new(graph);
    iterate_all_with_state(&mut state, start, visitor);
}

/// Traverse everything reachable from `start` on top of an existing state.
pub fn iterate_all_with_state<N, E, V>(
    state: &mut IterState<'_, N, E, V::FrameData>,
    start: NodeId,
    visitor: &mut V,
) where
    N: NodeValue,
    E: EdgeStorage,
    V: Visitor<N, E>,
{
    let mut iter = DepthFirstIterator::new(state, visitor);
    if iter.init(start) {
        iter.run();
    }
}

/// Start a traversal from every live node in id order.
pub fn iterate_all_nodes<N, E, V>(graph: &CompactGraph<N, E>, visitor: &mut V)
where
    N: NodeValue,
    E: EdgeStorage,
    V: Visitor<N, E>,
{
    let mut state = IterState::new(graph);
    for node in graph.nodes() {
        iterate_all_with_state(&mut state, node.id(), visitor);
    }
}

bitflags! {
    /// Roles of a start target.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TargetFlags: u32 {
        /// Target is not a directory
        const NON_DIR = 1;
        /// Requested by the user
        const USER = 1 << 1;
        /// Reached through directory recursion
        const RECURSE = 1 << 2;
        /// Reached through a depends link
        const DEPENDS = 1 << 3;
        /// Test dependency target
        const DEP_TEST = 1 << 4;
        /// Target is a module
        const MODULE = 1 << 5;
    }
}

/// Start node of a traversal with its roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    /// Start node
    pub id: NodeId,
    /// Roles of the target
    pub flags: TargetFlags,
    /// Free-form label
    pub tag: String,
}

impl Target {
    /// Target without a tag.
    pub fn new(id: NodeId, flags: TargetFlags) -> Self {
        Self {
            id,
            flags,
            tag: String::new(),
        }
    }

    /// Module target.
    pub fn module(id: NodeId) -> Self {
        Self::new(id, TargetFlags::MODULE | TargetFlags::NON_DIR)
    }

    /// True for module targets.
    pub fn is_module(&self) -> bool {
        self.flags.contains(TargetFlags::MODULE)
    }
}

impl From<&Target> for NodeId {
    fn from(target: &Target) -> NodeId {
        target.id
    }
}

/// Start a traversal from every target accepted by `filter`, sharing one state.
pub fn iterate_targets<N, E, V, F>(
    graph: &CompactGraph<N, E>,
    targets: &[Target],
    mut filter: F,
    visitor: &mut V,
) where
    N: NodeValue,
    E: EdgeStorage,
    V: Visitor<N, E>,
    F: FnMut(&Target) -> bool,
{
    let mut state = IterState::new(graph);
    for target in targets.iter().filter(|target| filter(target)) {
        iterate_all_with_state(&mut state, target.id, visitor);
    }
}
