//! Breadth-first queries.

use crate::graph::{CompactGraph, EdgeRef, EdgeStorage, NodeId, NodeRef, NodeValue};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// What a [`BfsQuery`] does with the successors of a visited node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Enqueue the targets of the node's live edges
    Edges,
    /// Enqueue nothing
    Skip,
    /// Enqueue these nodes instead of the edge targets
    Replace(Vec<NodeId>),
}

/// Level-by-level walk from a set of start nodes.
///
/// Every node is visited once. Depth is tracked by counting how many
/// queued items are left at the current level, so no per-node depth is
/// stored.
pub struct BfsQuery<'g, N, E> {
    graph: &'g CompactGraph<N, E>,
    queue: VecDeque<NodeId>,
    visited: FxHashSet<NodeId>,
    depth: usize,
    level_left: usize,
    next_level: usize,
}

impl<'g, N: NodeValue, E: EdgeStorage> BfsQuery<'g, N, E> {
    /// Query starting at `starts`. Invalid and repeated starts are dropped.
    pub fn new<I>(graph: &'g CompactGraph<N, E>, starts: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut query = Self {
            graph,
            queue: VecDeque::new(),
            visited: FxHashSet::default(),
            depth: 0,
            level_left: 0,
            next_level: 0,
        };
        for start in starts {
            query.enqueue(start);
        }
        query.level_left = query.next_level;
        query.next_level = 0;
        query
    }

    /// Depth of the node being visited; start nodes are at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// True if `node` was queued at some point.
    pub fn is_visited(&self, node: NodeId) -> bool {
        self.visited.contains(&node)
    }

    /// Number of nodes queued so far, visited or pending.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Visit every reachable node in breadth-first order.
    ///
    /// `visit` receives the node and its depth and decides how the walk
    /// expands from it.
    pub fn run<F>(&mut self, visit: F)
    where
        F: FnMut(NodeRef<'g, N, E>, usize) -> Expansion,
    {
        self.run_filtered(visit, |_| true);
    }

    /// Like [`run`](Self::run), following only edges accepted by
    /// `accept_edge` when a node expands through its edges.
    pub fn run_filtered<F, A>(&mut self, mut visit: F, mut accept_edge: A)
    where
        F: FnMut(NodeRef<'g, N, E>, usize) -> Expansion,
        A: FnMut(&EdgeRef<'g, N, E>) -> bool,
    {
        let graph = self.graph;
        while let Some(id) = self.queue.pop_front() {
            if self.level_left == 0 {
                self.depth += 1;
                self.level_left = self.next_level;
                self.next_level = 0;
            }
            self.level_left -= 1;

            let node = graph.get(id);
            match visit(node, self.depth) {
                Expansion::Edges => {
                    for edge in node.edges() {
                        if accept_edge(&edge) {
                            self.enqueue(edge.to_id());
                        }
                    }
                }
                Expansion::Skip => {}
                Expansion::Replace(targets) => {
                    for target in targets {
                        self.enqueue(target);
                    }
                }
            }
        }
    }

    fn enqueue(&mut self, node: NodeId) {
        if self.graph.contains(node) && self.visited.insert(node) {
            self.queue.push_back(node);
            self.next_level += 1;
        }
    }
}
