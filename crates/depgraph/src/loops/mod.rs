//! Loop detection over loop-generating dependencies.
//!
//! [`GraphLoops::find`] walks the graph from module targets and partitions
//! every node that sits on a cycle into loops; overlapping cycles end up in
//! one loop. Loops through a directory, or closed by a `BuildFrom` link
//! inside the loop, break the build and are called bad. Bad loops can be
//! removed together with everything that depends on them.

mod bad_nodes;
mod glued;
mod searcher;

pub use glued::GluedLoops;

use crate::config::DepGraphConfig;
use crate::dep_graph::{BuildDepGraph, DepCompactGraph, DependencyKind, NodeKind, SymbolTable};
use crate::graph::NodeId;
use crate::traversal::{iterate_all_with_state, iterate_targets, IterState, Target};
use bad_nodes::CollectBadNodesVisitor;
use log::{debug, error};
use rustc_hash::{FxHashMap, FxHashSet};
use searcher::LoopSearcher;
use std::collections::BTreeSet;
use std::fmt;

/// Dense loop number, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopId(u32);

impl LoopId {
    /// Wrap a raw loop number.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw loop number.
    pub const fn get(self) -> u32 {
        self.0
    }

    fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loops of a graph with their classification.
#[derive(Debug, Clone, Default)]
pub struct GraphLoops {
    loops: Vec<Vec<NodeId>>,
    node_loop: FxHashMap<NodeId, LoopId>,
    dir_loops: BTreeSet<LoopId>,
    build_loops: BTreeSet<LoopId>,
}

impl GraphLoops {
    /// Find the loops reachable from the module targets.
    pub fn find(graph: &DepCompactGraph, targets: &[Target], out_together_is_loop: bool) -> Self {
        let mut searcher = LoopSearcher::new(out_together_is_loop);
        iterate_targets(graph, targets, Target::is_module, &mut searcher);
        Self::classify(graph, searcher)
    }

    /// Find the loops reachable from arbitrary start nodes.
    pub fn find_from(graph: &DepCompactGraph, starts: &[NodeId], out_together_is_loop: bool) -> Self {
        let mut searcher = LoopSearcher::new(out_together_is_loop);
        let mut state = IterState::new(graph);
        for &start in starts {
            iterate_all_with_state(&mut state, start, &mut searcher);
        }
        Self::classify(graph, searcher)
    }

    fn classify(graph: &DepCompactGraph, searcher: LoopSearcher) -> Self {
        let collected = searcher.collect_loops();
        let mut loops = Self {
            loops: collected.loops,
            node_loop: collected.node_loop,
            ..Default::default()
        };
        for (index, members) in loops.loops.iter().enumerate() {
            let id = LoopId::new(index as u32 + 1);
            let in_loop: FxHashSet<NodeId> = members.iter().copied().collect();
            let is_dir = members
                .iter()
                .any(|&node| graph.get(node).value().kind == NodeKind::Directory);
            let is_build = members.iter().any(|&node| {
                graph.get(node).edges().any(|edge| {
                    edge.value() == DependencyKind::BuildFrom && in_loop.contains(&edge.to_id())
                })
            });
            if is_dir {
                loops.dir_loops.insert(id);
            }
            if is_build {
                loops.build_loops.insert(id);
            }
        }
        if !loops.is_empty() {
            debug!(
                "{} loops: {} directory, {} build",
                loops.len(),
                loops.dir_loops.len(),
                loops.build_loops.len()
            );
        }
        loops
    }

    /// Number of loops.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// True if no loop was found.
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// All loop ids in ascending order.
    pub fn loop_ids(&self) -> impl Iterator<Item = LoopId> + '_ {
        (1..=self.loops.len()).map(|n| LoopId::new(n as u32))
    }

    /// Members of a loop in ascending node id order, empty for unknown ids.
    pub fn loop_nodes(&self, id: LoopId) -> &[NodeId] {
        id.index()
            .and_then(|index| self.loops.get(index))
            .map_or(&[], Vec::as_slice)
    }

    /// Loop containing `node`.
    pub fn node_loop(&self, node: NodeId) -> Option<LoopId> {
        self.node_loop.get(&node).copied()
    }

    /// Loops containing a directory.
    pub fn dir_loops(&self) -> &BTreeSet<LoopId> {
        &self.dir_loops
    }

    /// Loops closed by a `BuildFrom` link between members.
    pub fn build_loops(&self) -> &BTreeSet<LoopId> {
        &self.build_loops
    }

    /// True for directory and build loops.
    pub fn is_bad(&self, id: LoopId) -> bool {
        self.dir_loops.contains(&id) || self.build_loops.contains(&id)
    }

    /// True if any loop is bad.
    pub fn has_bad_loops(&self) -> bool {
        !self.dir_loops.is_empty() || !self.build_loops.is_empty()
    }

    /// Describe every loop, or say that there are none.
    pub fn dump_all_loops(&self, graph: &BuildDepGraph, names: &dyn SymbolTable) -> String {
        if self.is_empty() {
            return "Loops were not detected\n".to_string();
        }
        self.dump_loops(graph, names, self.loop_ids())
    }

    /// Describe directory loops.
    pub fn dump_dir_loops(&self, graph: &BuildDepGraph, names: &dyn SymbolTable) -> String {
        self.dump_loops(graph, names, self.dir_loops.iter().copied())
    }

    /// Describe build loops.
    pub fn dump_build_loops(&self, graph: &BuildDepGraph, names: &dyn SymbolTable) -> String {
        self.dump_loops(graph, names, self.build_loops.iter().copied())
    }

    fn dump_loops<I>(&self, graph: &BuildDepGraph, names: &dyn SymbolTable, ids: I) -> String
    where
        I: IntoIterator<Item = LoopId>,
    {
        LoopsText {
            loops: self,
            graph,
            names,
            ids: ids.into_iter().collect(),
        }
        .to_string()
    }

    /// Write one `Loop N (size: S[, bad]): a --> b` line per loop in `ids`,
    /// numbered from 1 in iteration order.
    pub fn write_loops<W, I>(
        &self,
        out: &mut W,
        graph: &BuildDepGraph,
        names: &dyn SymbolTable,
        ids: I,
    ) -> fmt::Result
    where
        W: fmt::Write + ?Sized,
        I: IntoIterator<Item = LoopId>,
    {
        for (number, id) in ids.into_iter().enumerate() {
            let members = self.loop_nodes(id);
            let bad = if self.is_bad(id) { ", bad" } else { "" };
            let chain = members
                .iter()
                .map(|&node| graph.node_name(names, node))
                .collect::<Vec<_>>()
                .join(" --> ");
            writeln!(
                out,
                "Loop {} (size: {}{bad}): {chain}",
                number + 1,
                members.len()
            )?;
        }
        Ok(())
    }

    /// Nodes in bad loops plus everything depending on them, as reached
    /// from the module targets.
    pub fn nodes_to_remove(&self, graph: &DepCompactGraph, targets: &[Target]) -> BTreeSet<NodeId> {
        if !self.has_bad_loops() {
            return BTreeSet::new();
        }
        let mut collector = CollectBadNodesVisitor::new(self);
        iterate_targets(graph, targets, Target::is_module, &mut collector);
        collector.nodes
    }

    /// Delete bad loops and their dependents from the graph.
    ///
    /// Removed nodes are dropped from `targets`. Returns the names of the
    /// removed modules, each of which is also reported as an error.
    pub fn remove_bad_loops(
        &self,
        graph: &mut BuildDepGraph,
        names: &dyn SymbolTable,
        targets: &mut Vec<Target>,
    ) -> Vec<String> {
        let removed = self.nodes_to_remove(graph, targets);
        if removed.is_empty() {
            return Vec::new();
        }
        targets.retain(|target| !removed.contains(&target.id));

        let mut modules = Vec::new();
        for &node in &removed {
            let handle = graph.get(node);
            if handle.is_valid() && handle.value().kind.is_module() {
                let name = graph.node_name(names, node);
                error!("the module {} will not be built due to deprecated loop", name);
                modules.push(name);
            }
            graph.delete_node(node);
        }
        graph.delete_hanging_edges();
        modules
    }

    /// Find loops from the module targets and, when the configuration asks
    /// for it, remove the bad ones.
    ///
    /// The returned loops describe the graph before removal.
    pub fn process(
        graph: &mut BuildDepGraph,
        names: &dyn SymbolTable,
        targets: &mut Vec<Target>,
        config: &DepGraphConfig,
    ) -> (Self, Vec<String>) {
        let loops = Self::find(graph.graph(), targets.as_slice(), config.out_together_is_loop);
        let removed = if config.remove_bad_loops {
            loops.remove_bad_loops(graph, names, targets)
        } else {
            Vec::new()
        };
        (loops, removed)
    }
}

struct LoopsText<'a> {
    loops: &'a GraphLoops,
    graph: &'a BuildDepGraph,
    names: &'a dyn SymbolTable,
    ids: Vec<LoopId>,
}

impl fmt::Display for LoopsText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.loops
            .write_loops(f, self.graph, self.names, self.ids.iter().copied())
    }
}
