//! Canonical edge order of the build graph.

use super::deps::DepShape;
use super::kinds::{DependencyKind, NodeKind};
use super::symbols::SymbolTable;
use super::{BuildDepGraph, DepCompactGraph, DepEdge};
use crate::graph::{EdgeStorage, NodeId};
use log::debug;
use std::cmp::Ordering;

/// Sort bucket of an edge, lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EdgePriority {
    /// Module to a peer directory
    Peers = 1,
    /// Module straight to a peer module
    DirectPeers = 2,
    /// Main output to an additional output
    OutTogetherBack = 3,
    /// Everything else
    Default = 4,
    /// Source file inclusion, ordered by file name inside the bucket
    IncludeFile = 5,
    /// Command straight to a tool module
    DirectTools = 6,
}

impl EdgePriority {
    /// Bucket of an edge shape.
    pub fn of(shape: &DepShape) -> Self {
        if shape.is_direct_peerdir() {
            EdgePriority::DirectPeers
        } else if shape.is_peerdir() {
            EdgePriority::Peers
        } else if shape.is_direct_tool() {
            EdgePriority::DirectTools
        } else if shape.is_include_file() || shape.is_property_file() {
            EdgePriority::IncludeFile
        } else if shape.dep == DependencyKind::OutTogetherBack {
            EdgePriority::OutTogetherBack
        } else {
            EdgePriority::Default
        }
    }
}

fn live_target(graph: &DepCompactGraph, edge: &DepEdge) -> Option<NodeId> {
    let target = edge.target();
    (!edge.is_deleted() && graph.contains(target)).then_some(target)
}

fn compare_edges(
    graph: &DepCompactGraph,
    names: &dyn SymbolTable,
    from: NodeKind,
    a: &DepEdge,
    b: &DepEdge,
) -> Ordering {
    let (left, right) = match (live_target(graph, a), live_target(graph, b)) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(left), Some(right)) => (graph.get(left).value(), graph.get(right).value()),
    };
    let first = EdgePriority::of(&DepShape::new(from, a.value(), left.kind));
    let second = EdgePriority::of(&DepShape::new(from, b.value(), right.kind));
    if first == EdgePriority::IncludeFile && second == EdgePriority::IncludeFile {
        let left_name = names.name_by_id(left.kind, left.elem_id);
        let right_name = names.name_by_id(right.kind, right.elem_id);
        return left_name.cmp(&right_name);
    }
    first.cmp(&second)
}

impl BuildDepGraph {
    /// Stable-sort the edges of every live node into canonical order.
    ///
    /// Dead edges go first, then peers, direct peers, back links of
    /// multi-output commands, the rest, file inclusions by name and direct
    /// tools last.
    pub fn sort_all_edges(&mut self, names: &dyn SymbolTable) {
        let ids: Vec<NodeId> = self.nodes().map(|node| node.id()).collect();
        for id in &ids {
            let from = self.get(*id).value().kind;
            self.base
                .sort_edges_by(*id, |graph, a, b| compare_edges(graph, names, from, a, b));
        }
        debug!("Sorted edges of {} nodes", ids.len());
    }
}
