//! Property checks over random graphs.

use depgraph::dep_graph::{BuildDepGraph, DepEdge, DepTreeNode, DependencyKind, NodeKind, SymbolId};
use depgraph::loops::GraphLoops;
use depgraph::traversal::{iterate_all_with_state, BfsQuery, Expansion, IterState, NoReentry};
use depgraph::NodeId;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn include_graph(count: u32, edges: &[(u32, u32)]) -> (BuildDepGraph, Vec<NodeId>) {
    let mut graph = BuildDepGraph::new();
    let ids: Vec<NodeId> = (1..=count)
        .map(|i| graph.add_node(NodeKind::File, SymbolId::new(i)).id())
        .collect();
    for &(from, to) in edges {
        graph.add_dep(
            ids[(from % count) as usize],
            ids[(to % count) as usize],
            DependencyKind::Include,
        );
    }
    (graph, ids)
}

fn partition(loops: &GraphLoops) -> BTreeSet<Vec<NodeId>> {
    loops
        .loop_ids()
        .map(|id| loops.loop_nodes(id).to_vec())
        .collect()
}

/// Nodes reachable from `start`, start included.
fn reachable(graph: &BuildDepGraph, start: NodeId) -> BTreeSet<NodeId> {
    let mut seen = BTreeSet::new();
    BfsQuery::new(graph, [start]).run(|node, _| {
        seen.insert(node.id());
        Expansion::Edges
    });
    seen
}

proptest! {
    #[test]
    fn prop_loop_partition_ignores_start_order(
        count in 2u32..12,
        edges in prop::collection::vec((0u32..12, 0u32..12), 0..40),
    ) {
        let (graph, ids) = include_graph(count, &edges);
        let mut reversed = ids.clone();
        reversed.reverse();

        let forward = GraphLoops::find_from(&graph, &ids, false);
        let backward = GraphLoops::find_from(&graph, &reversed, false);
        prop_assert_eq!(partition(&forward), partition(&backward));

        // Members of one loop reach each other.
        for id in forward.loop_ids() {
            let members = forward.loop_nodes(id);
            prop_assert!(members.len() >= 2);
            for &member in members {
                let reach = reachable(&graph, member);
                prop_assert!(members.iter().all(|other| reach.contains(other)));
            }
        }
    }

    #[test]
    fn prop_no_reentry_enters_reachable_once(
        count in 1u32..12,
        edges in prop::collection::vec((0u32..12, 0u32..12), 0..40),
    ) {
        let (graph, ids) = include_graph(count, &edges);
        let mut visitor: NoReentry<()> = NoReentry::new();
        let mut state: IterState<'_, DepTreeNode, DepEdge, ()> = IterState::new(&graph);
        iterate_all_with_state(&mut state, ids[0], &mut visitor);

        prop_assert!(state.is_empty());
        let entered: BTreeSet<NodeId> = visitor.entries().iter().map(|e| e.node()).collect();
        prop_assert_eq!(entered.len(), visitor.len());
        prop_assert_eq!(entered, reachable(&graph, ids[0]));
        prop_assert!(visitor.entries().iter().all(|e| !e.in_stack()));
    }
}
