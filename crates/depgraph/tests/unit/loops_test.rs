//! Loop detection and classification.
//!
//! Tests cover:
//! - Self links never form loops
//! - Build loops and directory loops are bad, include loops are not
//! - Overlapping cycles merge into one loop in any discovery order
//! - Re-entering a finished loop through a new path
//! - The OutTogether rule and its switch
//! - Dumps and writing loops into a caller's writer

use depgraph::dep_graph::{BuildDepGraph, DependencyKind, NameStore, NodeKind, SymbolId};
use depgraph::loops::{GluedLoops, GraphLoops, LoopId};
use depgraph::traversal::Target;
use depgraph::NodeId;
use std::collections::BTreeSet;

fn node(graph: &mut BuildDepGraph, kind: NodeKind, id: u32) -> NodeId {
    graph.add_node(kind, SymbolId::new(id)).id()
}

fn partition(loops: &GraphLoops) -> BTreeSet<Vec<NodeId>> {
    loops
        .loop_ids()
        .map(|id| loops.loop_nodes(id).to_vec())
        .collect()
}

// A directory including itself
#[test]
fn test_self_link_is_not_a_loop() {
    let mut graph = BuildDepGraph::new();
    let dir = node(&mut graph, NodeKind::Directory, 1);
    let file = node(&mut graph, NodeKind::File, 2);
    graph.add_dep(dir, dir, DependencyKind::Include);
    graph.add_dep(file, file, DependencyKind::Include);

    let loops = GraphLoops::find_from(&graph, &[dir, file], false);
    assert!(loops.is_empty());
    assert!(!loops.has_bad_loops());
    assert_eq!(loops.node_loop(file), None);
}

// Module built from a file built from the module
#[test]
fn test_build_from_cycle_is_build_loop() {
    let mut graph = BuildDepGraph::new();
    let module = node(&mut graph, NodeKind::Program, 1);
    let file = node(&mut graph, NodeKind::NonParsedFile, 2);
    graph.add_dep(module, file, DependencyKind::BuildFrom);
    graph.add_dep(file, module, DependencyKind::BuildFrom);

    let loops = GraphLoops::find(&graph, &[Target::module(module)], false);
    assert_eq!(loops.len(), 1);
    let id = LoopId::new(1);
    assert_eq!(loops.loop_nodes(id), &[module, file]);
    assert!(loops.build_loops().contains(&id));
    assert!(loops.dir_loops().is_empty());
    assert!(loops.is_bad(id));
}

// Two headers including each other
#[test]
fn test_include_cycle_is_benign() {
    let mut graph = BuildDepGraph::new();
    let a = node(&mut graph, NodeKind::File, 1);
    let b = node(&mut graph, NodeKind::File, 2);
    graph.add_dep(a, b, DependencyKind::Include);
    graph.add_dep(b, a, DependencyKind::Include);

    let loops = GraphLoops::find_from(&graph, &[a], false);
    assert_eq!(loops.len(), 1);
    assert_eq!(loops.node_loop(a), loops.node_loop(b));
    assert!(!loops.has_bad_loops());
}

#[test]
fn test_directory_member_makes_dir_loop() {
    let mut graph = BuildDepGraph::new();
    let library = node(&mut graph, NodeKind::Library, 1);
    let dir = node(&mut graph, NodeKind::Directory, 2);
    // Peer directory whose module is the library itself.
    graph.add_dep(library, dir, DependencyKind::Include);
    graph.add_dep(dir, library, DependencyKind::Include);

    let loops = GraphLoops::find(&graph, &[Target::module(library)], false);
    assert_eq!(loops.len(), 1);
    assert!(loops.dir_loops().contains(&LoopId::new(1)));
    assert!(loops.build_loops().is_empty());
    assert!(loops.has_bad_loops());
}

// Cycles {a, b} and {b, c} share b
#[test]
fn test_overlapping_cycles_merge_in_any_order() {
    let mut graph = BuildDepGraph::new();
    let a = node(&mut graph, NodeKind::File, 1);
    let b = node(&mut graph, NodeKind::File, 2);
    let c = node(&mut graph, NodeKind::File, 3);
    graph.add_dep(a, b, DependencyKind::Include);
    graph.add_dep(b, a, DependencyKind::Include);
    graph.add_dep(b, c, DependencyKind::Include);
    graph.add_dep(c, b, DependencyKind::Include);

    let expected: BTreeSet<Vec<NodeId>> = [vec![a, b, c]].into_iter().collect();
    for starts in [[a, b, c], [c, b, a], [b, c, a]] {
        let loops = GraphLoops::find_from(&graph, &starts, false);
        assert_eq!(partition(&loops), expected, "starts {starts:?}");
    }
}

#[test]
fn test_reentering_finished_loop_joins_it() {
    let mut graph = BuildDepGraph::new();
    let root = node(&mut graph, NodeKind::File, 1);
    let b = node(&mut graph, NodeKind::File, 2);
    let x = node(&mut graph, NodeKind::File, 3);
    let y = node(&mut graph, NodeKind::File, 4);
    let tail = node(&mut graph, NodeKind::File, 5);
    // b <-> x is found first; y reaches x after x was left, closing y -> x -> b -> y.
    graph.add_dep(root, b, DependencyKind::Include);
    graph.add_dep(b, x, DependencyKind::Include);
    graph.add_dep(x, b, DependencyKind::Include);
    graph.add_dep(b, y, DependencyKind::Include);
    graph.add_dep(y, x, DependencyKind::Include);
    // tail reaches the loop but is not on it.
    graph.add_dep(root, tail, DependencyKind::Include);
    graph.add_dep(tail, x, DependencyKind::Include);

    let loops = GraphLoops::find_from(&graph, &[root], false);
    assert_eq!(loops.len(), 1);
    assert_eq!(loops.loop_nodes(LoopId::new(1)), &[b, x, y]);
    assert_eq!(loops.node_loop(root), None);
    assert_eq!(loops.node_loop(tail), None);
}

#[test]
fn test_search_and_recurse_edges_do_not_close_loops() {
    let mut graph = BuildDepGraph::new();
    let module = node(&mut graph, NodeKind::Library, 1);
    let dir = node(&mut graph, NodeKind::Directory, 2);
    let sub = node(&mut graph, NodeKind::Directory, 3);
    graph.add_dep(module, dir, DependencyKind::Search);
    graph.add_dep(dir, module, DependencyKind::Include);
    graph.add_dep(dir, sub, DependencyKind::Include);
    graph.add_dep(sub, dir, DependencyKind::Include);

    let loops = GraphLoops::find_from(&graph, &[module, dir], false);
    assert!(loops.is_empty());
}

fn out_together_graph(next: DependencyKind) -> (BuildDepGraph, NodeId) {
    // extra --OutTogether--> main --next--> command --BuildFrom--> extra
    let mut graph = BuildDepGraph::new();
    let extra = node(&mut graph, NodeKind::NonParsedFile, 1);
    let main = node(&mut graph, NodeKind::NonParsedFile, 2);
    let command = node(&mut graph, NodeKind::BuildCommand, 3);
    graph.add_dep(extra, main, DependencyKind::OutTogether);
    graph.add_dep(main, command, next);
    graph.add_dep(command, extra, DependencyKind::BuildFrom);
    (graph, extra)
}

#[test]
fn test_out_together_needs_build_link() {
    let (graph, start) = out_together_graph(DependencyKind::BuildCommand);
    assert!(GraphLoops::find_from(&graph, &[start], false).is_empty());
    assert_eq!(GraphLoops::find_from(&graph, &[start], true).len(), 1);

    let (graph, start) = out_together_graph(DependencyKind::BuildFrom);
    assert_eq!(GraphLoops::find_from(&graph, &[start], false).len(), 1);
}

#[test]
fn test_find_uses_module_targets_only() {
    let mut graph = BuildDepGraph::new();
    let a = node(&mut graph, NodeKind::File, 1);
    let b = node(&mut graph, NodeKind::File, 2);
    graph.add_dep(a, b, DependencyKind::Include);
    graph.add_dep(b, a, DependencyKind::Include);

    let user = Target::new(a, Default::default());
    assert!(GraphLoops::find(&graph, &[user], false).is_empty());
}

#[test]
fn test_dumps() {
    let mut graph = BuildDepGraph::new();
    let mut names = NameStore::new();
    let app = graph.add_named_node(&mut names, NodeKind::Program, "app").id();
    let gen = graph.add_named_node(&mut names, NodeKind::NonParsedFile, "gen.cpp").id();
    let a = graph.add_named_node(&mut names, NodeKind::File, "a.h").id();
    let b = graph.add_named_node(&mut names, NodeKind::File, "b.h").id();
    graph.add_dep(app, a, DependencyKind::BuildFrom);
    graph.add_dep(a, b, DependencyKind::Include);
    graph.add_dep(b, a, DependencyKind::Include);
    graph.add_dep(app, gen, DependencyKind::BuildFrom);
    graph.add_dep(gen, app, DependencyKind::BuildFrom);

    let loops = GraphLoops::find(&graph, &[Target::module(app)], false);
    assert_eq!(loops.len(), 2);
    let all = loops.dump_all_loops(&graph, &names);
    assert!(all.contains("(size: 2, bad): app --> gen.cpp\n"), "{all}");
    assert!(all.contains("(size: 2): a.h --> b.h\n"), "{all}");
    assert_eq!(
        loops.dump_build_loops(&graph, &names),
        "Loop 1 (size: 2, bad): app --> gen.cpp\n"
    );
    assert_eq!(loops.dump_dir_loops(&graph, &names), "");

    let empty = GraphLoops::default();
    assert_eq!(empty.dump_all_loops(&graph, &names), "Loops were not detected\n");
}

#[test]
fn test_write_loops_appends_to_writer() {
    let mut graph = BuildDepGraph::new();
    let mut names = NameStore::new();
    let app = graph.add_named_node(&mut names, NodeKind::Program, "app").id();
    let gen = graph.add_named_node(&mut names, NodeKind::NonParsedFile, "gen.cpp").id();
    graph.add_dep(app, gen, DependencyKind::BuildFrom);
    graph.add_dep(gen, app, DependencyKind::BuildFrom);
    let loops = GraphLoops::find(&graph, &[Target::module(app)], false);

    let mut out = String::from("Build loops:\n");
    loops
        .write_loops(&mut out, &graph, &names, loops.build_loops().iter().copied())
        .unwrap();
    assert_eq!(out, "Build loops:\nLoop 1 (size: 2, bad): app --> gen.cpp\n");

    let mut none = String::new();
    loops.write_loops(&mut none, &graph, &names, []).unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_glued_loops_reexport() {
    let mut glued = GluedLoops::new();
    let first = glued.add_loop();
    let second = glued.add_loop();
    glued.join_loops(second, first);
    assert_eq!(glued.get_loop_id(first), glued.get_loop_id(second));
    assert_eq!(glued.len(), 2);
}
