//! Traversal framework over the build graph.
//!
//! Tests cover:
//! - No-reentry termination and single fresh entry on cyclic graphs
//! - Nested traversals sharing one stack
//! - Dependency filters combined with stats collection
//! - Enclosing module lookup from inside a visitor
//! - Target filtering, BFS over dependency kinds, tree printing

use depgraph::dep_graph::{
    BuildDepGraph, DepEdge, DepTreeNode, DependencyKind, NameStore, NodeKind, SymbolId,
};
use depgraph::traversal::{
    find_module, iterate_all, iterate_all_nodes, iterate_all_with_state, iterate_targets,
    print_tree, BfsQuery, DependencyFilter, Expansion, FilteredVisitor, IterState, NoReentry,
    StatsVisitor, Target, TargetFlags, Visitor,
};
use depgraph::NodeId;
use std::collections::HashSet;

type State<'g> = IterState<'g, DepTreeNode, DepEdge, ()>;

#[derive(Default)]
struct Recorder {
    base: NoReentry<()>,
    fresh: Vec<NodeId>,
    lefts: Vec<NodeId>,
}

impl Visitor<DepTreeNode, DepEdge> for Recorder {
    type FrameData = ();

    fn enter(&mut self, state: &mut State<'_>) -> bool {
        let fresh = self.base.enter(state);
        if fresh {
            self.fresh.push(state.top_node().id());
        }
        fresh
    }

    fn leave(&mut self, _state: &mut State<'_>) {
        self.base.leave();
    }

    fn left(&mut self, state: &mut State<'_>) {
        self.base.left(state);
        self.lefts.push(state.top_node().id());
    }

    fn accept_dep(&mut self, state: &mut State<'_>) -> bool {
        self.base.accept_dep(state)
    }
}

fn files(graph: &mut BuildDepGraph, count: u32) -> Vec<NodeId> {
    (1..=count)
        .map(|i| graph.add_node(NodeKind::File, SymbolId::new(i)).id())
        .collect()
}

#[test]
fn test_no_reentry_terminates_on_cycles() {
    let mut graph = BuildDepGraph::new();
    let n = files(&mut graph, 5);
    // 0 -> 1 -> 2 -> 0, 2 -> 3 -> 1, 3 -> 3, 4 unreachable
    graph.add_dep(n[0], n[1], DependencyKind::Include);
    graph.add_dep(n[1], n[2], DependencyKind::Include);
    graph.add_dep(n[2], n[0], DependencyKind::Include);
    graph.add_dep(n[2], n[3], DependencyKind::Include);
    graph.add_dep(n[3], n[1], DependencyKind::Include);
    graph.add_dep(n[3], n[3], DependencyKind::Include);

    let mut recorder = Recorder::default();
    iterate_all(&graph, n[0], &mut recorder);

    assert_eq!(recorder.fresh, vec![n[0], n[1], n[2], n[3]]);
    assert!(recorder.base.entries().iter().all(|entry| !entry.in_stack()));
    assert!(recorder.base.entry(n[4]).is_none());
}

#[test]
fn test_iterate_all_nodes_enters_each_once() {
    let mut graph = BuildDepGraph::new();
    let n = files(&mut graph, 4);
    graph.add_dep(n[3], n[0], DependencyKind::Include);
    graph.add_dep(n[0], n[3], DependencyKind::Include);
    graph.delete_node(n[2]);

    let mut recorder = Recorder::default();
    iterate_all_nodes(&graph, &mut recorder);

    let unique: HashSet<NodeId> = recorder.fresh.iter().copied().collect();
    assert_eq!(unique.len(), recorder.fresh.len());
    assert_eq!(recorder.fresh, vec![n[0], n[3], n[1]]);
}

#[test]
fn test_start_on_deleted_node_visits_nothing() {
    let mut graph = BuildDepGraph::new();
    let n = files(&mut graph, 2);
    graph.add_dep(n[0], n[1], DependencyKind::Include);
    graph.delete_node(n[0]);

    let mut recorder = Recorder::default();
    iterate_all(&graph, n[0], &mut recorder);
    assert!(recorder.fresh.is_empty());
}

struct Nesting {
    base: NoReentry<()>,
    trigger: NodeId,
    nested_start: NodeId,
    inner: Recorder,
    lefts: Vec<NodeId>,
    depth_kept: bool,
}

impl Visitor<DepTreeNode, DepEdge> for Nesting {
    type FrameData = ();

    fn enter(&mut self, state: &mut State<'_>) -> bool {
        let fresh = self.base.enter(state);
        if fresh && state.top_node().id() == self.trigger {
            let before = state.len();
            iterate_all_with_state(state, self.nested_start, &mut self.inner);
            self.depth_kept = state.len() == before;
        }
        fresh
    }

    fn leave(&mut self, _state: &mut State<'_>) {
        self.base.leave();
    }

    fn left(&mut self, state: &mut State<'_>) {
        self.base.left(state);
        self.lefts.push(state.top_node().id());
    }

    fn accept_dep(&mut self, state: &mut State<'_>) -> bool {
        self.base.accept_dep(state)
    }
}

#[test]
fn test_nested_traversal_stays_above_its_bottom() {
    let mut graph = BuildDepGraph::new();
    let n = files(&mut graph, 5);
    let (a, b, c, x, y) = (n[0], n[1], n[2], n[3], n[4]);
    graph.add_dep(a, b, DependencyKind::Include);
    graph.add_dep(b, c, DependencyKind::Include);
    graph.add_dep(x, y, DependencyKind::Include);

    let mut nesting = Nesting {
        base: NoReentry::new(),
        trigger: b,
        nested_start: x,
        inner: Recorder::default(),
        lefts: Vec::new(),
        depth_kept: false,
    };
    iterate_all(&graph, a, &mut nesting);

    assert!(nesting.depth_kept);
    assert_eq!(nesting.inner.fresh, vec![x, y]);
    // The nested walk never reports returning into the outer frames.
    assert_eq!(nesting.inner.lefts, vec![x]);
    assert_eq!(nesting.lefts, vec![b, a]);
}

#[test]
fn test_filtered_stats_visitor() {
    let mut graph = BuildDepGraph::new();
    let program = graph.add_node(NodeKind::Program, SymbolId::new(1)).id();
    let peer = graph.add_node(NodeKind::Directory, SymbolId::new(2)).id();
    let source = graph.add_node(NodeKind::File, SymbolId::new(3)).id();
    let command = graph.add_node(NodeKind::BuildCommand, SymbolId::new(1)).id();
    graph.add_dep(program, peer, DependencyKind::Include);
    graph.add_dep(program, source, DependencyKind::BuildFrom);
    graph.add_dep(source, command, DependencyKind::BuildCommand);

    let mut visitor = FilteredVisitor::new(StatsVisitor::<()>::new(), DependencyFilter::SKIP_MODULES);
    iterate_all(&graph, program, &mut visitor);
    let stats = visitor.into_inner();

    assert!(stats.stats(peer).is_none());
    let program_stats = stats.stats(program).unwrap();
    assert!(program_stats.has_build_from);
    assert!(!program_stats.is_file);
    let source_stats = stats.stats(source).unwrap();
    assert!(source_stats.is_file);
    assert!(source_stats.has_build_cmd);
    assert!(!stats.stats(command).unwrap().has_build_cmd);
}

#[derive(Default)]
struct ModuleFinder {
    base: NoReentry<()>,
    owners: Vec<(NodeId, Option<NodeId>)>,
}

impl Visitor<DepTreeNode, DepEdge> for ModuleFinder {
    type FrameData = ();

    fn enter(&mut self, state: &mut State<'_>) -> bool {
        let fresh = self.base.enter(state);
        if fresh {
            let owner = find_module(state).map(|index| state.frames()[index].node());
            self.owners.push((state.top_node().id(), owner));
        }
        fresh
    }

    fn leave(&mut self, _state: &mut State<'_>) {
        self.base.leave();
    }

    fn left(&mut self, state: &mut State<'_>) {
        self.base.left(state);
    }

    fn accept_dep(&mut self, state: &mut State<'_>) -> bool {
        self.base.accept_dep(state)
    }
}

#[test]
fn test_find_module_from_visitor() {
    let mut graph = BuildDepGraph::new();
    let library = graph.add_node(NodeKind::Library, SymbolId::new(1)).id();
    let source = graph.add_node(NodeKind::File, SymbolId::new(2)).id();
    let header = graph.add_node(NodeKind::File, SymbolId::new(3)).id();
    graph.add_dep(library, source, DependencyKind::BuildFrom);
    graph.add_dep(source, header, DependencyKind::Include);

    let mut finder = ModuleFinder::default();
    iterate_all(&graph, library, &mut finder);

    assert_eq!(
        finder.owners,
        vec![
            (library, None),
            (source, Some(library)),
            (header, Some(library)),
        ]
    );
}

#[test]
fn test_iterate_targets_applies_filter() {
    let mut graph = BuildDepGraph::new();
    let module = graph.add_node(NodeKind::Library, SymbolId::new(1)).id();
    let dir = graph.add_node(NodeKind::Directory, SymbolId::new(2)).id();
    let targets = vec![
        Target::new(dir, TargetFlags::USER),
        Target::module(module),
    ];

    let mut recorder = Recorder::default();
    iterate_targets(&graph, &targets, Target::is_module, &mut recorder);
    assert_eq!(recorder.fresh, vec![module]);

    let mut recorder = Recorder::default();
    iterate_targets(&graph, &targets, |_| true, &mut recorder);
    assert_eq!(recorder.fresh, vec![dir, module]);
}

#[test]
fn test_bfs_follows_build_edges_only() {
    let mut graph = BuildDepGraph::new();
    let program = graph.add_node(NodeKind::Program, SymbolId::new(1)).id();
    let a = graph.add_node(NodeKind::File, SymbolId::new(2)).id();
    let b = graph.add_node(NodeKind::File, SymbolId::new(3)).id();
    let dir = graph.add_node(NodeKind::Directory, SymbolId::new(4)).id();
    graph.add_dep(program, a, DependencyKind::BuildFrom);
    graph.add_dep(program, dir, DependencyKind::Search);
    graph.add_dep(a, b, DependencyKind::BuildFrom);

    let mut levels = Vec::new();
    let mut query = BfsQuery::new(&graph, [program]);
    query.run_filtered(
        |node, depth| {
            levels.push((node.id(), depth));
            Expansion::Edges
        },
        |edge| edge.value() == DependencyKind::BuildFrom,
    );
    assert_eq!(levels, vec![(program, 0), (a, 1), (b, 2)]);
    assert!(!query.is_visited(dir));
}

#[test]
fn test_print_tree_skips_filtered_peers() {
    let mut graph = BuildDepGraph::new();
    let mut names = NameStore::new();
    let program = graph
        .add_named_node(&mut names, NodeKind::Program, "$B/app/app")
        .id();
    let peer = graph
        .add_named_node(&mut names, NodeKind::Directory, "$S/lib")
        .id();
    let main = graph
        .add_named_node(&mut names, NodeKind::File, "$S/app/main.cpp")
        .id();
    graph.add_dep(program, peer, DependencyKind::Include);
    graph.add_dep(program, main, DependencyKind::BuildFrom);

    let full = print_tree(&graph, &names, program, DependencyFilter::empty());
    assert_eq!(
        full,
        "$B/app/app\n  [Include] $S/lib\n  [BuildFrom] $S/app/main.cpp\n"
    );
    let trimmed = print_tree(&graph, &names, program, DependencyFilter::SKIP_MODULES);
    assert_eq!(trimmed, "$B/app/app\n  [BuildFrom] $S/app/main.cpp\n");
}
