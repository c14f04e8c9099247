//! BuildDepGraph lifecycle: build, edit, relocate, sort, compact.

use depgraph::dep_graph::{
    BuildDepGraph, CacheId, DepTreeNode, DependencyKind, NameStore, NodeKind, NodeRelocationMap,
    SymbolTable,
};
use depgraph::graph::ChangeFlags;
use depgraph::NodeId;

fn targets(graph: &BuildDepGraph, from: NodeId) -> Vec<(NodeId, DependencyKind)> {
    graph
        .get(from)
        .edges()
        .map(|edge| (edge.to_id(), edge.value()))
        .collect()
}

#[test]
fn test_build_edit_compact_cycle() {
    let mut names = NameStore::new();
    let mut graph = BuildDepGraph::new();
    let module = graph
        .add_named_node(&mut names, NodeKind::Library, "$B/util/libutil.a")
        .id();
    let old_src = graph
        .add_named_node(&mut names, NodeKind::File, "$S/util/old.cpp")
        .id();
    let src = graph
        .add_named_node(&mut names, NodeKind::File, "$S/util/str.cpp")
        .id();
    let header = graph
        .add_named_node(&mut names, NodeKind::File, "$S/util/str.h")
        .id();
    graph.add_dep(module, old_src, DependencyKind::BuildFrom);
    graph.add_dep(module, src, DependencyKind::BuildFrom);
    graph.add_dep(src, header, DependencyKind::Include);
    let (_, inserted) = graph.add_unique_dep(src, header, DependencyKind::Include);
    assert!(!inserted);

    graph.delete_node(old_src);
    assert!(graph.changed().contains(ChangeFlags::HANGING_EDGES));
    assert_eq!(targets(&graph, module), vec![(src, DependencyKind::BuildFrom)]);

    graph.delete_hanging_edges();
    assert!(!graph.has_hanging_edges());

    let remap = graph.compact();
    assert!(!graph.has_anything_deleted());
    let module = remap.get(module);
    let src = remap.get(src);
    assert_eq!(remap.get(old_src), NodeId::INVALID);
    assert_eq!(
        graph.get_valid_node(&names, NodeKind::File, "$S/util/str.cpp").map(|n| n.id()).ok(),
        Some(src)
    );
    assert_eq!(targets(&graph, module), vec![(src, DependencyKind::BuildFrom)]);
    assert_eq!(graph.node_name(&names, src), "$S/util/str.cpp");
    graph.mark_unchanged();
    assert!(!graph.is_changed());
}

#[test]
fn test_relocation_moves_edges_to_new_symbol() {
    let mut names = NameStore::new();
    let mut graph = BuildDepGraph::new();
    let user = graph
        .add_named_node(&mut names, NodeKind::File, "$S/a.cpp")
        .id();
    let old = graph
        .add_named_node(&mut names, NodeKind::File, "$S/gen/a.h")
        .id();
    let new = graph
        .add_named_node(&mut names, NodeKind::NonParsedFile, "$B/gen/a.h")
        .id();
    graph.add_dep(user, old, DependencyKind::Include);

    let old_id = names.id_by_name(NodeKind::File, "$S/gen/a.h").unwrap();
    let new_id = names.id_by_name(NodeKind::File, "$B/gen/a.h").unwrap();
    let mut relocated = NodeRelocationMap::default();
    relocated.insert(
        CacheId::file(old_id),
        DepTreeNode::new(NodeKind::NonParsedFile, new_id),
    );
    graph.relocate_nodes(&relocated);

    assert_eq!(targets(&graph, user), vec![(new, DependencyKind::Include)]);
    assert!(!graph.get_node(&names, NodeKind::File, "$S/gen/a.h").is_valid());
}

#[test]
fn test_sort_puts_peers_before_sources_and_tools_last() {
    let mut names = NameStore::new();
    let mut graph = BuildDepGraph::new();
    let program = graph.add_named_node(&mut names, NodeKind::Program, "app").id();
    let tool = graph.add_named_node(&mut names, NodeKind::Program, "tool").id();
    let command = graph
        .add_named_node(&mut names, NodeKind::BuildCommand, "run tool")
        .id();
    let peer_dir = graph.add_named_node(&mut names, NodeKind::Directory, "lib").id();
    let src = graph.add_named_node(&mut names, NodeKind::File, "main.cpp").id();
    graph.add_dep(program, src, DependencyKind::BuildFrom);
    graph.add_dep(program, peer_dir, DependencyKind::Include);
    graph.add_dep(command, tool, DependencyKind::Include);
    graph.add_dep(command, src, DependencyKind::BuildFrom);

    graph.sort_all_edges(&names);

    assert_eq!(
        targets(&graph, program),
        vec![
            (peer_dir, DependencyKind::Include),
            (src, DependencyKind::BuildFrom),
        ]
    );
    assert_eq!(
        targets(&graph, command),
        vec![(src, DependencyKind::BuildFrom), (tool, DependencyKind::Include)]
    );
    assert!(graph.changed().contains(ChangeFlags::EDGE_CHANGED));
}
