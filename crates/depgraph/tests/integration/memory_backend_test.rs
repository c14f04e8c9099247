//! Save and load through the in-memory backend.

use depgraph::dep_graph::{
    BuildDepGraph, DependencyKind, NameStore, NodeKind, SymbolTable, GRAPH_BLOB_KEY,
};
use depgraph::{GraphError, MemoryBackend, StorageBackend};
use std::collections::BTreeSet;

/// Edges of every live node as `(from name, kind, to name)`.
fn edge_set(graph: &BuildDepGraph, names: &NameStore) -> BTreeSet<(String, DependencyKind, String)> {
    graph
        .nodes()
        .flat_map(|node| node.edges())
        .map(|edge| {
            (
                graph.node_name(names, edge.from_id()),
                edge.value(),
                graph.node_name(names, edge.to_id()),
            )
        })
        .collect()
}

fn sample(names: &mut NameStore) -> BuildDepGraph {
    let mut graph = BuildDepGraph::new();
    let dir = graph.add_named_node(names, NodeKind::Directory, "$S/util").id();
    let module = graph
        .add_named_node(names, NodeKind::Library, "$B/util/libutil.a")
        .id();
    let src = graph.add_named_node(names, NodeKind::File, "$S/util/a.cpp").id();
    let header = graph.add_named_node(names, NodeKind::File, "$S/util/a.h").id();
    let command = graph
        .add_named_node(names, NodeKind::BuildCommand, "cc $S/util/a.cpp")
        .id();
    graph.add_dep(dir, module, DependencyKind::Include);
    graph.add_dep(module, src, DependencyKind::BuildFrom);
    graph.add_dep(src, header, DependencyKind::Include);
    graph.add_dep(src, command, DependencyKind::BuildCommand);
    let header_id = names.id_by_name(NodeKind::File, "$S/util/a.h").unwrap();
    graph.node_data_mut(header_id).mod_stamp = 7;
    graph.node_data_mut(header_id).pass_no_induced_deps = true;
    graph
}

#[test]
fn test_round_trip_preserves_graph() {
    let mut names = NameStore::new();
    let graph = sample(&mut names);
    let mut storage = MemoryBackend::new();
    graph.save(&mut storage).unwrap();
    assert_eq!(storage.len(), 2);

    let loaded = BuildDepGraph::load(&storage).unwrap();
    assert_eq!(loaded.node_count(), graph.node_count());
    assert_eq!(loaded.edge_count(), graph.edge_count());
    assert_eq!(edge_set(&loaded, &names), edge_set(&graph, &names));
    assert_eq!(loaded.file_node_data(), graph.file_node_data());
    for node in graph.nodes() {
        let value = node.value();
        assert_eq!(loaded.get_node_by_id(value.kind, value.elem_id).id(), node.id());
    }
}

#[test]
fn test_round_trip_after_deletion_keeps_tombstones() {
    let mut names = NameStore::new();
    let mut graph = sample(&mut names);
    let header = graph.get_valid_node(&names, NodeKind::File, "$S/util/a.h").unwrap().id();
    graph.delete_node(header);

    let mut storage = MemoryBackend::new();
    graph.save(&mut storage).unwrap();
    let mut loaded = BuildDepGraph::load(&storage).unwrap();

    assert!(loaded.has_anything_deleted());
    assert!(loaded.may_have_hanging_edges());
    assert!(!loaded.get(header).is_valid());
    assert_eq!(edge_set(&loaded, &names), edge_set(&graph, &names));

    loaded.compact();
    assert_eq!(loaded.size(), graph.size() - 1);
    assert!(!loaded.has_hanging_edges());
}

#[test]
fn test_load_from_empty_storage_fails() {
    let storage = MemoryBackend::new();
    let err = BuildDepGraph::load(&storage).unwrap_err();
    assert!(matches!(err, GraphError::Storage { .. }));
}

#[test]
fn test_load_rejects_corrupt_graph_blob() {
    let mut storage = MemoryBackend::new();
    storage.put(GRAPH_BLOB_KEY, b"{\"slots\": 3}").unwrap();
    let err = BuildDepGraph::load(&storage).unwrap_err();
    assert!(matches!(err, GraphError::Serialization { .. }));
}
