//! Integration test for RocksDBBackend persistence across sessions.

use depgraph::dep_graph::{BuildDepGraph, DependencyKind, NameStore, NodeKind};
use depgraph::RocksDBBackend;
use tempfile::TempDir;

#[test]
fn test_rocksdb_persistence() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.depgraph");
    let mut names = NameStore::new();

    let (module, src);
    // Create graph and save it
    {
        let mut graph = BuildDepGraph::new();
        module = graph
            .add_named_node(&mut names, NodeKind::Program, "$B/tools/app")
            .id();
        src = graph
            .add_named_node(&mut names, NodeKind::File, "$S/tools/main.cpp")
            .id();
        graph.add_dep(module, src, DependencyKind::BuildFrom);

        let mut storage = RocksDBBackend::open(&db_path).unwrap();
        graph.save(&mut storage).unwrap();
    }

    // Reopen and verify data persisted
    {
        let storage = RocksDBBackend::open(&db_path).unwrap();
        let graph = BuildDepGraph::load(&storage).unwrap();

        assert_eq!(graph.node_count(), 2);
        let found = graph
            .get_valid_node(&names, NodeKind::File, "$S/tools/main.cpp")
            .unwrap();
        assert_eq!(found.id(), src);
        let targets: Vec<_> = graph.get(module).edges().map(|e| e.to_id()).collect();
        assert_eq!(targets, vec![src]);
    }

    // Discard and verify nothing is left to load
    {
        let mut storage = RocksDBBackend::open(&db_path).unwrap();
        assert!(BuildDepGraph::is_saved(&storage).unwrap());
        assert_eq!(BuildDepGraph::discard_saved(&mut storage).unwrap(), 2);
        assert!(!BuildDepGraph::is_saved(&storage).unwrap());
        assert!(BuildDepGraph::load(&storage).is_err());
    }
}
