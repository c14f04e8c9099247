//! # depgraph
//!
//! A compact, mutable dependency graph for build systems, with a
//! visitor-driven traversal framework and loop detection.
//!
//! ## Core Principles
//!
//! - **Dense ids**: nodes are slots in one vector, edges are packed words
//! - **Cheap deletes**: deletion leaves tombstones, compaction reclaims them
//! - **Explicit stacks**: traversals never recurse, visitors see the whole path
//! - **Names outside**: the graph stores symbol ids, a [`SymbolTable`] owns names
//!
//! ## Architecture
//!
//! ```text
//! Loop detection (find, classify, remove)
//!     ↓
//! Traversal (DFS state + visitors, BFS query)
//!     ↓
//! BuildDepGraph (kinds, id maps, side data, persistence)
//!     ↓
//! CompactGraph (slots, tombstones, change flags)
//!     ↓
//! Storage Backend (memory, RocksDB)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use depgraph::dep_graph::{DependencyKind, NameStore, NodeKind};
//! use depgraph::loops::GraphLoops;
//! use depgraph::BuildDepGraph;
//!
//! let mut names = NameStore::new();
//! let mut graph = BuildDepGraph::new();
//! let app = graph.add_named_node(&mut names, NodeKind::Program, "app/app").id();
//! let lib = graph.add_named_node(&mut names, NodeKind::Library, "lib/liblib.a").id();
//! graph.add_dep(app, lib, DependencyKind::BuildFrom);
//! graph.add_dep(lib, app, DependencyKind::BuildFrom);
//!
//! let loops = GraphLoops::find_from(&graph, &[app], false);
//! assert_eq!(loops.len(), 1);
//! assert!(loops.has_bad_loops());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

/// Loop detection and dump configuration.
pub mod config;
pub mod dep_graph;
pub mod error;
pub mod graph;
pub mod loops;
pub mod storage;
pub mod traversal;

// Re-export main types
pub use config::{DepGraphConfig, DumpOptions};
pub use dep_graph::{BuildDepGraph, DependencyKind, NodeKind, SymbolTable};
pub use error::{GraphError, Result};
pub use graph::{CompactGraph, NodeId};
pub use loops::GraphLoops;
pub use storage::{MemoryBackend, StorageBackend};

#[cfg(feature = "rocksdb-backend")]
pub use storage::RocksDBBackend;
