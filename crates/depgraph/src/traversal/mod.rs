//! Traversal framework over [`CompactGraph`](crate::graph::CompactGraph).
//!
//! Depth-first traversal is an explicit stack ([`IterState`]) driven by a
//! [`Visitor`]. Visitors that must terminate on cyclic graphs build on
//! [`NoReentry`]. [`BfsQuery`] covers the simpler level-by-level case.

mod bfs;
mod dfs;
mod filter;
mod peers;
mod printer;
mod state;
mod stats;
mod visitor;

pub use bfs::{BfsQuery, Expansion};
pub use dfs::{
    iterate_all, iterate_all_nodes, iterate_all_with_state, iterate_targets, DepthFirstIterator,
    Target, TargetFlags,
};
pub use filter::{find_module, DependencyFilter, FilteredVisitor};
pub use peers::{collect_peers, PeerCollector, PeersVisitor};
pub use printer::{print_tree, TreeLine, TreePrinter};
pub use state::{Frame, IterState};
pub use stats::{EntryStats, StatsVisitor};
pub use visitor::{NoReentry, Visitor, VisitorEntry};
