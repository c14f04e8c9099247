//! Generic compact graph: storage, handles and identifiers.

mod compact;
mod handles;
mod types;

pub use compact::{CompactGraph, NodeRemap};
pub use handles::{EdgeMut, EdgeRef, Edges, NodeMut, NodeRef, Nodes};
pub use types::{
    ChangeFlags, EdgeStorage, NodeId, NodeValue, PackedEdge, PackedValue, PlainEdge,
    PACKED_ID_BITS, PACKED_VALUE_BITS,
};
