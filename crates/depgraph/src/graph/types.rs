//! Core graph types: node ids, change flags and edge representations.

use bitflags::bitflags;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Dense index of a node slot.
///
/// `0` is the permanently reserved deleted sentinel, valid ids start at 1.
/// Ids are only meaningful between two compactions of the same graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The reserved sentinel slot.
    pub const INVALID: NodeId = NodeId(0);

    /// Wrap a raw slot index.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw slot index.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Slot index usable for vector access.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the sentinel id.
    ///
    /// This says nothing about the slot being tombstoned; ask the graph for that.
    pub const fn is_invalid(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Structural changes accumulated since the last [`mark_unchanged`] point.
    ///
    /// [`mark_unchanged`]: crate::graph::CompactGraph::mark_unchanged
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChangeFlags: u8 {
        /// An edge was appended
        const EDGE_ADDED = 1;
        /// A node was appended
        const NODE_ADDED = 2;
        /// An edge was tombstoned
        const EDGE_DELETED = 4;
        /// A node was tombstoned
        const NODE_DELETED = 8;
        /// Some live edge may point to or leave a tombstoned node
        const HANGING_EDGES = 16;
        /// Edge targets or order were rewritten in place
        const EDGE_CHANGED = 32;
    }
}

/// Payload stored in a node slot.
///
/// A node is deleted when its payload equals [`NodeValue::DELETED`].
pub trait NodeValue: Copy + PartialEq + fmt::Debug {
    /// Designated tombstone value.
    const DELETED: Self;

    /// True if this payload marks a tombstone.
    fn is_deleted(&self) -> bool {
        *self == Self::DELETED
    }
}

/// Physical representation of one outgoing edge.
pub trait EdgeStorage: Copy + fmt::Debug {
    /// Payload carried by the edge.
    type Value: Copy + PartialEq + fmt::Debug;

    /// Largest target id the representation can hold.
    const MAX_NODE_ID: u32;

    /// Build a live edge.
    fn new(to: NodeId, value: Self::Value) -> Self;

    /// Target slot, [`NodeId::INVALID`] once deleted.
    fn target(&self) -> NodeId;

    /// Redirect the edge.
    fn set_target(&mut self, to: NodeId);

    /// Edge payload.
    fn value(&self) -> Self::Value;

    /// Replace the edge payload.
    fn set_value(&mut self, value: Self::Value);

    /// True once the edge is tombstoned.
    fn is_deleted(&self) -> bool {
        self.target().is_invalid()
    }

    /// Tombstone the edge.
    fn delete(&mut self) {
        self.set_target(NodeId::INVALID);
    }
}

/// Unpacked `(target, value)` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlainEdge<V> {
    to: NodeId,
    value: V,
}

impl<V: Copy + PartialEq + fmt::Debug> EdgeStorage for PlainEdge<V> {
    type Value = V;
    const MAX_NODE_ID: u32 = u32::MAX;

    fn new(to: NodeId, value: V) -> Self {
        Self { to, value }
    }

    fn target(&self) -> NodeId {
        self.to
    }

    fn set_target(&mut self, to: NodeId) {
        self.to = to;
    }

    fn value(&self) -> V {
        self.value
    }

    fn set_value(&mut self, value: V) {
        self.value = value;
    }
}

/// Number of low bits of a packed edge word holding the target id.
pub const PACKED_ID_BITS: u32 = 28;

/// Number of high bits of a packed edge word holding the value.
pub const PACKED_VALUE_BITS: u32 = u32::BITS - PACKED_ID_BITS;

const PACKED_ID_MASK: u32 = (1 << PACKED_ID_BITS) - 1;

/// Small enumerations that fit the value field of a [`PackedEdge`].
pub trait PackedValue: Copy + PartialEq + fmt::Debug {
    /// Encode into at most [`PACKED_VALUE_BITS`] bits.
    fn to_bits(self) -> u32;

    /// Decode, `None` for bit patterns that name no value.
    fn from_bits(bits: u32) -> Option<Self>;
}

/// Edge packed into one `u32`: target in the low 28 bits, value above.
///
/// Deleting an edge zeroes the id field only, so the value of a tombstoned
/// edge stays readable.
pub struct PackedEdge<V> {
    word: u32,
    _value: PhantomData<fn() -> V>,
}

impl<V> PackedEdge<V> {
    /// Raw packed word, usable as a compact edge identity.
    pub fn representation(&self) -> u32 {
        self.word
    }
}

impl<V> Clone for PackedEdge<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for PackedEdge<V> {}

impl<V> PartialEq for PackedEdge<V> {
    fn eq(&self, other: &Self) -> bool {
        self.word == other.word
    }
}

impl<V> Eq for PackedEdge<V> {}

impl<V: PackedValue> EdgeStorage for PackedEdge<V> {
    type Value = V;
    const MAX_NODE_ID: u32 = PACKED_ID_MASK;

    fn new(to: NodeId, value: V) -> Self {
        assert!(
            to.get() <= PACKED_ID_MASK,
            "node id {to} does not fit into {PACKED_ID_BITS} bits"
        );
        let bits = value.to_bits();
        assert!(
            bits < (1 << PACKED_VALUE_BITS),
            "edge value {value:?} does not fit into {PACKED_VALUE_BITS} bits"
        );
        Self {
            word: (bits << PACKED_ID_BITS) | to.get(),
            _value: PhantomData,
        }
    }

    fn target(&self) -> NodeId {
        NodeId(self.word & PACKED_ID_MASK)
    }

    fn set_target(&mut self, to: NodeId) {
        assert!(
            to.get() <= PACKED_ID_MASK,
            "node id {to} does not fit into {PACKED_ID_BITS} bits"
        );
        self.word = (self.word & !PACKED_ID_MASK) | to.get();
    }

    fn value(&self) -> V {
        match V::from_bits(self.word >> PACKED_ID_BITS) {
            Some(value) => value,
            // Construction and deserialization both reject unknown bits.
            None => unreachable!("packed edge {:#x} carries no valid value", self.word),
        }
    }

    fn set_value(&mut self, value: V) {
        *self = Self::new(self.target(), value);
    }
}

impl<V: PackedValue> fmt::Debug for PackedEdge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedEdge")
            .field("to", &self.target())
            .field("value", &self.value())
            .finish()
    }
}

impl<V> Serialize for PackedEdge<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.word)
    }
}

impl<'de, V: PackedValue> Deserialize<'de> for PackedEdge<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let word = u32::deserialize(deserializer)?;
        if V::from_bits(word >> PACKED_ID_BITS).is_none() {
            return Err(de::Error::custom(format!(
                "edge word {word:#x} carries an unknown value"
            )));
        }
        Ok(Self {
            word,
            _value: PhantomData,
        })
    }
}
