//! Node and dependency kinds of the build graph.

use crate::graph::{NodeValue, PackedValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a build graph node.
///
/// Discriminants are part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum NodeKind {
    /// Tombstone
    Deleted = 0,
    /// Source file that exists and is parsed
    File = 1,
    /// File referenced but not found
    MissingFile = 2,
    /// Generated or otherwise unparsed file
    NonParsedFile = 3,
    /// Executable module
    Program = 4,
    /// Library module
    Library = 5,
    /// Dynamic library or other bundled module
    Bundle = 6,
    /// Build description file of a directory
    MakeFile = 7,
    /// Project directory
    Directory = 8,
    /// Directory referenced but not found
    MissingDir = 9,
    /// Directory outside of the project
    NonProjDir = 10,
    /// Command producing outputs
    BuildCommand = 11,
    /// Command whose text could not be resolved
    UnknownCommand = 12,
    /// Named property attached to a node
    Property = 13,
    /// Variable consumed by commands
    BuildVariable = 14,
}

impl NodeKind {
    /// All kinds in discriminant order.
    pub const ALL: [NodeKind; 15] = [
        NodeKind::Deleted,
        NodeKind::File,
        NodeKind::MissingFile,
        NodeKind::NonParsedFile,
        NodeKind::Program,
        NodeKind::Library,
        NodeKind::Bundle,
        NodeKind::MakeFile,
        NodeKind::Directory,
        NodeKind::MissingDir,
        NodeKind::NonProjDir,
        NodeKind::BuildCommand,
        NodeKind::UnknownCommand,
        NodeKind::Property,
        NodeKind::BuildVariable,
    ];

    fn raw(self) -> u8 {
        self as u8
    }

    /// A real file with a timestamp.
    pub fn is_file(self) -> bool {
        (1..=7).contains(&self.raw())
    }

    /// A plain source file of any language, located in the tree or generated.
    pub fn is_src_file(self) -> bool {
        (1..=3).contains(&self.raw())
    }

    /// A directory of any flavour.
    pub fn is_dir(self) -> bool {
        (8..=10).contains(&self.raw())
    }

    /// Directory that is missing or outside of the project.
    pub fn is_invalid_dir(self) -> bool {
        matches!(self, NodeKind::MissingDir | NodeKind::NonProjDir)
    }

    /// Program, library or bundle.
    pub fn is_module(self) -> bool {
        (4..=6).contains(&self.raw())
    }

    /// Build description file.
    pub fn is_makefile(self) -> bool {
        self == NodeKind::MakeFile
    }

    /// May be the output of a command.
    pub fn is_output(self) -> bool {
        (3..=6).contains(&self.raw())
    }

    /// Property node.
    pub fn is_property(self) -> bool {
        self == NodeKind::Property
    }

    /// Symbol id lives in the file namespace (files and directories).
    pub fn uses_file_id(self) -> bool {
        (1..=10).contains(&self.raw())
    }

    /// Coarse bucket used for re-typing checks.
    pub fn class(self) -> NodeClass {
        match self {
            NodeKind::Deleted => NodeClass::Deleted,
            NodeKind::File | NodeKind::MissingFile | NodeKind::NonParsedFile | NodeKind::MakeFile => {
                NodeClass::AnyFile
            }
            NodeKind::Directory | NodeKind::MissingDir | NodeKind::NonProjDir => {
                NodeClass::AnyDirectory
            }
            NodeKind::Program | NodeKind::Library | NodeKind::Bundle => NodeClass::AnyModule,
            NodeKind::BuildCommand | NodeKind::UnknownCommand | NodeKind::BuildVariable => {
                NodeClass::AnyCommand
            }
            NodeKind::Property => NodeClass::Property,
        }
    }

    /// True if a node of kind `self` may be re-typed to `other`.
    pub fn is_type_compatible_with(self, other: NodeKind) -> bool {
        self.class() == other.class()
    }
}

impl From<NodeKind> for u8 {
    fn from(kind: NodeKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for NodeKind {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        NodeKind::ALL
            .get(raw as usize)
            .copied()
            .ok_or_else(|| format!("unknown node kind {raw}"))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Coarse grouping of [`NodeKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// Tombstone
    Deleted,
    /// Any file kind, makefiles included
    AnyFile,
    /// Any directory kind
    AnyDirectory,
    /// Any module kind
    AnyModule,
    /// Commands and variables
    AnyCommand,
    /// Properties
    Property,
}

/// Kind of a dependency edge.
///
/// Discriminants are part of the packed edge word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum DependencyKind {
    /// Inclusion: header, peer directory, tool directory
    Include = 1,
    /// Source the target is built from
    BuildFrom = 2,
    /// Command building the source node
    BuildCommand = 3,
    /// Source directory or module search path
    Search = 4,
    /// Global include directory or global object
    Search2 = 5,
    /// Property link, only meaningful during graph build or update
    Property = 6,
    /// Additional output to main output
    OutTogether = 8,
    /// Main output to additional output
    OutTogetherBack = 9,
    /// Service kind grouping deps of one type
    Group = 10,
}

impl DependencyKind {
    /// All kinds in discriminant order.
    pub const ALL: [DependencyKind; 9] = [
        DependencyKind::Include,
        DependencyKind::BuildFrom,
        DependencyKind::BuildCommand,
        DependencyKind::Search,
        DependencyKind::Search2,
        DependencyKind::Property,
        DependencyKind::OutTogether,
        DependencyKind::OutTogetherBack,
        DependencyKind::Group,
    ];
}

impl PackedValue for DependencyKind {
    fn to_bits(self) -> u32 {
        self as u32
    }

    fn from_bits(bits: u32) -> Option<Self> {
        DependencyKind::ALL
            .iter()
            .copied()
            .find(|kind| *kind as u32 == bits)
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Id of a name inside one symbol namespace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Placeholder id, never assigned to a name.
    pub const NONE: SymbolId = SymbolId(0);

    /// Wrap a raw id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a build graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepTreeNode {
    /// Node kind
    pub kind: NodeKind,
    /// Symbol id in the namespace selected by `kind`
    pub elem_id: SymbolId,
}

impl DepTreeNode {
    /// Build a payload.
    pub fn new(kind: NodeKind, elem_id: SymbolId) -> Self {
        Self { kind, elem_id }
    }

    /// Namespace-qualified key of the payload.
    pub fn cache_id(&self) -> CacheId {
        CacheId::new(self.kind, self.elem_id)
    }
}

impl NodeValue for DepTreeNode {
    const DELETED: Self = DepTreeNode {
        kind: NodeKind::Deleted,
        elem_id: SymbolId::NONE,
    };

    fn is_deleted(&self) -> bool {
        self.kind == NodeKind::Deleted
    }
}

/// Symbol id qualified by its namespace: bit 63 is set for the command namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheId(u64);

const COMMAND_BIT: u64 = 1 << 63;

impl CacheId {
    /// Key of `elem_id` in the namespace of `kind`.
    pub fn new(kind: NodeKind, elem_id: SymbolId) -> Self {
        let namespace = if kind.uses_file_id() { 0 } else { COMMAND_BIT };
        Self(namespace | u64::from(elem_id.get()))
    }

    /// Key of a file-namespace id.
    pub fn file(elem_id: SymbolId) -> Self {
        Self(u64::from(elem_id.get()))
    }

    /// True for the file namespace.
    pub fn is_file(self) -> bool {
        self.0 & COMMAND_BIT == 0
    }

    /// Symbol id without the namespace bit.
    pub fn elem_id(self) -> SymbolId {
        SymbolId((self.0 & !COMMAND_BIT) as u32)
    }

    /// Raw packed value.
    pub fn get(self) -> u64 {
        self.0
    }
}
