//! Classification of dependency edges by `(from kind, dep kind, to kind)`.
//!
//! These predicates are the vocabulary of traversal filters and of loop
//! classification. Each one looks only at the kinds of the two endpoints and
//! at the dependency kind.

use super::kinds::{DependencyKind, NodeKind};
use super::{DepEdgeRef, DepNodeRef};
use crate::graph::NodeId;

/// Kinds of an edge and of both its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepShape {
    /// Kind of the source node
    pub from: NodeKind,
    /// Dependency kind
    pub dep: DependencyKind,
    /// Kind of the target node
    pub to: NodeKind,
}

impl DepShape {
    /// Build a shape from its parts.
    pub fn new(from: NodeKind, dep: DependencyKind, to: NodeKind) -> Self {
        Self { from, dep, to }
    }

    /// Shape of a stored edge.
    pub fn of(edge: &DepEdgeRef<'_>) -> Self {
        Self {
            from: edge.from().value().kind,
            dep: edge.value(),
            to: edge.to().value().kind,
        }
    }

    fn dep_in(&self, kinds: &[DependencyKind]) -> bool {
        kinds.contains(&self.dep)
    }

    /// Directory into a sub-directory by `Include`, `BuildFrom` or `Search`.
    pub fn is_recurse(&self) -> bool {
        use DependencyKind::*;
        self.from == NodeKind::Directory
            && self.dep_in(&[Include, BuildFrom, Search])
            && self.to.is_dir()
    }

    /// Directory into a directory it depends on (`BuildFrom`).
    pub fn is_depends(&self) -> bool {
        self.from == NodeKind::Directory
            && self.dep == DependencyKind::BuildFrom
            && self.to.is_dir()
    }

    /// Recurse edge that is not a depends edge.
    pub fn is_pure_recurse(&self) -> bool {
        use DependencyKind::*;
        self.from == NodeKind::Directory && self.dep_in(&[Include, Search]) && self.to.is_dir()
    }

    /// Directory into a test sub-directory (`Search`).
    pub fn is_test_recurse(&self) -> bool {
        self.from == NodeKind::Directory
            && self.dep == DependencyKind::Search
            && self.to.is_dir()
    }

    /// Module straight to a peer module.
    pub fn is_direct_peerdir(&self) -> bool {
        use DependencyKind::*;
        self.from.is_module() && self.to.is_module() && self.dep_in(&[Include, BuildFrom])
    }

    /// Module to the directory of a peer.
    pub fn is_peerdir(&self) -> bool {
        use DependencyKind::*;
        self.from.is_module() && self.to.is_dir() && self.dep_in(&[Include, BuildFrom])
    }

    /// Command to the directory of a tool.
    pub fn is_tooldir(&self) -> bool {
        self.from == NodeKind::BuildCommand
            && self.dep == DependencyKind::Include
            && self.to == NodeKind::Directory
    }

    /// Command straight to a tool module.
    pub fn is_direct_tool(&self) -> bool {
        self.from == NodeKind::BuildCommand
            && self.dep == DependencyKind::Include
            && self.to.is_module()
    }

    /// Module to a global source file.
    pub fn is_global_src(&self) -> bool {
        self.from.is_module() && self.dep == DependencyKind::Search2 && self.to.is_file()
    }

    /// Any search edge into a directory.
    pub fn is_search_dir(&self) -> bool {
        use DependencyKind::*;
        self.dep_in(&[Search, Search2]) && self.to.is_dir()
    }

    /// Search directory attached through a command property, as added by addincls.
    pub fn is_prop_to_dir_search(&self) -> bool {
        self.from == NodeKind::BuildCommand && self.is_search_dir()
    }

    /// Generated file a module is built from.
    pub fn is_module_own_node(&self) -> bool {
        use DependencyKind::*;
        let may_own = self.dep_in(&[BuildFrom, OutTogether, OutTogetherBack])
            || (self.from.is_module() && self.dep_in(&[Search, Search2]));
        may_own && self.to == NodeKind::NonParsedFile
    }

    /// Generated or source file a module is built from.
    pub fn is_module_src(&self) -> bool {
        use DependencyKind::*;
        if self.from == NodeKind::File {
            return false;
        }
        let src = self.dep_in(&[BuildFrom, OutTogether, OutTogetherBack])
            || (self.from.is_module() && self.dep == Search);
        src && matches!(self.to, NodeKind::NonParsedFile | NodeKind::File)
    }

    /// File built from a command whose properties list the real sources.
    pub fn is_indirect_src(&self) -> bool {
        self.from.is_file()
            && self.dep == DependencyKind::BuildFrom
            && self.to == NodeKind::BuildCommand
    }

    /// Directory to the module it defines.
    pub fn is_dir_to_module(&self) -> bool {
        self.from == NodeKind::Directory
            && self.dep == DependencyKind::Include
            && self.to.is_module()
    }

    /// Command included into another command.
    pub fn is_inner_command(&self) -> bool {
        self.from == NodeKind::BuildCommand
            && self.dep == DependencyKind::Include
            && self.to == NodeKind::BuildCommand
    }

    /// File to a variable local to its command.
    pub fn is_local_variable(&self) -> bool {
        self.from.is_file()
            && self.dep == DependencyKind::BuildCommand
            && self.to == NodeKind::BuildVariable
    }

    /// File to the command that builds it.
    pub fn is_build_command(&self) -> bool {
        self.from.is_file()
            && self.dep == DependencyKind::BuildCommand
            && self.to == NodeKind::BuildCommand
    }

    /// Property link to a property or command node.
    pub fn is_property(&self) -> bool {
        self.dep == DependencyKind::Property
            && matches!(self.to, NodeKind::Property | NodeKind::BuildCommand)
    }

    /// Property link of a module.
    pub fn is_module_property(&self) -> bool {
        self.from.is_module() && self.is_property()
    }

    /// Property link of a makefile to a command.
    pub fn is_makefile_property(&self) -> bool {
        self.from == NodeKind::MakeFile
            && self.dep == DependencyKind::Property
            && self.to == NodeKind::BuildCommand
    }

    /// Source file including another source file.
    pub fn is_include_file(&self) -> bool {
        self.from.is_src_file() && self.dep == DependencyKind::Include && self.to.is_src_file()
    }

    /// Makefile including a source file.
    pub fn is_makefile_include(&self) -> bool {
        self.from == NodeKind::MakeFile
            && self.dep == DependencyKind::Include
            && self.to.is_src_file()
    }

    /// Property link pointing at a source file.
    pub fn is_property_file(&self) -> bool {
        self.dep == DependencyKind::Property && self.to.is_src_file()
    }

    /// Module or generated file including a command.
    pub fn is_build_cmd_inclusion(&self) -> bool {
        (self.from.is_module() || self.from == NodeKind::NonParsedFile)
            && self.dep == DependencyKind::Include
            && self.to == NodeKind::BuildCommand
    }

    /// Edge that may close a loop that matters.
    ///
    /// Search links, back links of multi-output commands, properties,
    /// non-global `Search2` links and directory recursion never count.
    pub fn is_loop_gen(&self) -> bool {
        use DependencyKind::*;
        if self.dep_in(&[Search, OutTogetherBack, Property]) {
            return false;
        }
        if self.dep == Search2 && !self.is_global_src() {
            return false;
        }
        !self.is_recurse()
    }
}

/// Target of the first `OutTogether` edge of `node`, the invalid id if none.
pub fn out_together_dependency(node: &DepNodeRef<'_>) -> NodeId {
    node.edges()
        .find(|edge| edge.value() == DependencyKind::OutTogether)
        .map_or(NodeId::INVALID, |edge| edge.to_id())
}

/// Target of the first `dep` edge of `node` leading to a `kind` node.
pub fn dep_node_with_kind(node: &DepNodeRef<'_>, dep: DependencyKind, kind: NodeKind) -> NodeId {
    node.edges()
        .find(|edge| edge.value() == dep && edge.to().value().kind == kind)
        .map_or(NodeId::INVALID, |edge| edge.to_id())
}
