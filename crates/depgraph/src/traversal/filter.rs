//! Edge filters over dependency shapes.

use super::state::IterState;
use super::visitor::Visitor;
use crate::dep_graph::{DepEdge, DepEdgeRef, DepShape, DepTreeNode};
use bitflags::bitflags;

bitflags! {
    /// Classes of dependency edges a traversal should not follow.
    ///
    /// The empty set follows everything.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DependencyFilter: u8 {
        /// Directory recursion
        const SKIP_RECURSES = 1;
        /// Module peers, through a directory or direct
        const SKIP_MODULES = 1 << 1;
        /// Tools of commands, through a directory or direct
        const SKIP_TOOLS = 1 << 2;
        /// Directory depends links
        const SKIP_DEPENDS = 1 << 3;
        /// Search directories added to commands
        const SKIP_ADDINCLS = 1 << 4;
    }
}

impl DependencyFilter {
    /// True if an edge of this shape should be followed.
    pub fn accepts_shape(&self, shape: &DepShape) -> bool {
        if self.contains(Self::SKIP_RECURSES) && shape.is_recurse() {
            return false;
        }
        if self.contains(Self::SKIP_DEPENDS) && shape.is_depends() {
            return false;
        }
        if self.contains(Self::SKIP_MODULES) && (shape.is_peerdir() || shape.is_direct_peerdir()) {
            return false;
        }
        if self.contains(Self::SKIP_TOOLS) && (shape.is_tooldir() || shape.is_direct_tool()) {
            return false;
        }
        !(self.contains(Self::SKIP_ADDINCLS) && shape.is_prop_to_dir_search())
    }

    /// True if `dep` should be followed.
    pub fn accepts(&self, dep: &DepEdgeRef<'_>) -> bool {
        self.accepts_shape(&DepShape::of(dep))
    }
}

/// Visitor that ANDs a [`DependencyFilter`] into another visitor's
/// `accept_dep`. The filter runs first.
#[derive(Debug, Clone)]
pub struct FilteredVisitor<V> {
    inner: V,
    filter: DependencyFilter,
}

impl<V> FilteredVisitor<V> {
    /// Wrap `inner`.
    pub fn new(inner: V, filter: DependencyFilter) -> Self {
        Self { inner, filter }
    }

    /// Wrapped visitor.
    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Unwrap.
    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<V: Visitor<DepTreeNode, DepEdge>> Visitor<DepTreeNode, DepEdge> for FilteredVisitor<V> {
    type FrameData = V::FrameData;

    fn enter(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, V::FrameData>) -> bool {
        self.inner.enter(state)
    }

    fn leave(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, V::FrameData>) {
        self.inner.leave(state);
    }

    fn left(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, V::FrameData>) {
        self.inner.left(state);
    }

    fn accept_dep(
        &mut self,
        state: &mut IterState<'_, DepTreeNode, DepEdge, V::FrameData>,
    ) -> bool {
        let passes = state.next_dep().is_some_and(|dep| self.filter.accepts(&dep));
        passes && self.inner.accept_dep(state)
    }
}

/// Index of the nearest module frame, searching from the top.
///
/// A lone frame has no enclosing module.
pub fn find_module<T: Default>(state: &IterState<'_, DepTreeNode, DepEdge, T>) -> Option<usize> {
    if state.len() < 2 {
        return None;
    }
    let graph = state.graph();
    state.find_recent(|frame| graph.get(frame.node()).value().kind.is_module())
}
