//! Indented dependency tree rendering for diagnostics.

use super::dfs::iterate_all;
use super::filter::DependencyFilter;
use super::state::IterState;
use super::visitor::{NoReentry, Visitor};
use crate::dep_graph::{DepCompactGraph, DepEdge, DepTreeNode, DependencyKind, SymbolTable};
use crate::graph::NodeId;
use std::fmt;

/// One printed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    /// Nesting level, 0 for the start node
    pub depth: usize,
    /// Kind of the edge the node was reached through
    pub dep: Option<DependencyKind>,
    /// Resolved node name
    pub name: String,
    /// The node was already expanded elsewhere
    pub repeated: bool,
}

impl fmt::Display for TreeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            f.write_str("  ")?;
        }
        if let Some(dep) = self.dep {
            write!(f, "[{dep}] ")?;
        }
        f.write_str(&self.name)?;
        if self.repeated {
            f.write_str(" *")?;
        }
        Ok(())
    }
}

/// No-reentry visitor recording one line per visited edge.
///
/// Rendered through `Display`, lines look like `  [Include] $S/util/a.h`,
/// indented two spaces per level. A node reached again is printed with a
/// trailing ` *` and not expanded.
pub struct TreePrinter<'n> {
    base: NoReentry<()>,
    names: &'n dyn SymbolTable,
    filter: DependencyFilter,
    lines: Vec<TreeLine>,
}

impl<'n> TreePrinter<'n> {
    /// Create a printer resolving names through `names`.
    pub fn new(names: &'n dyn SymbolTable, filter: DependencyFilter) -> Self {
        Self {
            base: NoReentry::new(),
            names,
            filter,
            lines: Vec::new(),
        }
    }

    /// Lines recorded so far.
    pub fn lines(&self) -> &[TreeLine] {
        &self.lines
    }

    fn name_of(&self, node: DepTreeNode) -> String {
        self.names
            .name_by_id(node.kind, node.elem_id)
            .map_or_else(|| format!("<unnamed {} {}>", node.kind, node.elem_id), str::to_string)
    }
}

impl fmt::Display for TreePrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl Visitor<DepTreeNode, DepEdge> for TreePrinter<'_> {
    type FrameData = ();

    fn enter(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, ()>) -> bool {
        let fresh = self.base.enter(state);
        let node = state.top_node();
        if !node.is_valid() {
            return false;
        }
        let line = TreeLine {
            depth: state.len() - 1,
            dep: state.incoming_dep().map(|dep| dep.value()),
            name: self.name_of(node.value()),
            repeated: !fresh,
        };
        self.lines.push(line);
        fresh
    }

    fn leave(&mut self, _state: &mut IterState<'_, DepTreeNode, DepEdge, ()>) {
        self.base.leave();
    }

    fn left(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, ()>) {
        self.base.left(state);
    }

    fn accept_dep(&mut self, state: &mut IterState<'_, DepTreeNode, DepEdge, ()>) -> bool {
        let passes = state.next_dep().is_some_and(|dep| self.filter.accepts(&dep));
        passes && self.base.accept_dep(state)
    }
}

/// Render the dependency tree below `start`.
pub fn print_tree(
    graph: &DepCompactGraph,
    names: &dyn SymbolTable,
    start: NodeId,
    filter: DependencyFilter,
) -> String {
    let mut printer = TreePrinter::new(names, filter);
    iterate_all(graph, start, &mut printer);
    printer.to_string()
}
