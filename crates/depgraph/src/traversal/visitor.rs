//! Visitor contract and the no-reentry base visitor.

use super::state::IterState;
use crate::graph::{EdgeStorage, NodeId, NodeValue};
use rustc_hash::FxHashMap;

/// Hooks called by [`DepthFirstIterator`](super::DepthFirstIterator).
///
/// The defaults accept everything, which only terminates on acyclic graphs.
/// Cyclic graphs need a visitor built on [`NoReentry`].
pub trait Visitor<N, E> {
    /// Payload stored on every frame.
    type FrameData: Default;

    /// A frame for the top node was just pushed. Returning `false` pops it
    /// again without visiting its edges.
    fn enter(&mut self, _state: &mut IterState<'_, N, E, Self::FrameData>) -> bool {
        true
    }

    /// The top frame is about to be popped, after a full visit or a denied
    /// [`enter`](Self::enter). Not called for invalid nodes.
    fn leave(&mut self, _state: &mut IterState<'_, N, E, Self::FrameData>) {}

    /// The child of the top frame was just popped.
    fn left(&mut self, _state: &mut IterState<'_, N, E, Self::FrameData>) {}

    /// Decide whether to descend through the edge under the top cursor.
    fn accept_dep(&mut self, _state: &mut IterState<'_, N, E, Self::FrameData>) -> bool {
        true
    }
}

/// Per-node record of a [`NoReentry`] visitor.
#[derive(Debug, Clone)]
pub struct VisitorEntry<R> {
    node: NodeId,
    in_stack: bool,
    /// Visitor-defined payload
    pub data: R,
}

impl<R> VisitorEntry<R> {
    /// Node this record belongs to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// True while the node is on the traversal stack.
    pub fn in_stack(&self) -> bool {
        self.in_stack
    }
}

/// No-reentry policy: every node is entered at most once.
///
/// Records live in an arena; the arena index is stored as the frame cookie
/// so that returning to a parent needs no map lookup. Visitors with extra
/// per-node data embed a `NoReentry<R>` and forward to it.
#[derive(Debug, Clone)]
pub struct NoReentry<R> {
    entries: Vec<VisitorEntry<R>>,
    index: FxHashMap<NodeId, usize>,
    current: Option<usize>,
}

impl<R> Default for NoReentry<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
            current: None,
        }
    }
}

impl<R: Default> NoReentry<R> {
    /// Create an empty visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every record.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.current = None;
    }

    /// Find or create the record of the top node and mark it in stack.
    ///
    /// Returns `true` only when the record was just created. Invalid nodes
    /// are refused and clear the current record.
    pub fn enter<N: NodeValue, E: EdgeStorage, T: Default>(
        &mut self,
        state: &mut IterState<'_, N, E, T>,
    ) -> bool {
        let node = state.top_node();
        if !node.is_valid() {
            self.current = None;
            return false;
        }
        let id = node.id();
        let (slot, fresh) = match self.index.get(&id) {
            Some(&slot) => (slot, false),
            None => {
                let slot = self.entries.len();
                self.entries.push(VisitorEntry {
                    node: id,
                    in_stack: false,
                    data: R::default(),
                });
                self.index.insert(id, slot);
                (slot, true)
            }
        };
        self.entries[slot].in_stack = true;
        self.current = Some(slot);
        if let Some(top) = state.top_mut() {
            top.set_cookie(slot);
        }
        fresh
    }

    /// Clear the in-stack mark of the current record.
    pub fn leave(&mut self) {
        if let Some(slot) = self.current {
            self.entries[slot].in_stack = false;
        }
    }

    /// Make the record of the new top frame current.
    pub fn left<N: NodeValue, E: EdgeStorage, T: Default>(
        &mut self,
        state: &IterState<'_, N, E, T>,
    ) {
        self.current = state.top().and_then(|frame| frame.cookie());
    }

    /// Accept edges to nodes never seen or not on the stack.
    pub fn accept_dep<N: NodeValue, E: EdgeStorage, T: Default>(
        &self,
        state: &IterState<'_, N, E, T>,
    ) -> bool {
        let Some(dep) = state.next_dep() else {
            return false;
        };
        self.entry(dep.to_id()).map_or(true, |entry| !entry.in_stack)
    }

    /// Record of the node on top of the stack.
    pub fn current(&self) -> Option<&VisitorEntry<R>> {
        self.current.map(|slot| &self.entries[slot])
    }

    /// Mutable record of the node on top of the stack.
    pub fn current_mut(&mut self) -> Option<&mut VisitorEntry<R>> {
        let slot = self.current?;
        self.entries.get_mut(slot)
    }

    /// Arena index of the current record.
    pub fn current_slot(&self) -> Option<usize> {
        self.current
    }

    /// Record of a node, if it was ever entered.
    pub fn entry(&self, node: NodeId) -> Option<&VisitorEntry<R>> {
        self.index.get(&node).map(|&slot| &self.entries[slot])
    }

    /// Mutable record of a node.
    pub fn entry_mut(&mut self, node: NodeId) -> Option<&mut VisitorEntry<R>> {
        let slot = *self.index.get(&node)?;
        self.entries.get_mut(slot)
    }

    /// Record by arena index, as stored in frame cookies.
    pub fn entry_at(&self, slot: usize) -> Option<&VisitorEntry<R>> {
        self.entries.get(slot)
    }

    /// Mutable record by arena index.
    pub fn entry_at_mut(&mut self, slot: usize) -> Option<&mut VisitorEntry<R>> {
        self.entries.get_mut(slot)
    }

    /// All records in first-visit order.
    pub fn entries(&self) -> &[VisitorEntry<R>] {
        &self.entries
    }

    /// Number of distinct nodes entered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no node was entered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: NodeValue, E: EdgeStorage, R: Default> Visitor<N, E> for NoReentry<R> {
    type FrameData = ();

    fn enter(&mut self, state: &mut IterState<'_, N, E, ()>) -> bool {
        NoReentry::enter(self, state)
    }

    fn leave(&mut self, _state: &mut IterState<'_, N, E, ()>) {
        NoReentry::leave(self);
    }

    fn left(&mut self, state: &mut IterState<'_, N, E, ()>) {
        NoReentry::left(self, state);
    }

    fn accept_dep(&mut self, state: &mut IterState<'_, N, E, ()>) -> bool {
        NoReentry::accept_dep(self, state)
    }
}
