//! Explicit traversal stack.

use crate::graph::{CompactGraph, EdgeRef, EdgeStorage, NodeId, NodeRef, NodeValue};

/// One stack frame: a node on the current path and its edge cursor.
///
/// The cursor always sits on a valid edge or at the end of the edge list.
#[derive(Debug, Clone)]
pub struct Frame<T> {
    node: NodeId,
    cursor: usize,
    accepted: bool,
    is_start: bool,
    cookie: Option<usize>,
    /// Visitor-defined payload
    pub data: T,
}

impl<T> Frame<T> {
    /// Node of this frame.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Raw index of the edge that will be visited next.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True once the edge under the cursor was accepted and descended into.
    ///
    /// Frames below the top always hold an accepted edge. The top one does
    /// during `leave` and `left` only.
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// True for the frame a traversal started from on an empty stack.
    pub fn is_start(&self) -> bool {
        self.is_start
    }

    /// Visitor record attached on enter, if any.
    pub fn cookie(&self) -> Option<usize> {
        self.cookie
    }

    /// Attach a visitor record.
    pub fn set_cookie(&mut self, cookie: usize) {
        self.cookie = Some(cookie);
    }
}

/// Stack of frames of a depth-first traversal over one graph.
///
/// A state may be shared by nested traversals: each one only pops the
/// frames it pushed.
#[derive(Debug)]
pub struct IterState<'g, N, E, T> {
    graph: &'g CompactGraph<N, E>,
    stack: Vec<Frame<T>>,
}

impl<'g, N: NodeValue, E: EdgeStorage, T: Default> IterState<'g, N, E, T> {
    /// Empty state over `graph`.
    pub fn new(graph: &'g CompactGraph<N, E>) -> Self {
        Self {
            graph,
            stack: Vec::new(),
        }
    }

    /// Graph being traversed.
    pub fn graph(&self) -> &'g CompactGraph<N, E> {
        self.graph
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// True if no frame is on the stack.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Frames from bottom to top.
    pub fn frames(&self) -> &[Frame<T>] {
        &self.stack
    }

    /// Mutable frames from bottom to top.
    pub fn frames_mut(&mut self) -> &mut [Frame<T>] {
        &mut self.stack
    }

    /// Topmost frame.
    pub fn top(&self) -> Option<&Frame<T>> {
        self.stack.last()
    }

    /// Topmost frame, mutable.
    pub fn top_mut(&mut self) -> Option<&mut Frame<T>> {
        self.stack.last_mut()
    }

    /// Frame right below the top.
    pub fn parent(&self) -> Option<&Frame<T>> {
        self.stack.len().checked_sub(2).map(|i| &self.stack[i])
    }

    /// Frame right below the top, mutable.
    pub fn parent_mut(&mut self) -> Option<&mut Frame<T>> {
        let index = self.stack.len().checked_sub(2)?;
        self.stack.get_mut(index)
    }

    /// Node of the topmost frame, the invalid handle on an empty stack.
    pub fn top_node(&self) -> NodeRef<'g, N, E> {
        self.graph
            .get(self.top().map_or(NodeId::INVALID, |frame| frame.node))
    }

    /// Node of the frame below the top, the invalid handle if there is none.
    pub fn parent_node(&self) -> NodeRef<'g, N, E> {
        self.graph
            .get(self.parent().map_or(NodeId::INVALID, |frame| frame.node))
    }

    /// Edge under the top cursor, the one that will be visited next.
    pub fn next_dep(&self) -> Option<EdgeRef<'g, N, E>> {
        self.stack.len().checked_sub(1).and_then(|top| self.frame_dep(top))
    }

    /// Edge under the cursor of frame `index`.
    ///
    /// For frames below the top this is the edge leading to the frame
    /// above.
    pub fn frame_dep(&self, index: usize) -> Option<EdgeRef<'g, N, E>> {
        let frame = self.stack.get(index)?;
        (frame.cursor < self.graph.raw_edge_count(frame.node))
            .then(|| self.graph.edge_ref(frame.node, frame.cursor))
    }

    /// Edge that led to the top node.
    ///
    /// `None` for the first frame of a traversal, including a nested one.
    pub fn incoming_dep(&self) -> Option<EdgeRef<'g, N, E>> {
        let parent = self.parent()?;
        parent
            .accepted
            .then(|| self.graph.edge_ref(parent.node, parent.cursor))
    }

    /// Index of the topmost frame matching `pred`, searching downwards.
    pub fn find_recent<P>(&self, mut pred: P) -> Option<usize>
    where
        P: FnMut(&Frame<T>) -> bool,
    {
        self.stack.iter().rposition(|frame| pred(frame))
    }

    pub(crate) fn push(&mut self, node: NodeId) {
        let is_start = self.stack.is_empty();
        self.stack.push(Frame {
            node,
            cursor: self.graph.next_valid_edge(node, 0),
            accepted: false,
            is_start,
            cookie: None,
            data: T::default(),
        });
    }

    pub(crate) fn pop(&mut self) -> Option<Frame<T>> {
        self.stack.pop()
    }

    /// Move the top cursor to the next valid edge and clear its acceptance.
    pub(crate) fn advance(&mut self) {
        let graph = self.graph;
        if let Some(top) = self.stack.last_mut() {
            top.cursor = graph.next_valid_edge(top.node, top.cursor + 1);
            top.accepted = false;
        }
    }

    pub(crate) fn accept_top(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            top.accepted = true;
        }
    }

    /// True if the top frame is live and its cursor names a live edge.
    pub(crate) fn is_dep(&self) -> bool {
        let Some(top) = self.top() else {
            return false;
        };
        self.graph.contains(top.node)
            && top.cursor < self.graph.raw_edge_count(top.node)
            && self.graph.edge_is_valid(top.node, top.cursor)
            && self.graph.contains(self.graph.edge_ref(top.node, top.cursor).to_id())
    }
}
