//! Depth-first loop search with overlapping loops glued together.

use super::glued::GluedLoops;
use super::LoopId;
use crate::dep_graph::{DepEdge, DepShape, DepTreeNode, DependencyKind};
use crate::graph::NodeId;
use crate::traversal::{IterState, NoReentry, Visitor};
use log::{debug, trace};
use rustc_hash::FxHashMap;

type State<'g> = IterState<'g, DepTreeNode, DepEdge, ()>;

/// Per-node record: raw loop id, if the node is on some loop.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LoopRecord {
    loop_id: Option<usize>,
}

/// Loops found by a search, numbered densely from 1.
#[derive(Debug, Default)]
pub(crate) struct CollectedLoops {
    pub(crate) node_loop: FxHashMap<NodeId, LoopId>,
    /// Members of loop `n` at index `n - 1`, ascending node ids
    pub(crate) loops: Vec<Vec<NodeId>>,
}

/// A path leaving through `OutTogether` closes a loop only when the next
/// link is `BuildFrom` or `Include`.
fn is_not_cycle(curr: DependencyKind, next: DependencyKind) -> bool {
    curr == DependencyKind::OutTogether
        && next != DependencyKind::BuildFrom
        && next != DependencyKind::Include
}

/// No-reentry visitor marking every node on a loop of loop-generating edges.
///
/// A loop is detected when an edge reaches a node that is on the stack, or
/// a node already marked with a loop that some frame on the stack also
/// belongs to. All frames from that node up to the top get the loop id;
/// ids met on the way are glued into one.
pub(crate) struct LoopSearcher {
    base: NoReentry<LoopRecord>,
    glued: GluedLoops,
    out_together_is_loop: bool,
}

impl LoopSearcher {
    pub(crate) fn new(out_together_is_loop: bool) -> Self {
        Self {
            base: NoReentry::new(),
            glued: GluedLoops::new(),
            out_together_is_loop,
        }
    }

    fn frame_loop(&self, state: &State<'_>, index: usize) -> Option<usize> {
        let cookie = state.frames()[index].cookie()?;
        self.base.entry_at(cookie)?.data.loop_id
    }

    /// Walk the path from the top down to `loop_start`. Returns `false` if
    /// an `OutTogether` link not followed by a build link breaks it.
    fn path_is_cycle(&self, state: &State<'_>, last: DependencyKind, loop_start: NodeId) -> bool {
        if self.out_together_is_loop {
            return true;
        }
        let mut curr = last;
        for index in (0..state.len().saturating_sub(1)).rev() {
            let Some(edge) = state.frame_dep(index) else {
                break;
            };
            let next = curr;
            curr = edge.value();
            if is_not_cycle(curr, next) {
                trace!(
                    "{} --OutTogether--> {} --{next}--> ... is not a loop",
                    edge.from_id(),
                    edge.to_id()
                );
                return false;
            }
            if edge.from_id() == loop_start {
                return !is_not_cycle(last, curr);
            }
        }
        true
    }

    fn mark_loop(&mut self, state: &State<'_>, loop_start: NodeId) {
        let mut loop_id = None;
        let mut start_index = None;
        for index in (0..state.len()).rev() {
            if let Some(id) = self.frame_loop(state, index) {
                match loop_id {
                    None => loop_id = Some(id),
                    Some(first) => self.glued.join_loops(first, id),
                }
            }
            if state.frames()[index].node() == loop_start {
                start_index = Some(index);
                break;
            }
        }
        debug_assert!(start_index.is_some(), "loop start {loop_start} is not on the stack");
        let Some(start_index) = start_index else {
            return;
        };
        let loop_id = loop_id.unwrap_or_else(|| self.glued.add_loop());
        for frame in &state.frames()[start_index..] {
            if let Some(entry) = frame.cookie().and_then(|c| self.base.entry_at_mut(c)) {
                entry.data.loop_id = Some(loop_id);
            }
        }
    }

    /// Number the glued loops densely, in order of their raw root ids.
    pub(crate) fn collect_loops(mut self) -> CollectedLoops {
        let mut members: Vec<(usize, NodeId)> = Vec::new();
        for entry in self.base.entries() {
            if let Some(id) = entry.data.loop_id {
                members.push((self.glued.get_loop_id(id), entry.node()));
            }
        }
        if members.is_empty() {
            return CollectedLoops::default();
        }
        members.sort_unstable();

        let mut collected = CollectedLoops::default();
        let mut current_root = None;
        for &(root, node) in &members {
            if current_root != Some(root) {
                current_root = Some(root);
                collected.loops.push(Vec::new());
            }
            let number = collected.loops.len();
            collected.node_loop.insert(node, LoopId::new(number as u32));
            if let Some(loop_nodes) = collected.loops.last_mut() {
                loop_nodes.push(node);
            }
        }
        debug!(
            "Found {} loops, with {} elements (of {} total nodes)",
            collected.loops.len(),
            members.len(),
            self.base.len()
        );
        collected
    }
}

impl Visitor<DepTreeNode, DepEdge> for LoopSearcher {
    type FrameData = ();

    fn enter(&mut self, state: &mut State<'_>) -> bool {
        self.base.enter(state)
    }

    fn leave(&mut self, _state: &mut State<'_>) {
        self.base.leave();
    }

    fn left(&mut self, state: &mut State<'_>) {
        self.base.left(state);
    }

    fn accept_dep(&mut self, state: &mut State<'_>) -> bool {
        let Some(dep) = state.next_dep() else {
            return false;
        };
        if !DepShape::of(&dep).is_loop_gen() {
            return false;
        }
        let target = dep.to_id();
        let Some(entry) = self.base.entry(target) else {
            return true;
        };
        let in_stack = entry.in_stack();
        let known_loop = entry.data.loop_id;
        // Seen targets are never entered again; what is left is bookkeeping.
        if !in_stack && known_loop.is_none() {
            return false;
        }
        if target == dep.from_id() {
            return false;
        }

        let mut loop_start = target;
        if !in_stack {
            let Some(known_loop) = known_loop else {
                return false;
            };
            let known_root = self.glued.get_loop_id(known_loop);
            let base = &self.base;
            let glued = &mut self.glued;
            let found = state.find_recent(|frame| {
                frame
                    .cookie()
                    .and_then(|cookie| base.entry_at(cookie))
                    .and_then(|entry| entry.data.loop_id)
                    .is_some_and(|id| glued.get_loop_id(id) == known_root)
            });
            let Some(index) = found else {
                return false;
            };
            loop_start = state.frames()[index].node();
            trace!("Previous entrance in loop on {loop_start}");
        } else if !self.path_is_cycle(state, dep.value(), loop_start) {
            return false;
        }

        self.mark_loop(state, loop_start);
        false
    }
}
