//! Disjoint-set over raw loop ids.

/// Raw loop ids handed out while searching, glued together when loops
/// overlap.
///
/// Union by rank with path compression.
#[derive(Debug, Clone, Default)]
pub struct GluedLoops {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl GluedLoops {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh loop that is its own root.
    pub fn add_loop(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        id
    }

    /// Root of `id`, compressing the path on the way.
    pub fn get_loop_id(&mut self, id: usize) -> usize {
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut walk = id;
        while self.parent[walk] != root {
            let next = self.parent[walk];
            self.parent[walk] = root;
            walk = next;
        }
        root
    }

    /// Glue the loops of `first` and `second`.
    pub fn join_loops(&mut self, first: usize, second: usize) {
        let mut first = self.get_loop_id(first);
        let mut second = self.get_loop_id(second);
        if first == second {
            return;
        }
        if self.rank[first] < self.rank[second] {
            std::mem::swap(&mut first, &mut second);
        } else if self.rank[first] == self.rank[second] {
            self.rank[first] += 1;
        }
        self.parent[second] = first;
    }

    /// Number of raw ids handed out.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// True if no loop was allocated.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}
