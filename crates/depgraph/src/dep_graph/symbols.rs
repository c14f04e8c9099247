//! Symbol tables backing node names.
//!
//! The graph never stores names. It keeps [`SymbolId`]s and asks a
//! [`SymbolTable`] to translate them. Files and directories share one
//! namespace, commands, properties and variables share the other.

use super::kinds::{NodeKind, SymbolId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Name interning used by the graph.
pub trait SymbolTable {
    /// Intern `name` in the namespace of `kind` and return its id.
    fn add_name(&mut self, kind: NodeKind, name: &str) -> SymbolId;

    /// Id of an already interned name.
    fn id_by_name(&self, kind: NodeKind, name: &str) -> Option<SymbolId>;

    /// Name behind an id.
    fn name_by_id(&self, kind: NodeKind, id: SymbolId) -> Option<&str>;
}

/// One interning namespace. Id 0 is never handed out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Namespace {
    names: Vec<String>,
    #[serde(skip)]
    index: FxHashMap<String, SymbolId>,
}

impl Namespace {
    fn add(&mut self, name: &str) -> SymbolId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        self.names.push(name.to_string());
        let id = SymbolId::new(self.names.len() as u32);
        self.index.insert(name.to_string(), id);
        id
    }

    fn get(&self, id: SymbolId) -> Option<&str> {
        let raw = id.get() as usize;
        if raw == 0 {
            return None;
        }
        self.names.get(raw - 1).map(String::as_str)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .names
            .iter()
            .enumerate()
            .map(|(pos, name)| (name.clone(), SymbolId::new(pos as u32 + 1)))
            .collect();
    }
}

/// In-memory [`SymbolTable`] with the two namespaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameStore {
    files: Namespace,
    commands: Namespace,
}

impl NameStore {
    /// Create empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of names in the namespace of `kind`.
    pub fn len(&self, kind: NodeKind) -> usize {
        self.namespace(kind).names.len()
    }

    /// True if both namespaces are empty.
    pub fn is_empty(&self) -> bool {
        self.files.names.is_empty() && self.commands.names.is_empty()
    }

    /// Restore lookup indexes after deserialization.
    pub fn rebuild_indexes(&mut self) {
        self.files.rebuild_index();
        self.commands.rebuild_index();
    }

    fn namespace(&self, kind: NodeKind) -> &Namespace {
        if kind.uses_file_id() {
            &self.files
        } else {
            &self.commands
        }
    }

    fn namespace_mut(&mut self, kind: NodeKind) -> &mut Namespace {
        if kind.uses_file_id() {
            &mut self.files
        } else {
            &mut self.commands
        }
    }
}

impl SymbolTable for NameStore {
    fn add_name(&mut self, kind: NodeKind, name: &str) -> SymbolId {
        self.namespace_mut(kind).add(name)
    }

    fn id_by_name(&self, kind: NodeKind, name: &str) -> Option<SymbolId> {
        self.namespace(kind).index.get(name).copied()
    }

    fn name_by_id(&self, kind: NodeKind, id: SymbolId) -> Option<&str> {
        self.namespace(kind).get(id)
    }
}
