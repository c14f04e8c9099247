//! Per-file side data kept next to the graph.

use serde::{Deserialize, Serialize};

/// Induced-dependency bookkeeping of one file symbol.
///
/// Keyed by the file's [`SymbolId`](super::SymbolId), so it outlives node
/// tombstoning and compaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct FileNodeData {
    /// Modification stamp used to order induced dependency processing
    pub mod_stamp: u8,
    /// Induced includes are propagated through this file
    pub pass_induced_includes_through_files: bool,
    /// Induced dependencies stop at this file
    pub pass_no_induced_deps: bool,
}

const PASS_INDUCED_INCLUDES: u16 = 1 << 8;
const PASS_NO_INDUCED_DEPS: u16 = 1 << 9;

impl From<FileNodeData> for u16 {
    fn from(data: FileNodeData) -> u16 {
        let mut packed = u16::from(data.mod_stamp);
        if data.pass_induced_includes_through_files {
            packed |= PASS_INDUCED_INCLUDES;
        }
        if data.pass_no_induced_deps {
            packed |= PASS_NO_INDUCED_DEPS;
        }
        packed
    }
}

impl From<u16> for FileNodeData {
    fn from(packed: u16) -> Self {
        Self {
            mod_stamp: (packed & 0xff) as u8,
            pass_induced_includes_through_files: packed & PASS_INDUCED_INCLUDES != 0,
            pass_no_induced_deps: packed & PASS_NO_INDUCED_DEPS != 0,
        }
    }
}
