use crate::error::{GraphError, Result};
use crate::traversal::DependencyFilter;
use serde::{Deserialize, Serialize};

/// Options of dependency dumps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpOptions {
    /// Do not follow directory recursion
    pub skip_recurses: bool,

    /// Do not follow directory depends links
    pub skip_depends: bool,

    /// Do not follow tool links
    pub skip_tools: bool,

    /// Do not follow search directories added to commands
    pub skip_addincls: bool,

    /// Follow peers of modules, not only the modules themselves
    pub dump_indirect_peerdirs: bool,

    /// Dump the subgraphs under added search directories
    pub dump_addincls_subgraphs: bool,
}

impl DumpOptions {
    /// Filter for the main dump traversal.
    ///
    /// Module peers and directory recursion are always skipped unless
    /// indirect peers were asked for.
    pub fn skip_flags(&self) -> DependencyFilter {
        let mut flags = DependencyFilter::empty();
        flags.set(DependencyFilter::SKIP_RECURSES, self.skip_recurses);
        flags.set(DependencyFilter::SKIP_DEPENDS, self.skip_depends);
        flags.set(DependencyFilter::SKIP_TOOLS, self.skip_tools);
        flags.set(DependencyFilter::SKIP_ADDINCLS, self.skip_addincls);
        if !self.dump_indirect_peerdirs {
            flags |= DependencyFilter::SKIP_MODULES | DependencyFilter::SKIP_RECURSES;
        }
        flags
    }

    /// Filter for nested subgraph dumps.
    pub fn subgraph_skip_flags(&self) -> DependencyFilter {
        if self.dump_addincls_subgraphs {
            DependencyFilter::empty()
        } else {
            DependencyFilter::SKIP_ADDINCLS
        }
    }
}

/// Configuration for loop detection and dumps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepGraphConfig {
    /// Treat a loop through an `OutTogether` link as a real loop.
    ///
    /// When unset, a path that leaves a node through `OutTogether` and
    /// continues through anything but `BuildFrom` or `Include` does not
    /// close a loop.
    pub out_together_is_loop: bool,

    /// Delete modules caught in loops that break the build
    pub remove_bad_loops: bool,

    /// Dump options
    pub dump: DumpOptions,
}

impl Default for DepGraphConfig {
    fn default() -> Self {
        Self {
            out_together_is_loop: false,
            remove_bad_loops: true,
            dump: DumpOptions::default(),
        }
    }
}

impl DepGraphConfig {
    /// Create config that reports loops without touching the graph
    pub fn report_only() -> Self {
        Self {
            remove_bad_loops: false,
            ..Default::default()
        }
    }

    /// Create config that counts every loop, `OutTogether` ones included
    pub fn strict() -> Self {
        Self {
            out_together_is_loop: true,
            ..Default::default()
        }
    }

    /// Set the `OutTogether` loop policy
    pub fn with_out_together_is_loop(mut self, enabled: bool) -> Self {
        self.out_together_is_loop = enabled;
        self
    }

    /// Enable or disable bad loop removal
    pub fn with_remove_bad_loops(mut self, enabled: bool) -> Self {
        self.remove_bad_loops = enabled;
        self
    }

    /// Set dump options
    pub fn with_dump(mut self, dump: DumpOptions) -> Self {
        self.dump = dump;
        self
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GraphError::serialization("Failed to encode config", Some(e)))
    }

    /// Decode from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| GraphError::serialization("Failed to decode config", Some(e)))
    }
}
