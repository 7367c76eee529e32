//! Shared type definitions for the luapack crate
//!
//! This module contains the types passed between the resolver, the bundle
//! traversal and the orchestrator, so none of them has to depend on another
//! just for a data definition.

use std::hash::BuildHasherDefault;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Type alias for FxHasher-based IndexSet
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// A module that has been loaded, scanned for imports and wrapped
///
/// Created once per module name and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Direct `require` targets in order of first textual occurrence.
    /// Duplicates are kept.
    pub dependencies: Vec<String>,
    /// The module body rewritten as a `package.preload` registration
    pub wrapped: String,
}

/// Resolution cache keyed by module name
///
/// The cache is owned by the caller and handed to every bundle operation, so
/// one run over many entry scripts resolves each shared module only once.
/// A name that failed to resolve is never stored.
#[derive(Debug, Clone, Default)]
pub struct ModuleCache {
    modules: FxIndexMap<String, ResolvedModule>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedModule> {
        self.modules.get(name)
    }

    /// Store a resolved module. An existing entry is kept as-is.
    pub fn insert(&mut self, name: impl Into<String>, module: ResolvedModule) {
        self.modules.entry(name.into()).or_insert(module);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// An import that could not be resolved while bundling an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedImport {
    /// The module name that failed to load
    pub module: String,
    /// The entry script whose bundle requested it
    pub requested_by: String,
}

impl std::fmt::Display for UnresolvedImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unresolvable import in file \"{}\": {}",
            self.requested_by, self.module
        )
    }
}

/// Result of bundling one entry script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOutput {
    /// The concatenated bundle text
    pub text: String,
    /// Every module wrapped into the bundle, in resolution order
    pub modules: Vec<String>,
    /// One report per failed resolution attempt
    pub unresolved: Vec<UnresolvedImport>,
}

impl BundleOutput {
    /// Whether every import reachable from the entry was resolved
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}
