//! Process-wide compiler state and the loaded set
//!
//! Both are cheap handles over shared data. Every access is a short critical
//! section; no lock is ever held across an await.

use cinder_ast::Symbol;
use cinder_codegen::SourceMapTable;
use cinder_symbols::{NamespaceInfo, NamespaceRegistry};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct StateInner {
    namespaces: NamespaceRegistry,
    /// Unit name -> raw source map table
    source_maps: HashMap<String, SourceMapTable>,
    /// Dependencies whose analysis started but did not finish
    unfinished: HashSet<Symbol>,
}

/// Namespace registry and source-map registry shared by every operation of a
/// session
#[derive(Debug, Clone, Default)]
pub struct CompilerState {
    inner: Arc<RwLock<StateInner>>,
}

impl CompilerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the namespace registry
    pub fn with_namespaces<R>(&self, f: impl FnOnce(&NamespaceRegistry) -> R) -> R {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&inner.namespaces)
    }

    /// Mutate the namespace registry
    pub fn update_namespaces<R>(&self, f: impl FnOnce(&mut NamespaceRegistry) -> R) -> R {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner.namespaces)
    }

    pub fn namespace(&self, name: &Symbol) -> Option<NamespaceInfo> {
        self.with_namespaces(|registry| registry.get(name).cloned())
    }

    pub fn has_namespace(&self, name: &Symbol) -> bool {
        self.with_namespaces(|registry| registry.contains(name))
    }

    /// In the registry, and not left behind by a failed analysis
    pub fn is_analyzed(&self, name: &Symbol) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.namespaces.contains(name) && !inner.unfinished.contains(name)
    }

    /// Mark `name` as being analyzed. It stays unfinished until
    /// [`CompilerState::finish_analysis`] is called for it.
    pub fn begin_analysis(&self, name: Symbol) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unfinished
            .insert(name);
    }

    pub fn finish_analysis(&self, name: &Symbol) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unfinished
            .remove(name);
    }

    pub fn store_source_map(&self, unit: impl Into<String>, table: SourceMapTable) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .source_maps
            .insert(unit.into(), table);
    }

    pub fn source_map(&self, unit: &str) -> Option<SourceMapTable> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .source_maps
            .get(unit)
            .cloned()
    }
}

/// Namespaces whose load has completed. Macro namespaces are keyed by their
/// `$macros` name.
#[derive(Debug, Clone, Default)]
pub struct LoadedSet {
    inner: Arc<RwLock<HashSet<Symbol>>>,
}

impl LoadedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, ns: &Symbol) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(ns)
    }

    /// Returns false if `ns` was already present
    pub fn insert(&self, ns: Symbol) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ns)
    }

    pub fn remove(&self, ns: &Symbol) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(ns)
    }

    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Sorted copy of the current contents
    pub fn snapshot(&self) -> Vec<Symbol> {
        let mut names: Vec<Symbol> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
