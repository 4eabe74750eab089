//! Namespace registry data structure

use crate::NamespaceInfo;
use cinder_ast::{NsDecl, Span, Symbol};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// All namespaces known to a compiler state, keyed by name.
///
/// Macro namespaces are stored under their `$macros` name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceRegistry {
    namespaces: IndexMap<Symbol, NamespaceInfo>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &Symbol) -> Option<&NamespaceInfo> {
        self.namespaces.get(name)
    }

    pub fn get_mut(&mut self, name: &Symbol) -> Option<&mut NamespaceInfo> {
        self.namespaces.get_mut(name)
    }

    pub fn contains(&self, name: &Symbol) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Get a namespace, creating an empty entry if it is unknown
    pub fn entry(&mut self, name: &Symbol) -> &mut NamespaceInfo {
        self.namespaces
            .entry(name.clone())
            .or_insert_with(|| NamespaceInfo::new(name.clone()))
    }

    /// Record a declaration, keeping any defs already interned
    pub fn declare(&mut self, decl: &NsDecl) -> &mut NamespaceInfo {
        let info = self.entry(&decl.name);
        info.declare(decl);
        info
    }

    /// Intern a def in `ns`, returning its qualified name
    pub fn define(&mut self, ns: &Symbol, name: &str, is_macro: bool, span: Span) -> Symbol {
        self.entry(ns).define(name, is_macro, span)
    }

    /// Replace a namespace wholesale
    pub fn insert(&mut self, info: NamespaceInfo) -> Option<NamespaceInfo> {
        self.namespaces.insert(info.name.clone(), info)
    }

    /// Merge a precomputed analysis cache. Defs from the cache win; dependency
    /// tables are taken from the cache when it has any.
    pub fn merge(&mut self, cache: NamespaceInfo) {
        match self.namespaces.get_mut(&cache.name) {
            Some(existing) => {
                existing.defs.extend(cache.defs);
                if !cache.deps.is_empty() {
                    existing.deps = cache.deps;
                }
                existing.requires.extend(cache.requires);
                existing.uses.extend(cache.uses);
                existing.require_macros.extend(cache.require_macros);
                existing.use_macros.extend(cache.use_macros);
            }
            None => {
                self.namespaces.insert(cache.name.clone(), cache);
            }
        }
    }

    /// Rewrite `ns`'s references from `from` to `to`. Returns false when `ns`
    /// is unknown.
    pub fn patch_alias(&mut self, ns: &Symbol, from: &Symbol, to: &Symbol) -> bool {
        match self.namespaces.get_mut(ns) {
            Some(info) => {
                info.patch_alias(from, to);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &Symbol) -> Option<NamespaceInfo> {
        self.namespaces.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &Symbol> {
        self.namespaces.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamespaceInfo> {
        self.namespaces.values()
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}
