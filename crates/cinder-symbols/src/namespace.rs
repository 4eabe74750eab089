//! Namespace metadata

use cinder_ast::{NsDecl, Span, Symbol};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A definition interned in a namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefInfo {
    /// Fully qualified name, e.g. `app.core/main`
    pub name: Symbol,
    /// Defined with `defmacro`
    #[serde(default, rename = "macro")]
    pub is_macro: bool,
    #[serde(default)]
    pub span: Span,
}

/// Everything the analyzer knows about one namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub name: Symbol,
    /// Definitions by unqualified name, in definition order
    #[serde(default)]
    pub defs: IndexMap<String, DefInfo>,
    /// Libraries this namespace depends on, in declaration order
    #[serde(default)]
    pub deps: Vec<Symbol>,
    /// Alias -> lib
    #[serde(default)]
    pub requires: IndexMap<Symbol, Symbol>,
    /// Referred symbol -> lib
    #[serde(default)]
    pub uses: IndexMap<Symbol, Symbol>,
    /// Alias -> macro lib
    #[serde(default)]
    pub require_macros: IndexMap<Symbol, Symbol>,
    /// Referred macro -> macro lib
    #[serde(default)]
    pub use_macros: IndexMap<Symbol, Symbol>,
}

impl NamespaceInfo {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Replace the dependency tables with those of a declaration; defs are kept
    pub fn declare(&mut self, decl: &NsDecl) {
        self.deps = decl.deps.clone();
        self.requires = decl.requires.clone();
        self.uses = decl.uses.clone();
        self.require_macros = decl.require_macros.clone();
        self.use_macros = decl.use_macros.clone();
    }

    /// Intern a definition, returning its qualified name
    pub fn define(&mut self, name: &str, is_macro: bool, span: Span) -> Symbol {
        let qualified = Symbol::qualified(self.name.as_str(), name);
        self.defs.insert(
            name.to_string(),
            DefInfo {
                name: qualified.clone(),
                is_macro,
                span,
            },
        );
        qualified
    }

    pub fn defines(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn defines_macro(&self, name: &str) -> bool {
        self.defs.get(name).map(|d| d.is_macro).unwrap_or(false)
    }

    /// Resolve a require alias (or full lib name) to its lib
    pub fn resolve_alias(&self, alias: &str) -> Option<&Symbol> {
        self.requires
            .get(&Symbol::new(alias))
            .or_else(|| self.require_macros.get(&Symbol::new(alias)))
    }

    /// Macro and library namespaces this namespace needs loaded before it
    pub fn macro_deps(&self) -> Vec<Symbol> {
        NsDecl::macro_libs(&self.require_macros)
            .into_iter()
            .chain(NsDecl::macro_libs(&self.use_macros))
            .fold(Vec::new(), |mut libs, lib| {
                if !libs.contains(&lib) {
                    libs.push(lib);
                }
                libs
            })
    }

    /// Point references to `from` at `to`
    pub fn patch_alias(&mut self, from: &Symbol, to: &Symbol) {
        for lib in self
            .requires
            .values_mut()
            .chain(self.uses.values_mut())
            .chain(self.deps.iter_mut())
        {
            if lib == from {
                *lib = to.clone();
            }
        }
        // Keep `from` usable as an alias of `to`
        self.requires.insert(from.clone(), to.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_qualifies_names() {
        let mut info = NamespaceInfo::new(Symbol::new("app.core"));
        let name = info.define("main", false, Span::dummy());
        assert_eq!(name.as_str(), "app.core/main");
        assert!(info.defines("main"));
        assert!(!info.defines_macro("main"));

        info.define("when-let", true, Span::dummy());
        assert!(info.defines_macro("when-let"));
    }

    #[test]
    fn test_declare_keeps_defs() {
        let mut info = NamespaceInfo::new(Symbol::new("app.core"));
        info.define("x", false, Span::dummy());

        let mut decl = NsDecl::new(Symbol::new("app.core"));
        decl.add_dep(Symbol::new("app.util"));
        decl.requires
            .insert(Symbol::new("u"), Symbol::new("app.util"));
        info.declare(&decl);

        assert!(info.defines("x"));
        assert_eq!(info.deps, vec![Symbol::new("app.util")]);
        assert_eq!(
            info.resolve_alias("u"),
            Some(&Symbol::new("app.util"))
        );
    }

    #[test]
    fn test_patch_alias() {
        let mut info = NamespaceInfo::new(Symbol::new("app.core"));
        let from = Symbol::new("clojure.set");
        let to = Symbol::new("cljs.set");
        info.requires.insert(Symbol::new("set"), from.clone());
        info.deps.push(from.clone());

        info.patch_alias(&from, &to);

        assert_eq!(info.resolve_alias("set"), Some(&to));
        assert_eq!(info.resolve_alias("clojure.set"), Some(&to));
        assert_eq!(info.deps, vec![to]);
    }
}
