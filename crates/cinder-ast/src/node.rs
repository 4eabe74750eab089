//! Analyzed syntax tree nodes

use crate::{Form, Position, Span, Symbol};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Position of an expression relative to its enclosing code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExprContext {
    /// Value is discarded
    Statement,
    /// Value is used
    #[default]
    Expr,
    /// Value is returned from the enclosing function
    Return,
}

/// An annotated syntax tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub context: ExprContext,
    pub span: Span,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Namespace declaration
    Ns(NsDecl),
    /// Global definition; `name` is fully qualified
    Def {
        name: Symbol,
        init: Option<Box<Node>>,
        /// Emit a var object as the value of the def
        emits_var: bool,
    },
    Fn {
        name: Option<Symbol>,
        params: Vec<Symbol>,
        variadic: Option<Symbol>,
        body: Vec<Node>,
    },
    Let {
        bindings: Vec<(Symbol, Node)>,
        body: Vec<Node>,
    },
    If {
        test: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    Do(Vec<Node>),
    Invoke {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    /// Reference to a global, fully qualified (`js/...` for host globals)
    Var(Symbol),
    Local(Symbol),
    /// Literal or quoted data
    Const(Form),
    Vector(Vec<Node>),
    Map(Vec<(Node, Node)>),
    Set(Vec<Node>),
}

impl Node {
    pub fn new(kind: NodeKind, context: ExprContext, span: Span, pos: Position) -> Self {
        Self {
            kind,
            context,
            span,
            pos,
        }
    }

    pub fn as_ns(&self) -> Option<&NsDecl> {
        match &self.kind {
            NodeKind::Ns(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn is_ns(&self) -> bool {
        matches!(self.kind, NodeKind::Ns(_))
    }
}

/// Reload directive attached to a require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reload {
    /// Reload just this namespace
    Reload,
    /// Forget every loaded namespace, reloading the whole graph
    ReloadAll,
}

/// Reload directives for one family of requires
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadDirectives {
    /// Directive given for a whole clause, e.g. `(:require a b :reload)`
    pub clause: Option<Reload>,
    /// Directives attached to one lib, e.g. `[a :as x :reload]`
    pub libs: IndexMap<Symbol, Reload>,
}

impl ReloadDirectives {
    pub fn is_empty(&self) -> bool {
        self.clause.is_none() && self.libs.is_empty()
    }
}

/// The analyzed form of an `ns` declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NsDecl {
    pub name: Symbol,
    /// Libraries to load, in declaration order, without duplicates
    pub deps: Vec<Symbol>,
    /// Referred symbol -> lib, from `:use` and `:refer`
    pub uses: IndexMap<Symbol, Symbol>,
    /// Alias -> lib; each lib also maps to itself
    pub requires: IndexMap<Symbol, Symbol>,
    /// Referred macro -> macro lib
    pub use_macros: IndexMap<Symbol, Symbol>,
    /// Alias -> macro lib; each lib also maps to itself
    pub require_macros: IndexMap<Symbol, Symbol>,
    /// Directives for ordinary requires
    pub reload: ReloadDirectives,
    /// Directives for macro requires
    pub macro_reload: ReloadDirectives,
}

impl NsDecl {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Add a dependency, keeping first-occurrence order
    pub fn add_dep(&mut self, lib: Symbol) {
        if !self.deps.contains(&lib) {
            self.deps.push(lib);
        }
    }

    /// Distinct libs of a macro map, in map order
    pub fn macro_libs(map: &IndexMap<Symbol, Symbol>) -> Vec<Symbol> {
        let mut libs: Vec<Symbol> = Vec::new();
        for lib in map.values() {
            if !libs.contains(lib) {
                libs.push(lib.clone());
            }
        }
        libs
    }

    /// Point every reference to `from` at `to`, after `from` was loaded under
    /// a different name
    pub fn rewrite_lib(&mut self, from: &Symbol, to: &Symbol) {
        for dep in self.deps.iter_mut() {
            if dep == from {
                *dep = to.clone();
            }
        }
        for lib in self.uses.values_mut().chain(self.requires.values_mut()) {
            if lib == from {
                *lib = to.clone();
            }
        }
        if let Some(reload) = self.reload.libs.shift_remove(from) {
            self.reload.libs.insert(to.clone(), reload);
        }
    }
}
