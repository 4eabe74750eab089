//! Execution context and caller options

use crate::{CompilerState, DriverError, Evaluator, LoadedSet, Resolver, Toolchain};
use cinder_analyzer::AnalysisEnv;
use cinder_ast::{ExprContext, Reload, Symbol, DEFAULT_NS};
use cinder_reader::DataReaders;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied options for one public operation
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    /// Load or analyze declared dependencies
    pub analyze_deps: bool,
    /// Load namespaces named by macro requires
    pub load_macros: bool,
    /// Produce a source map for the unit
    pub source_map: bool,
    pub context: ExprContext,
    pub def_emits_var: bool,
    /// Log loading decisions at info level
    pub verbose: bool,
    /// Namespace the unit starts in
    pub ns: Symbol,
    /// Reload macro namespaces the unit redefines
    pub reload_macros: bool,
    #[serde(skip)]
    pub resolver: Option<Arc<dyn Resolver>>,
    #[serde(skip)]
    pub evaluator: Option<Arc<dyn Evaluator>>,
    #[serde(skip)]
    pub data_readers: DataReaders,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            analyze_deps: true,
            load_macros: true,
            source_map: false,
            context: ExprContext::Expr,
            def_emits_var: false,
            verbose: false,
            ns: Symbol::new(DEFAULT_NS),
            reload_macros: false,
            resolver: None,
            evaluator: None,
            data_readers: DataReaders::new(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_data_readers(mut self, data_readers: DataReaders) -> Self {
        self.data_readers = data_readers;
        self
    }

    pub fn with_source_map(mut self, source_map: bool) -> Self {
        self.source_map = source_map;
        self
    }

    pub fn with_ns(mut self, ns: impl Into<Symbol>) -> Self {
        self.ns = ns.into();
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("analyze_deps", &self.analyze_deps)
            .field("load_macros", &self.load_macros)
            .field("source_map", &self.source_map)
            .field("context", &self.context)
            .field("def_emits_var", &self.def_emits_var)
            .field("verbose", &self.verbose)
            .field("ns", &self.ns)
            .field("reload_macros", &self.reload_macros)
            .field("resolver", &self.resolver.is_some())
            .field("evaluator", &self.evaluator.is_some())
            .field("data_readers", &self.data_readers)
            .finish()
    }
}

/// Namespaces on the resolution call stack, outermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPath(Vec<Symbol>);

impl DependencyPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, ns: &Symbol) -> bool {
        self.0.contains(ns)
    }

    /// A new path with `ns` pushed
    pub fn push(&self, ns: Symbol) -> Self {
        let mut path = self.0.clone();
        path.push(ns);
        Self(path)
    }

    /// The path followed by `dep`, as reported for a cycle
    pub fn closed_by(&self, dep: &Symbol) -> Vec<Symbol> {
        let mut path = self.0.clone();
        path.push(dep.clone());
        path
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DependencyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ns) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", ns)?;
        }
        Ok(())
    }
}

/// Everything one operation needs, threaded explicitly through every step.
///
/// A context is never mutated once built; the `with_*`/`for_*` methods return
/// derived copies, so concurrent operations cannot observe each other's
/// namespace, path or reload state. Shared handles (state, loaded set,
/// capabilities) are reference counted.
#[derive(Clone)]
pub struct Context {
    pub state: CompilerState,
    pub loaded: LoadedSet,
    pub toolchain: Toolchain,
    pub resolver: Arc<dyn Resolver>,
    pub evaluator: Arc<dyn Evaluator>,
    pub data_readers: DataReaders,
    /// Active namespace
    pub ns: Symbol,
    pub analyze_deps: bool,
    pub load_macros: bool,
    pub reload_macros: bool,
    /// The unit being driven is a macro namespace
    pub macros_ns: bool,
    pub path: DependencyPath,
    /// Directive applied to the namespaces a top-level `require` names
    pub reload: Option<Reload>,
    pub source_map: bool,
    pub context: ExprContext,
    pub def_emits_var: bool,
    pub verbose: bool,
}

impl Context {
    /// Build a context from caller options layered over session defaults.
    /// Fails before any work if either capability is missing.
    pub fn new(
        state: CompilerState,
        loaded: LoadedSet,
        toolchain: Toolchain,
        options: &Options,
        default_resolver: Option<&Arc<dyn Resolver>>,
        default_evaluator: Option<&Arc<dyn Evaluator>>,
    ) -> Result<Self, DriverError> {
        let resolver = options
            .resolver
            .as_ref()
            .or(default_resolver)
            .cloned()
            .ok_or(DriverError::MissingCapability {
                capability: "resolver",
            })?;
        let evaluator = options
            .evaluator
            .as_ref()
            .or(default_evaluator)
            .cloned()
            .ok_or(DriverError::MissingCapability {
                capability: "evaluator",
            })?;

        Ok(Self {
            state,
            loaded,
            toolchain,
            resolver,
            evaluator,
            data_readers: options.data_readers.clone(),
            ns: options.ns.clone(),
            analyze_deps: options.analyze_deps,
            load_macros: options.load_macros,
            reload_macros: options.reload_macros,
            macros_ns: false,
            path: DependencyPath::new(),
            reload: None,
            source_map: options.source_map,
            context: options.context,
            def_emits_var: options.def_emits_var,
            verbose: options.verbose,
        })
    }

    pub fn with_ns(&self, ns: Symbol) -> Self {
        Self {
            ns,
            ..self.clone()
        }
    }

    pub fn with_path_entry(&self, ns: Symbol) -> Self {
        Self {
            path: self.path.push(ns),
            ..self.clone()
        }
    }

    pub fn with_reload(&self, reload: Option<Reload>) -> Self {
        Self {
            reload,
            ..self.clone()
        }
    }

    /// Context for driving a dependency's source: starts in the default
    /// namespace with caller-specific settings dropped
    pub fn for_dependency(&self, macros: bool) -> Self {
        Self {
            ns: Symbol::new(DEFAULT_NS),
            macros_ns: macros,
            reload: None,
            context: ExprContext::Expr,
            def_emits_var: false,
            ..self.clone()
        }
    }

    pub fn analysis_env(&self) -> AnalysisEnv {
        AnalysisEnv {
            ns: self.ns.clone(),
            context: self.context,
            def_emits_var: self.def_emits_var,
            macros_ns: self.macros_ns,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("ns", &self.ns)
            .field("path", &self.path)
            .field("reload", &self.reload)
            .field("macros_ns", &self.macros_ns)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evaluator_fn, StaticResolver};

    fn context(options: &Options) -> Result<Context, DriverError> {
        let resolver: Arc<dyn Resolver> = Arc::new(StaticResolver::new());
        let evaluator = evaluator_fn(|_| async { Ok(serde_json::Value::Null) });
        Context::new(
            CompilerState::new(),
            LoadedSet::new(),
            Toolchain::default(),
            options,
            Some(&resolver),
            Some(&evaluator),
        )
    }

    #[test]
    fn test_missing_capability() {
        let err = Context::new(
            CompilerState::new(),
            LoadedSet::new(),
            Toolchain::default(),
            &Options::default(),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err.code(), "E-CONFIG-001");
        assert!(err.to_string().contains("resolver"));
    }

    #[test]
    fn test_derived_contexts_leave_parent_untouched() {
        let options = Options {
            def_emits_var: true,
            ..Options::default()
        }
        .with_ns("app.core");
        let ctx = context(&options).unwrap();

        let child = ctx.with_path_entry(Symbol::new("a")).for_dependency(true);
        assert_eq!(child.ns.as_str(), DEFAULT_NS);
        assert!(child.macros_ns);
        assert!(!child.def_emits_var);
        assert_eq!(child.path.as_slice(), &[Symbol::new("a")]);

        assert_eq!(ctx.ns.as_str(), "app.core");
        assert!(ctx.path.is_empty());
        assert!(ctx.def_emits_var);
    }

    #[test]
    fn test_options_from_json() {
        let options: Options =
            serde_json::from_str(r#"{"source-map": true, "ns": "app.repl", "context": "statement"}"#).unwrap();
        assert!(options.source_map);
        assert!(options.analyze_deps);
        assert_eq!(options.ns.as_str(), "app.repl");
        assert_eq!(options.context, ExprContext::Statement);
    }

    #[test]
    fn test_path_display() {
        let path = DependencyPath::new().push(Symbol::new("a")).push(Symbol::new("b"));
        assert_eq!(path.to_string(), "a -> b");
        assert_eq!(path.closed_by(&Symbol::new("a")).len(), 3);
    }
}
