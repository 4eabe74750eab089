//! Caller-facing operations

use crate::deps::{resolve_deps, Mode};
use crate::unit::{analyze_unit, compile_unit, eval_form, eval_unit};
use crate::{CompilerState, Context, DriverError, Evaluated, Evaluator, LoadedSet, Options, Resolver, Toolchain};
use cinder_ast::{Form, Reload, ReloadDirectives, Symbol};
use cinder_symbols::NamespaceInfo;
use serde_json::Value;
use std::sync::Arc;

/// Unit name used when the caller does not give one
pub const ANONYMOUS_UNIT: &str = "anonymous";

/// A compiler session: one compiler state and loaded set shared by every
/// operation, plus default capabilities.
///
/// Cloning a session shares its state. Operations may run concurrently; each
/// builds its own [`Context`].
#[derive(Clone, Default)]
pub struct Session {
    state: CompilerState,
    loaded: LoadedSet,
    toolchain: Toolchain,
    resolver: Option<Arc<dyn Resolver>>,
    evaluator: Option<Arc<dyn Evaluator>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default resolver for operations whose options carry none
    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Default evaluator for operations whose options carry none
    pub fn with_evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn state(&self) -> &CompilerState {
        &self.state
    }

    pub fn loaded(&self) -> &LoadedSet {
        &self.loaded
    }

    fn context(&self, options: &Options) -> Result<Context, DriverError> {
        Context::new(
            self.state.clone(),
            self.loaded.clone(),
            self.toolchain.clone(),
            options,
            self.resolver.as_ref(),
            self.evaluator.as_ref(),
        )
    }

    fn unit_name(name: Option<&str>) -> String {
        name.unwrap_or(ANONYMOUS_UNIT).to_string()
    }

    /// Analyze a unit, populating the namespace registry. Dependencies are
    /// analyzed, not evaluated.
    pub async fn analyze(&self, source: &str, name: Option<&str>, options: &Options) -> Result<(), DriverError> {
        let ctx = self.context(options)?;
        analyze_unit(ctx, source.to_string(), Self::unit_name(name)).await
    }

    /// Compile a unit to JavaScript
    pub async fn compile(&self, source: &str, name: Option<&str>, options: &Options) -> Result<String, DriverError> {
        let ctx = self.context(options)?;
        compile_unit(ctx, source.to_string(), Self::unit_name(name)).await
    }

    /// Evaluate a unit, loading its dependencies
    pub async fn eval_str(&self, source: &str, name: Option<&str>, options: &Options) -> Result<Evaluated, DriverError> {
        let ctx = self.context(options)?;
        eval_unit(ctx, source.to_string(), Self::unit_name(name)).await
    }

    /// Evaluate one already-read form in `options.ns`
    pub async fn eval_form(&self, form: Form, options: &Options) -> Result<Value, DriverError> {
        let ctx = self.context(options)?;
        let evaluated = eval_form(ctx, form, ANONYMOUS_UNIT.to_string()).await?;
        Ok(evaluated.value)
    }

    /// Load a namespace by name, as `(require 'ns :reload)` does at a REPL
    pub async fn require(&self, ns: Symbol, reload: Option<Reload>, options: &Options) -> Result<(), DriverError> {
        let ctx = self.context(options)?.with_reload(reload);
        let requester = ctx.ns.clone();
        resolve_deps(ctx, requester, vec![ns], ReloadDirectives::default(), Mode::Load).await?;
        Ok(())
    }

    /// Install precomputed analysis for a namespace
    pub fn load_analysis_cache(&self, ns: Symbol, mut info: NamespaceInfo) {
        info.name = ns;
        self.state.update_namespaces(|registry| registry.merge(info));
    }
}
