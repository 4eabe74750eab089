//! Dependency resolution engine
//!
//! Loads (or only analyzes) a namespace's declared dependencies one after
//! the other. Each dependency is fully resolved, transitive dependencies
//! included, before the next sibling starts.
//!
//! The loaded-set check and the insert after a load are separate critical
//! sections: two units racing on the same namespace may both resolve it.

use crate::macros::load_macros;
use crate::unit::{analyze_unit, eval_unit};
use crate::{CapabilityError, Context, DriverError, EvalRequest, Language, ResolveRequest, Resource};
use cinder_ast::{Reload, ReloadDirectives, Symbol};
use cinder_symbols::NamespaceInfo;
use futures_util::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use log::{debug, info};

/// What to do with a resolved `clj` dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Evaluate it and record it as loaded
    Load,
    /// Only analyze it into the namespace registry
    AnalyzeOnly,
}

/// Requested lib -> lib actually loaded in its place
pub type Aliases = IndexMap<Symbol, Symbol>;

/// Resolve `deps` of `requester` in order.
///
/// Fails without resolving anything if a dependency is already on
/// `ctx.path`, which ends with `requester` when called for a declaration.
/// Returns the `clojure.*` libs that were loaded under their `cljs.*` names.
pub fn resolve_deps(
    ctx: Context,
    requester: Symbol,
    deps: Vec<Symbol>,
    directives: ReloadDirectives,
    mode: Mode,
) -> BoxFuture<'static, Result<Aliases, DriverError>> {
    async move {
        if let Some(dep) = deps.iter().find(|dep| ctx.path.contains(dep)) {
            return Err(DriverError::circular(ctx.path.closed_by(dep)));
        }
        debug!("{}: resolving {} dependencies ({:?})", requester, deps.len(), mode);

        let mut aliases = Aliases::new();
        let mut cleared = false;
        for dep in deps {
            let directive = directives
                .libs
                .get(&dep)
                .copied()
                .or(directives.clause)
                .or(ctx.reload);
            match directive {
                Some(Reload::Reload) => {
                    ctx.loaded.remove(&dep);
                }
                Some(Reload::ReloadAll) if !cleared => {
                    ctx.loaded.clear();
                    cleared = true;
                }
                _ => {}
            }

            if let Some(loaded_as) = require_dep(&ctx, &requester, &dep, directive.is_some(), mode).await? {
                aliases.insert(dep, loaded_as);
            }
        }
        Ok(aliases)
    }
    .boxed()
}

/// Bring one dependency in. Returns the name it was loaded under when that
/// differs from `dep`.
async fn require_dep(
    ctx: &Context,
    requester: &Symbol,
    dep: &Symbol,
    reloading: bool,
    mode: Mode,
) -> Result<Option<Symbol>, DriverError> {
    if is_present(ctx, dep, reloading, mode) {
        debug!("{}: {} already present", requester, dep);
        return Ok(None);
    }
    if load_namespace(ctx.clone(), dep.clone(), false, mode).await? {
        return Ok(None);
    }

    // `clojure.x` falls back to `cljs.x`
    if let Some(alt) = cljs_fallback(dep) {
        if ctx.path.contains(&alt) {
            return Err(DriverError::circular(ctx.path.closed_by(&alt)));
        }
        let found = is_present(ctx, &alt, reloading, mode)
            || load_namespace(ctx.clone(), alt.clone(), false, mode).await?;
        if found {
            if ctx.verbose {
                info!("Aliasing {} to {} in {}", dep, alt, requester);
            }
            ctx.state
                .update_namespaces(|registry| registry.patch_alias(requester, dep, &alt));
            return Ok(Some(alt));
        }
    }

    Err(DriverError::UndeclaredNamespace {
        requester: requester.clone(),
        ns: dep.clone(),
        macros: false,
    })
}

/// A failed analysis leaves a partial registry entry behind; that entry does
/// not count.
fn is_present(ctx: &Context, dep: &Symbol, reloading: bool, mode: Mode) -> bool {
    ctx.loaded.contains(dep)
        || (mode == Mode::AnalyzeOnly && !reloading && ctx.state.is_analyzed(dep))
}

fn cljs_fallback(dep: &Symbol) -> Option<Symbol> {
    dep.as_str()
        .strip_prefix("clojure.")
        .map(|rest| Symbol::new(format!("cljs.{}", rest)))
}

/// Resolve `name` and drive its source. Returns false when the resolver has
/// nothing for it.
///
/// A `clj` resource is evaluated (Load) or only analyzed (AnalyzeOnly). A `js`
/// resource is always evaluated and recorded as loaded.
pub(crate) fn load_namespace(
    ctx: Context,
    name: Symbol,
    macros: bool,
    mode: Mode,
) -> BoxFuture<'static, Result<bool, DriverError>> {
    async move {
        let key = if macros { name.macros_ns() } else { name.clone() };
        let request = ResolveRequest {
            name: name.clone(),
            macros,
            path: name.relpath(),
        };
        if ctx.verbose {
            info!("Loading {} from {}", key, request.path);
        }

        let resource = ctx
            .resolver
            .resolve(request)
            .await
            .map_err(|err| DriverError::capability("resolver", key.as_str(), err))?;
        let Some(resource) = resource else {
            debug!("{} not found", key);
            return Ok(false);
        };

        let language = Language::parse(&resource.language).ok_or_else(|| DriverError::InvalidLanguage {
            ns: key.clone(),
            language: resource.language.clone(),
        })?;

        match language {
            Language::Clj => {
                let unit = resource.name.unwrap_or_else(|| key.to_string());
                let dep_ctx = ctx.for_dependency(macros);
                ctx.state.begin_analysis(key.clone());
                match mode {
                    Mode::Load => {
                        eval_unit(dep_ctx, resource.source, unit).await?;
                    }
                    Mode::AnalyzeOnly => analyze_unit(dep_ctx, resource.source, unit).await?,
                }
                ctx.state.finish_analysis(&key);
                if mode == Mode::Load {
                    ctx.loaded.insert(key);
                }
            }
            Language::Js => load_js(&ctx, key, resource).await?,
        }
        Ok(true)
    }
    .boxed()
}

/// Evaluate a foreign resource, loading what its analysis cache declares first
async fn load_js(ctx: &Context, key: Symbol, resource: Resource) -> Result<(), DriverError> {
    if let Some(cache) = &resource.cache {
        load_cache_deps(ctx, &key, cache).await?;
    }

    debug!("evaluating js resource {}", key);
    ctx.evaluator
        .evaluate(EvalRequest {
            language: Language::Js,
            name: key.to_string(),
            source: resource.source,
            path: resource.path,
        })
        .await
        .map_err(|err: CapabilityError| DriverError::capability("evaluator", key.as_str(), err))?;

    if let Some(cache) = resource.cache {
        ctx.state.update_namespaces(|registry| registry.merge(cache));
    }
    if let Some(table) = resource.source_map {
        ctx.state.store_source_map(key.as_str(), table);
    }
    ctx.loaded.insert(key);
    Ok(())
}

/// Macro namespaces, then library namespaces, named by an analysis cache
async fn load_cache_deps(ctx: &Context, key: &Symbol, cache: &NamespaceInfo) -> Result<(), DriverError> {
    let ctx = ctx.with_path_entry(key.clone());
    let macro_libs = cache.macro_deps();
    if !macro_libs.is_empty() {
        load_macros(ctx.clone(), key.clone(), macro_libs, ReloadDirectives::default()).await?;
    }
    if !cache.deps.is_empty() {
        resolve_deps(
            ctx,
            key.clone(),
            cache.deps.clone(),
            ReloadDirectives::default(),
            Mode::Load,
        )
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cljs_fallback() {
        assert_eq!(
            cljs_fallback(&Symbol::new("clojure.string")),
            Some(Symbol::new("cljs.string"))
        );
        assert_eq!(cljs_fallback(&Symbol::new("app.core")), None);
    }
}
