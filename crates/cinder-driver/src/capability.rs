//! Host capabilities: the resolver and the evaluator
//!
//! These are the only places the driver suspends. A capability future may
//! complete immediately or after any amount of deferral; the driver never
//! times out or cancels one. Wrap a capability in [`Timeout`] to bound it.

use cinder_ast::Symbol;
use cinder_codegen::SourceMapTable;
use cinder_symbols::NamespaceInfo;
use futures_util::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a host capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("{0}")]
    Failed(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl CapabilityError {
    pub fn failed(message: impl Into<String>) -> Self {
        CapabilityError::Failed(message.into())
    }
}

/// Request to locate a namespace's source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub name: Symbol,
    /// The namespace is wanted for its macros
    pub macros: bool,
    /// Relative module path, e.g. `app/core_util` for `app.core-util`
    pub path: String,
}

/// Source language of a resolved resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Clj,
    Js,
}

impl Language {
    pub fn parse(tag: &str) -> Option<Language> {
        match tag {
            "clj" => Some(Language::Clj),
            "js" => Some(Language::Js),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Clj => "clj",
            Language::Js => "js",
        }
    }
}

/// A resolved namespace source
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// `"clj"` or `"js"`; anything else is rejected by the driver
    pub language: String,
    pub source: String,
    /// Unit name to drive the source under; defaults to the namespace name
    pub name: Option<String>,
    /// Where the source came from
    pub path: Option<String>,
    /// Precomputed analysis for a `js` resource
    pub cache: Option<NamespaceInfo>,
    /// Precomputed source map for a `js` resource
    pub source_map: Option<SourceMapTable>,
}

impl Resource {
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
            name: None,
            path: None,
            cache: None,
            source_map: None,
        }
    }

    pub fn clj(source: impl Into<String>) -> Self {
        Self::new(Language::Clj.as_str(), source)
    }

    pub fn js(source: impl Into<String>) -> Self {
        Self::new(Language::Js.as_str(), source)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_cache(mut self, cache: NamespaceInfo) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_source_map(mut self, table: SourceMapTable) -> Self {
        self.source_map = Some(table);
        self
    }
}

/// Request to evaluate JavaScript in the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRequest {
    /// `Clj` for emitted chunks, `Js` for foreign resources
    pub language: Language,
    /// Namespace or unit the source belongs to
    pub name: String,
    pub source: String,
    pub path: Option<String>,
}

/// Maps a namespace name to its source
pub trait Resolver: Send + Sync {
    fn resolve(&self, request: ResolveRequest)
        -> BoxFuture<'static, Result<Option<Resource>, CapabilityError>>;
}

/// Executes JavaScript and returns its value
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, request: EvalRequest) -> BoxFuture<'static, Result<Value, CapabilityError>>;
}

impl<T: Resolver + ?Sized> Resolver for Arc<T> {
    fn resolve(
        &self,
        request: ResolveRequest,
    ) -> BoxFuture<'static, Result<Option<Resource>, CapabilityError>> {
        (**self).resolve(request)
    }
}

impl<T: Evaluator + ?Sized> Evaluator for Arc<T> {
    fn evaluate(&self, request: EvalRequest) -> BoxFuture<'static, Result<Value, CapabilityError>> {
        (**self).evaluate(request)
    }
}

/// Resolver backed by a closure
pub struct FnResolver<F>(F);

impl<F, Fut> Resolver for FnResolver<F>
where
    F: Fn(ResolveRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Resource>, CapabilityError>> + Send + 'static,
{
    fn resolve(
        &self,
        request: ResolveRequest,
    ) -> BoxFuture<'static, Result<Option<Resource>, CapabilityError>> {
        (self.0)(request).boxed()
    }
}

/// Build a resolver from an async closure
pub fn resolver_fn<F, Fut>(f: F) -> Arc<dyn Resolver>
where
    F: Fn(ResolveRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Resource>, CapabilityError>> + Send + 'static,
{
    Arc::new(FnResolver(f))
}

/// Evaluator backed by a closure
pub struct FnEvaluator<F>(F);

impl<F, Fut> Evaluator for FnEvaluator<F>
where
    F: Fn(EvalRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, CapabilityError>> + Send + 'static,
{
    fn evaluate(&self, request: EvalRequest) -> BoxFuture<'static, Result<Value, CapabilityError>> {
        (self.0)(request).boxed()
    }
}

/// Build an evaluator from an async closure
pub fn evaluator_fn<F, Fut>(f: F) -> Arc<dyn Evaluator>
where
    F: Fn(EvalRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, CapabilityError>> + Send + 'static,
{
    Arc::new(FnEvaluator(f))
}

/// In-memory resolver that records every request it receives
#[derive(Clone, Default)]
pub struct StaticResolver {
    resources: Arc<RwLock<IndexMap<(Symbol, bool), Resource>>>,
    requests: Arc<RwLock<Vec<ResolveRequest>>>,
    delay: Option<Duration>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `resource` for `name`
    pub fn with(self, name: &str, resource: Resource) -> Self {
        self.insert(name, false, resource);
        self
    }

    /// Serve `resource` for the macros of `name`
    pub fn with_macros(self, name: &str, resource: Resource) -> Self {
        self.insert(name, true, resource);
        self
    }

    /// Complete each request only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&self, name: &str, macros: bool, resource: Resource) {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((Symbol::new(name), macros), resource);
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<ResolveRequest> {
        self.requests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names requested so far, macro requests suffixed with `$macros`
    pub fn requested(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| {
                if r.macros {
                    r.name.macros_ns().to_string()
                } else {
                    r.name.to_string()
                }
            })
            .collect()
    }
}

impl Resolver for StaticResolver {
    fn resolve(
        &self,
        request: ResolveRequest,
    ) -> BoxFuture<'static, Result<Option<Resource>, CapabilityError>> {
        let found = self
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(request.name.clone(), request.macros))
            .cloned();
        self.requests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(found)
        }
        .boxed()
    }
}

/// Bounds every call of the wrapped capability
pub struct Timeout<C> {
    inner: C,
    after: Duration,
}

impl<C> Timeout<C> {
    pub fn new(inner: C, after: Duration) -> Self {
        Self { inner, after }
    }
}

impl<C: Resolver> Resolver for Timeout<C> {
    fn resolve(
        &self,
        request: ResolveRequest,
    ) -> BoxFuture<'static, Result<Option<Resource>, CapabilityError>> {
        let call = self.inner.resolve(request);
        let after = self.after;
        async move {
            tokio::time::timeout(after, call)
                .await
                .map_err(|_| CapabilityError::TimedOut(after))?
        }
        .boxed()
    }
}

impl<C: Evaluator> Evaluator for Timeout<C> {
    fn evaluate(&self, request: EvalRequest) -> BoxFuture<'static, Result<Value, CapabilityError>> {
        let call = self.inner.evaluate(request);
        let after = self.after;
        async move {
            tokio::time::timeout(after, call)
                .await
                .map_err(|_| CapabilityError::TimedOut(after))?
        }
        .boxed()
    }
}
