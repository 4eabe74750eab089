//! Filesystem capabilities for the command line

use std::path::{Path, PathBuf};

use cinder_driver::{evaluator_fn, CapabilityError, Evaluator, Language, ResolveRequest, Resolver, Resource};
use futures_util::future::{BoxFuture, FutureExt};
use log::{debug, trace};
use serde_json::Value;
use std::sync::Arc;

const SOURCE_EXTENSIONS: &[&str] = &["cljs", "cljc", "js"];
const MACRO_EXTENSIONS: &[&str] = &["clj", "cljc"];

/// Maps a namespace to the first matching file under a list of source roots.
///
/// `app.core-utils` is looked up as `app/core_utils.cljs`, then `.cljc`, then
/// `.js`; macro namespaces as `.clj` then `.cljc`.
#[derive(Debug, Clone)]
pub struct SourcePathResolver {
    roots: Vec<PathBuf>,
}

impl SourcePathResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    fn candidates(&self, relpath: &str, macros: bool) -> Vec<PathBuf> {
        let extensions = if macros { MACRO_EXTENSIONS } else { SOURCE_EXTENSIONS };
        self.roots
            .iter()
            .flat_map(|root| {
                extensions
                    .iter()
                    .map(move |ext| root.join(format!("{}.{}", relpath, ext)))
            })
            .collect()
    }
}

fn language_of(path: &Path) -> Language {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js") => Language::Js,
        _ => Language::Clj,
    }
}

impl Resolver for SourcePathResolver {
    fn resolve(
        &self,
        request: ResolveRequest,
    ) -> BoxFuture<'static, Result<Option<Resource>, CapabilityError>> {
        let candidates = self.candidates(&request.path, request.macros);
        async move {
            for candidate in candidates {
                trace!("trying {}", candidate.display());
                match tokio::fs::read_to_string(&candidate).await {
                    Ok(source) => {
                        let path = candidate.display().to_string();
                        debug!("{} resolved to {}", request.name, path);
                        let resource = Resource::new(language_of(&candidate).as_str(), source)
                            .with_name(path.clone())
                            .with_path(path);
                        return Ok(Some(resource));
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        return Err(CapabilityError::failed(format!(
                            "reading {}: {}",
                            candidate.display(),
                            err
                        )))
                    }
                }
            }
            Ok(None)
        }
        .boxed()
    }
}

/// Evaluator that runs nothing and hands back the JavaScript it was given
pub fn echo_evaluator() -> Arc<dyn Evaluator> {
    evaluator_fn(|request| async move {
        debug!("{} {} ({} bytes)", request.language.as_str(), request.name, request.source.len());
        Ok(Value::String(request.source))
    })
}
