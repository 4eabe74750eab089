#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use cinder::driver::{evaluator_fn, resolver_fn, Evaluator, Resolver, Resource};
use serde_json::Value;

/// Path to a directory under tests/fixtures/
pub fn fixture_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a test fixture from tests/fixtures/
pub fn load_fixture(name: &str) -> String {
    let path = fixture_dir(name);
    fs::read_to_string(&path).expect(&format!("Failed to load fixture: {}", name))
}

pub type Log = Arc<RwLock<Vec<String>>>;

/// Resolver over a fixture directory. Every request is logged, macro
/// requests with a `$macros` suffix.
pub fn fixture_resolver(root: PathBuf) -> (Arc<dyn Resolver>, Log) {
    let log = Log::default();
    let requests = log.clone();
    let resolver = resolver_fn(move |request| {
        let key = if request.macros {
            request.name.macros_ns().to_string()
        } else {
            request.name.to_string()
        };
        requests.write().unwrap().push(key);

        let extensions: &[&str] = if request.macros { &["clj", "cljc"] } else { &["cljs", "cljc", "js"] };
        let found = extensions.iter().find_map(|ext| {
            let path = root.join(format!("{}.{}", request.path, ext));
            let source = fs::read_to_string(&path).ok()?;
            let language = if *ext == "js" { "js" } else { "clj" };
            Some(Resource::new(language, source).with_path(path.display().to_string()))
        });
        async move { Ok(found) }
    });
    (resolver, log)
}

/// Evaluator answering with the JavaScript it receives, logging `language:name`
pub fn echo_evaluator() -> (Arc<dyn Evaluator>, Log) {
    let log = Log::default();
    let evaluations = log.clone();
    let evaluator = evaluator_fn(move |request| {
        evaluations
            .write()
            .unwrap()
            .push(format!("{}:{}", request.language.as_str(), request.name));
        async move { Ok(Value::String(request.source)) }
    });
    (evaluator, log)
}

pub fn entries(log: &Log) -> Vec<String> {
    log.read().unwrap().clone()
}
