#![allow(dead_code)]

use cinder_driver::{CapabilityError, EvalRequest, Evaluator, Language, Session, StaticResolver};
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Evaluator that records every request and answers with the source it was given
#[derive(Clone, Default)]
pub struct Recorder {
    requests: Arc<RwLock<Vec<EvalRequest>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<EvalRequest> {
        self.requests.read().unwrap().clone()
    }

    /// `language:name` for each evaluation, in order
    pub fn log(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{}:{}", r.language.as_str(), r.name))
            .collect()
    }

    /// Sources evaluated on behalf of `name`
    pub fn sources_for(&self, name: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.name == name)
            .map(|r| r.source)
            .collect()
    }

    pub fn count(&self, language: Language) -> usize {
        self.requests().iter().filter(|r| r.language == language).count()
    }
}

impl Evaluator for Recorder {
    fn evaluate(&self, request: EvalRequest) -> BoxFuture<'static, Result<Value, CapabilityError>> {
        let value = Value::String(request.source.clone());
        self.requests.write().unwrap().push(request);
        async move { Ok(value) }.boxed()
    }
}

/// Session wired to `resolver` and a fresh recorder
pub fn session(resolver: &StaticResolver) -> (Session, Recorder) {
    let recorder = Recorder::new();
    let session = Session::new()
        .with_resolver(resolver.clone())
        .with_evaluator(recorder.clone());
    (session, recorder)
}

/// Loaded set as plain strings, sorted
pub fn loaded(session: &Session) -> Vec<String> {
    session
        .loaded()
        .snapshot()
        .into_iter()
        .map(|ns| ns.to_string())
        .collect()
}
