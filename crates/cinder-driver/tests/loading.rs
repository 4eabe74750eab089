//! Dependency and macro loading through a session

mod common;

use cinder_ast::{Reload, Symbol};
use cinder_driver::{DriverError, ErrorKind, Options, Resource, StaticResolver, UseKind};
use cinder_symbols::NamespaceInfo;
use common::{loaded, session};

fn sym(name: &str) -> Symbol {
    Symbol::new(name)
}

fn chain() -> StaticResolver {
    StaticResolver::new()
        .with("a", Resource::clj("(ns a (:require b))\n(def x 1)"))
        .with("b", Resource::clj("(ns b)\n(def y 2)"))
}

#[tokio::test]
async fn test_require_is_idempotent() {
    let resolver = chain();
    let (session, _) = session(&resolver);

    session.require(sym("b"), None, &Options::new()).await.unwrap();
    session.require(sym("b"), None, &Options::new()).await.unwrap();

    assert_eq!(resolver.requested(), vec!["b"]);
    assert_eq!(loaded(&session), vec!["b"]);
}

#[tokio::test]
async fn test_transitive_deps_load_before_dependent() {
    let resolver = chain();
    let (session, recorder) = session(&resolver);

    session.require(sym("a"), None, &Options::new()).await.unwrap();

    assert_eq!(resolver.requested(), vec!["a", "b"]);
    assert_eq!(loaded(&session), vec!["a", "b"]);

    let sources: Vec<String> = recorder.requests().into_iter().map(|r| r.source).collect();
    let b_def = sources.iter().position(|s| s == "b.y = 2;\n").unwrap();
    let a_def = sources.iter().position(|s| s == "a.x = 1;\n").unwrap();
    assert!(b_def < a_def);
}

#[tokio::test]
async fn test_reload_removes_only_the_named_namespace() {
    let resolver = chain();
    let (session, _) = session(&resolver);

    session.require(sym("a"), None, &Options::new()).await.unwrap();
    session
        .require(sym("a"), Some(Reload::Reload), &Options::new())
        .await
        .unwrap();

    // b stayed loaded, so only a was fetched again
    assert_eq!(resolver.requested(), vec!["a", "b", "a"]);
    assert_eq!(loaded(&session), vec!["a", "b"]);
}

#[tokio::test]
async fn test_reload_all_clears_loaded_set() {
    let resolver = chain();
    let (session, _) = session(&resolver);

    session.require(sym("a"), None, &Options::new()).await.unwrap();
    session
        .require(sym("a"), Some(Reload::ReloadAll), &Options::new())
        .await
        .unwrap();

    assert_eq!(resolver.requested(), vec!["a", "b", "a", "b"]);
    assert_eq!(loaded(&session), vec!["a", "b"]);
}

#[tokio::test]
async fn test_per_lib_reload_in_declaration() {
    let resolver = chain();
    let (session, _) = session(&resolver);

    session.require(sym("a"), None, &Options::new()).await.unwrap();
    session
        .eval_str("(ns c (:require [a :reload]))", Some("c"), &Options::new())
        .await
        .unwrap();

    assert_eq!(resolver.requested(), vec!["a", "b", "a"]);
}

#[tokio::test]
async fn test_cycle_reports_full_path() {
    let resolver = StaticResolver::new()
        .with("a", Resource::clj("(ns a (:require b))"))
        .with("b", Resource::clj("(ns b (:require c))"))
        .with("c", Resource::clj("(ns c (:require a))"));
    let (session, _) = session(&resolver);

    let err = session.require(sym("a"), None, &Options::new()).await.unwrap_err();

    match &err {
        DriverError::CircularDependency { path, cycle } => {
            assert_eq!(path, &vec![sym("a"), sym("b"), sym("c"), sym("a")]);
            assert_eq!(cycle, "a -> b -> c -> a");
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::CircularDependency);
    // a is never resolved a second time
    assert_eq!(resolver.requested(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_self_dependency_is_a_cycle() {
    let resolver = StaticResolver::new();
    let (session, _) = session(&resolver);

    let err = session
        .compile("(ns a (:require a))", Some("a"), &Options::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DriverError::CircularDependency { ref path, .. } if path == &vec![sym("a"), sym("a")]));
    assert!(resolver.requested().is_empty());
}

#[tokio::test]
async fn test_macros_resolve_after_plain_deps() {
    let resolver = StaticResolver::new()
        .with("b", Resource::js("var b = {};"))
        .with_macros("m", Resource::clj("(ns m)\n(defmacro twice [x] x)"));
    let (session, _) = session(&resolver);

    session
        .compile(
            "(ns app (:require-macros [m :as mm]) (:require b))",
            Some("app"),
            &Options::new(),
        )
        .await
        .unwrap();

    assert_eq!(resolver.requested(), vec!["b", "m$macros"]);
    assert!(resolver.requests()[1].macros);

    // macro namespaces are evaluated even when only compiling
    assert_eq!(loaded(&session), vec!["b", "m$macros"]);
    let info = session.state().namespace(&sym("m$macros")).unwrap();
    assert!(info.defines_macro("twice"));
}

#[tokio::test]
async fn test_macro_namespace_loaded_once() {
    let resolver = StaticResolver::new().with_macros("m", Resource::clj("(ns m)\n(defmacro twice [x] x)"));
    let (session, _) = session(&resolver);

    for unit in ["one", "two"] {
        let source = format!("(ns {} (:require-macros m))", unit);
        session.compile(&source, Some(unit), &Options::new()).await.unwrap();
    }

    assert_eq!(resolver.requested(), vec!["m$macros"]);
}

#[tokio::test]
async fn test_reload_macros_refetches_own_macros() {
    let resolver = StaticResolver::new().with_macros("m", Resource::clj("(ns m)\n(defmacro twice [x] x)"));
    let (session, _) = session(&resolver);
    let mut options = Options::new();
    options.reload_macros = true;

    for _ in 0..2 {
        session
            .eval_str("(ns m (:require-macros m))", Some("m"), &options)
            .await
            .unwrap();
    }

    assert_eq!(resolver.requested(), vec!["m$macros", "m$macros"]);
}

#[tokio::test]
async fn test_missing_macro_namespace() {
    let resolver = StaticResolver::new();
    let (session, _) = session(&resolver);

    let err = session
        .compile("(ns app (:require-macros nope))", None, &Options::new())
        .await
        .unwrap_err();

    match err {
        DriverError::UndeclaredNamespace { requester, ns, macros } => {
            assert_eq!(requester, sym("app"));
            assert_eq!(ns, sym("nope"));
            assert!(macros);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_use_of_undefined_var() {
    let resolver = StaticResolver::new().with("b", Resource::clj("(ns b)\n(def present 1)"));
    let (session, _) = session(&resolver);

    session
        .compile("(ns ok (:use [b :only [present]]))", None, &Options::new())
        .await
        .unwrap();

    let err = session
        .compile("(ns app (:use [b :only [missing]]))", None, &Options::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    match err {
        DriverError::UndeclaredUse { ns, lib, sym: used, kind } => {
            assert_eq!(ns, sym("app"));
            assert_eq!(lib, sym("b"));
            assert_eq!(used, sym("missing"));
            assert_eq!(kind, UseKind::Var);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_use_macros_of_non_macro() {
    let resolver = StaticResolver::new().with_macros(
        "m",
        Resource::clj("(ns m)\n(defmacro twice [x] x)\n(def helper 1)"),
    );
    let (session, _) = session(&resolver);

    session
        .compile("(ns ok (:use-macros [m :only [twice]]))", None, &Options::new())
        .await
        .unwrap();

    let err = session
        .compile("(ns app (:use-macros [m :only [helper]]))", None, &Options::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DriverError::UndeclaredUse { kind: UseKind::Macro, ref sym, .. } if sym.as_str() == "helper"
    ));
}

#[tokio::test]
async fn test_js_analysis_cache_loads_its_deps_first() {
    let mut cache = NamespaceInfo::new(sym("b"));
    cache.deps.push(sym("c"));
    cache.require_macros.insert(sym("mm"), sym("m"));
    cache.define("helper", false, Default::default());

    let resolver = StaticResolver::new()
        .with("b", Resource::js("b.helper = function () {};").with_cache(cache))
        .with("c", Resource::clj("(ns c)\n(def y 2)"))
        .with_macros("m", Resource::clj("(ns m)\n(defmacro twice [x] x)"));
    let (session, recorder) = session(&resolver);

    session
        .compile("(ns a (:require b))", Some("a"), &Options::new())
        .await
        .unwrap();

    assert_eq!(resolver.requested(), vec!["b", "m$macros", "c"]);
    assert_eq!(loaded(&session), vec!["b", "c", "m$macros"]);

    let log = recorder.log();
    assert_eq!(log.last().map(String::as_str), Some("js:b"));
    assert!(log.contains(&"clj:c".to_string()));

    let info = session.state().namespace(&sym("b")).unwrap();
    assert!(info.defines("helper"));
    assert_eq!(info.deps, vec![sym("c")]);
}

#[tokio::test]
async fn test_clojure_namespace_falls_back_to_cljs() {
    let resolver = StaticResolver::new().with("cljs.string", Resource::clj("(ns cljs.string)\n(def join 1)"));
    let (session, _) = session(&resolver);

    let js = session
        .compile("(ns a (:require [clojure.string :as str]))", Some("a"), &Options::new())
        .await
        .unwrap();

    assert_eq!(resolver.requested(), vec!["clojure.string", "cljs.string"]);
    assert!(js.contains("goog.require(\"cljs.string\");"));
    assert!(!js.contains("clojure"));

    let info = session.state().namespace(&sym("a")).unwrap();
    assert_eq!(info.requires.get(&sym("str")), Some(&sym("cljs.string")));
}

#[tokio::test]
async fn test_invalid_resource_language() {
    let resolver = StaticResolver::new().with("b", Resource::new("wasm", "(module)"));
    let (session, _) = session(&resolver);

    let err = session
        .compile("(ns a (:require b))", None, &Options::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ContractViolation);
    assert!(matches!(err, DriverError::InvalidLanguage { ref language, .. } if language == "wasm"));
}

#[tokio::test]
async fn test_analyze_only_skips_known_namespaces() {
    let resolver = chain();
    let (session, recorder) = session(&resolver);

    session.analyze("(ns x (:require a))", Some("x"), &Options::new()).await.unwrap();
    session.analyze("(ns y (:require a b))", Some("y"), &Options::new()).await.unwrap();

    // a and b were analyzed by the first unit and are already in the registry
    assert_eq!(resolver.requested(), vec!["a", "b"]);
    assert!(loaded(&session).is_empty());
    assert_eq!(recorder.requests().len(), 0);
    assert!(session.state().namespace(&sym("a")).unwrap().defines("x"));
}

#[tokio::test]
async fn test_failed_dependency_analysis_is_retried() {
    let resolver = StaticResolver::new().with("b", Resource::clj("(ns b (:require missing))\n(def y 1)"));
    let (session, _) = session(&resolver);

    for unit in ["a", "a2"] {
        let source = format!("(ns {} (:require b))", unit);
        let err = session.compile(&source, Some(unit), &Options::new()).await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::UndeclaredNamespace { ref requester, ref ns, .. }
                if requester.as_str() == "b" && ns.as_str() == "missing"
        ));
    }

    // b's partial registry entry did not stand in for a finished analysis
    assert_eq!(resolver.requested(), vec!["b", "missing", "b", "missing"]);
    assert!(!session.state().namespace(&sym("b")).unwrap().defines("y"));
}

#[tokio::test]
async fn test_analyze_deps_off_skips_deps_and_use_checks() {
    let resolver = chain();
    let (session, recorder) = session(&resolver);
    let mut options = Options::new();
    options.analyze_deps = false;

    let js = session
        .compile("(ns app (:require a) (:use [b :only [nope]]))", Some("app"), &options)
        .await
        .unwrap();

    assert!(js.contains("goog.require(\"a\");"));
    assert!(resolver.requested().is_empty());
    assert!(recorder.requests().is_empty());
    assert!(loaded(&session).is_empty());
}

#[tokio::test]
async fn test_load_macros_off_skips_macro_loading_and_checks() {
    let resolver = StaticResolver::new().with_macros("m", Resource::clj("(ns m)\n(def helper 1)"));
    let (session, recorder) = session(&resolver);
    let mut options = Options::new();
    options.load_macros = false;

    session
        .compile(
            "(ns app (:require-macros [m :as mm]) (:use-macros [m :only [helper]]))",
            Some("app"),
            &options,
        )
        .await
        .unwrap();

    assert!(resolver.requested().is_empty());
    assert!(recorder.requests().is_empty());
    assert!(session.state().namespace(&sym("m$macros")).is_none());
}
