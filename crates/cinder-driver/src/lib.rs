//! Cinder Driver - dependency resolution and incremental compilation
//!
//! Drives units of source through the reader, analyzer, emitter and
//! evaluator, loading the namespaces each declaration depends on first.
//!
//! # Example
//!
//! ```ignore
//! use cinder_driver::{evaluator_fn, Options, Resource, Session, StaticResolver};
//!
//! let resolver = StaticResolver::new().with("app.util", Resource::clj("(ns app.util) (def x 1)"));
//! let session = Session::new()
//!     .with_resolver(resolver)
//!     .with_evaluator(evaluator_fn(|req| async move { Ok(req.source.into()) }));
//!
//! let js = session
//!     .compile("(ns app.core (:require app.util))", Some("app/core.cljs"), &Options::default())
//!     .await?;
//! ```

mod capability;
mod context;
mod deps;
mod error;
mod macros;
mod sequencer;
mod session;
mod source_map;
mod state;
mod toolchain;
mod unit;

pub use capability::*;
pub use context::{Context, DependencyPath, Options};
pub use deps::{resolve_deps, Aliases, Mode};
pub use error::{DriverError, ErrorKind, UseKind};
pub use macros::load_macros;
pub use sequencer::{sequence, Stage};
pub use session::{Session, ANONYMOUS_UNIT};
pub use source_map::{inline_directives, Accumulator};
pub use state::{CompilerState, LoadedSet};
pub use toolchain::*;
pub use unit::{analyze_unit, compile_unit, eval_form, eval_unit, Evaluated};
