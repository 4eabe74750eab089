//! Cinder AST - Core types shared across the compiler
//!
//! This crate defines symbols, reader forms, analyzed nodes (including the
//! namespace declaration node), and spans for source locations.

mod form;
mod node;
mod span;
mod symbol;

pub use form::*;
pub use node::*;
pub use span::*;
pub use symbol::*;

/// Namespace a unit starts in when it does not declare one
pub const DEFAULT_NS: &str = "cljs.user";

/// Namespace unqualified globals fall back to
pub const CORE_NS: &str = "cljs.core";
