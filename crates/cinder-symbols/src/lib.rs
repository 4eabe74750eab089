//! Cinder Symbols - namespace registry
//!
//! Tracks every namespace the analyzer has seen: its defs, its dependency
//! tables, and its aliases. A [`NamespaceInfo`] serializes to JSON and is the
//! format of precomputed analysis caches.

mod namespace;
mod registry;

pub use namespace::{DefInfo, NamespaceInfo};
pub use registry::NamespaceRegistry;
