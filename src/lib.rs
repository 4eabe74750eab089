//! Cinder - a self-hosted ClojureScript compiler core
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use cinder_ast as ast;
pub use cinder_driver as driver;
pub use cinder_reader as reader;
