//! Cinder Codegen - JavaScript emission
//!
//! Emits JavaScript text for analyzed nodes together with source positions
//! relative to the emitted chunk, and encodes accumulated positions as a
//! version 3 source map.

mod js;
mod source_map;

pub use js::*;
pub use source_map::*;

use serde::{Deserialize, Serialize};

/// A generated position paired with the source position it came from.
/// Generated positions are relative to the start of the chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub gen_line: u32,
    pub gen_col: u32,
    pub source_line: u32,
    pub source_col: u32,
    pub name: Option<String>,
}

/// Text emitted for one node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emission {
    pub text: String,
    pub mappings: Vec<Mapping>,
}
