//! Cinder Reader - incremental s-expression reader
//!
//! Turns source text into forms one at a time. Reader conditionals select the
//! `:cljs` branch (falling back to `:default`), and tagged literals go through
//! a caller-supplied data-reader table.

mod data_readers;
mod error;
mod reader;

pub use data_readers::*;
pub use error::*;
pub use reader::*;

use cinder_ast::Form;

/// Read every form in a source string
pub fn read_str(source: &str) -> Result<Vec<Form>, ReadError> {
    FormReader::new(source).read_all()
}
