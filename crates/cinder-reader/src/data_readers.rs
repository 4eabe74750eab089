//! Tagged-literal reader table

use cinder_ast::{Form, Symbol};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Function turning the form after `#tag` into its replacement
pub type DataReaderFn = Arc<dyn Fn(Form) -> Result<Form, String> + Send + Sync>;

/// Tags understood without a data reader; they stay `Tagged` for the analyzer
pub const BUILTIN_TAGS: &[&str] = &["inst", "uuid", "js", "queue"];

/// Table of data readers keyed by tag symbol
#[derive(Clone, Default)]
pub struct DataReaders {
    readers: IndexMap<Symbol, DataReaderFn>,
}

impl DataReaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reader for `tag`, replacing any previous one
    pub fn insert<F>(&mut self, tag: impl Into<Symbol>, reader: F)
    where
        F: Fn(Form) -> Result<Form, String> + Send + Sync + 'static,
    {
        self.readers.insert(tag.into(), Arc::new(reader));
    }

    pub fn get(&self, tag: &Symbol) -> Option<&DataReaderFn> {
        self.readers.get(tag)
    }

    pub fn contains(&self, tag: &Symbol) -> bool {
        self.readers.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

impl fmt::Debug for DataReaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.readers.keys()).finish()
    }
}
