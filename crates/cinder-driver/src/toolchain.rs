//! Reader, analyzer, emitter and source-map encoder seams
//!
//! The driver only sequences calls into these. [`Toolchain::default`] wires up
//! the workspace's own implementations.

use cinder_analyzer::{AnalysisEnv, AnalysisError};
use cinder_ast::{Form, Node, Symbol};
use cinder_codegen::{Emission, JsEmitter, SourceMapError, SourceMapTable};
use cinder_reader::{DataReaders, FormReader, Read, ReadError};
use cinder_symbols::NamespaceRegistry;
use std::fmt;
use std::sync::Arc;

/// A lazy sequence of forms from one unit, ending with [`Read::Eof`]
pub trait FormStream: Send {
    fn next_form(&mut self) -> Result<Read, ReadError>;
}

/// Opens form streams over unit source
pub trait Reader: Send + Sync {
    fn open(&self, source: String, unit: &str, data_readers: DataReaders) -> Box<dyn FormStream>;
}

/// Turns a form into a node, registering namespace metadata as a side effect
pub trait Analyzer: Send + Sync {
    fn analyze(
        &self,
        form: &Form,
        env: &AnalysisEnv,
        registry: &mut NamespaceRegistry,
    ) -> Result<Node, AnalysisError>;
}

pub trait Emitter: Send + Sync {
    fn emit(&self, node: &Node) -> Emission;

    /// Statement announcing a namespace to the host runtime
    fn emit_provide(&self, ns: &Symbol) -> Emission;
}

/// Inputs to source map encoding besides the table
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    /// Synthesized generated file name
    pub file: &'a str,
    /// Logical source name, the unit name
    pub source_name: &'a str,
    pub source: &'a str,
}

pub trait SourceMapEncoder: Send + Sync {
    fn encode(&self, table: &SourceMapTable, request: &EncodeRequest<'_>) -> Result<String, SourceMapError>;
}

impl FormStream for FormReader {
    fn next_form(&mut self) -> Result<Read, ReadError> {
        self.read()
    }
}

/// Reader backed by [`FormReader`]
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardReader;

impl Reader for StandardReader {
    fn open(&self, source: String, _unit: &str, data_readers: DataReaders) -> Box<dyn FormStream> {
        Box::new(FormReader::new(source).with_data_readers(data_readers))
    }
}

impl Analyzer for cinder_analyzer::Analyzer {
    fn analyze(
        &self,
        form: &Form,
        env: &AnalysisEnv,
        registry: &mut NamespaceRegistry,
    ) -> Result<Node, AnalysisError> {
        cinder_analyzer::Analyzer::analyze(self, form, env, registry)
    }
}

impl Emitter for JsEmitter {
    fn emit(&self, node: &Node) -> Emission {
        JsEmitter::emit(self, node)
    }

    fn emit_provide(&self, ns: &Symbol) -> Emission {
        JsEmitter::emit_provide(self, ns)
    }
}

/// Encoder producing source map v3 JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct V3Encoder;

impl SourceMapEncoder for V3Encoder {
    fn encode(&self, table: &SourceMapTable, request: &EncodeRequest<'_>) -> Result<String, SourceMapError> {
        cinder_codegen::encode(table, request.file, request.source_name, request.source)
    }
}

/// The collaborators one session drives
#[derive(Clone)]
pub struct Toolchain {
    pub reader: Arc<dyn Reader>,
    pub analyzer: Arc<dyn Analyzer>,
    pub emitter: Arc<dyn Emitter>,
    pub encoder: Arc<dyn SourceMapEncoder>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            reader: Arc::new(StandardReader),
            analyzer: Arc::new(cinder_analyzer::Analyzer::new()),
            emitter: Arc::new(JsEmitter::new()),
            encoder: Arc::new(V3Encoder),
        }
    }
}

impl fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}
