//! Driver error types

use crate::CapabilityError;
use cinder_analyzer::AnalysisError;
use cinder_ast::{Span, Symbol};
use cinder_codegen::SourceMapError;
use cinder_reader::ReadError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Broad class of a [`DriverError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required capability was not supplied
    Configuration,
    /// A capability misbehaved or returned a malformed result
    ContractViolation,
    UnresolvableNamespace,
    CircularDependency,
    /// A `use` or `use-macros` reference did not resolve
    Validation,
    /// The reader, analyzer or source-map encoder failed
    Collaborator,
}

/// What a failed `use` referred to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseKind {
    Var,
    Macro,
}

impl fmt::Display for UseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UseKind::Var => f.write_str("var"),
            UseKind::Macro => f.write_str("macro"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    /// E-CONFIG-001
    #[error("no {capability} configured")]
    MissingCapability { capability: &'static str },

    /// E-CONTRACT-001
    #[error("resolver returned unsupported language {language:?} for {ns}")]
    InvalidLanguage { ns: Symbol, language: String },

    /// E-CONTRACT-002
    #[error("{capability} failed for {name}: {message}")]
    Capability {
        capability: &'static str,
        name: String,
        message: String,
    },

    /// E-CONTRACT-003
    #[error("{capability} timed out for {name} after {after:?}")]
    Timeout {
        capability: &'static str,
        name: String,
        after: Duration,
    },

    /// E-NS-001
    #[error("no such namespace: {ns}, required by {requester}")]
    UndeclaredNamespace {
        requester: Symbol,
        ns: Symbol,
        /// The namespace was wanted for its macros
        macros: bool,
    },

    /// E-NS-002
    #[error("circular dependency detected: {cycle}")]
    CircularDependency {
        /// Path from the first namespace to the repeated one
        path: Vec<Symbol>,
        /// Rendered path, e.g. "a -> b -> c -> a"
        cycle: String,
    },

    /// E-NS-003
    #[error("referred {kind} {lib}/{sym} does not exist (used by {ns})")]
    UndeclaredUse {
        ns: Symbol,
        lib: Symbol,
        sym: Symbol,
        kind: UseKind,
    },

    /// E-READ-001
    #[error("could not read {unit}: {source}")]
    Read {
        unit: String,
        #[source]
        source: ReadError,
    },

    /// E-ANALYZE-001
    #[error("could not analyze {unit}: {source}")]
    Analysis {
        unit: String,
        #[source]
        source: AnalysisError,
    },

    /// E-SOURCEMAP-001
    #[error("could not encode source map for {unit}: {source}")]
    SourceMap {
        unit: String,
        #[source]
        source: SourceMapError,
    },
}

impl DriverError {
    pub fn circular(path: Vec<Symbol>) -> Self {
        let cycle = path
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(" -> ");
        DriverError::CircularDependency { path, cycle }
    }

    pub(crate) fn capability(capability: &'static str, name: impl Into<String>, err: CapabilityError) -> Self {
        let name = name.into();
        match err {
            CapabilityError::TimedOut(after) => DriverError::Timeout {
                capability,
                name,
                after,
            },
            CapabilityError::Failed(message) => DriverError::Capability {
                capability,
                name,
                message,
            },
        }
    }

    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            DriverError::MissingCapability { .. } => "E-CONFIG-001",
            DriverError::InvalidLanguage { .. } => "E-CONTRACT-001",
            DriverError::Capability { .. } => "E-CONTRACT-002",
            DriverError::Timeout { .. } => "E-CONTRACT-003",
            DriverError::UndeclaredNamespace { .. } => "E-NS-001",
            DriverError::CircularDependency { .. } => "E-NS-002",
            DriverError::UndeclaredUse { .. } => "E-NS-003",
            DriverError::Read { .. } => "E-READ-001",
            DriverError::Analysis { .. } => "E-ANALYZE-001",
            DriverError::SourceMap { .. } => "E-SOURCEMAP-001",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::MissingCapability { .. } => ErrorKind::Configuration,
            DriverError::InvalidLanguage { .. }
            | DriverError::Capability { .. }
            | DriverError::Timeout { .. } => ErrorKind::ContractViolation,
            DriverError::UndeclaredNamespace { .. } => ErrorKind::UnresolvableNamespace,
            DriverError::CircularDependency { .. } => ErrorKind::CircularDependency,
            DriverError::UndeclaredUse { .. } => ErrorKind::Validation,
            DriverError::Read { .. } | DriverError::Analysis { .. } | DriverError::SourceMap { .. } => {
                ErrorKind::Collaborator
            }
        }
    }

    /// Unit the error was raised in, for collaborator failures
    pub fn unit(&self) -> Option<&str> {
        match self {
            DriverError::Read { unit, .. }
            | DriverError::Analysis { unit, .. }
            | DriverError::SourceMap { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// Source span within [`DriverError::unit`], when there is one
    pub fn span(&self) -> Option<Span> {
        match self {
            DriverError::Read { source, .. } => Some(source.span()),
            DriverError::Analysis { source, .. } => Some(source.span()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_renders_path() {
        let err = DriverError::circular(vec![
            Symbol::new("a"),
            Symbol::new("b"),
            Symbol::new("a"),
        ]);
        assert_eq!(err.to_string(), "circular dependency detected: a -> b -> a");
        assert_eq!(err.code(), "E-NS-002");
        assert_eq!(err.kind(), ErrorKind::CircularDependency);
    }

    #[test]
    fn test_capability_timeout_maps_to_timeout() {
        let err = DriverError::capability(
            "resolver",
            "app.core",
            CapabilityError::TimedOut(Duration::from_millis(5)),
        );
        assert_eq!(err.code(), "E-CONTRACT-003");
        assert_eq!(err.kind(), ErrorKind::ContractViolation);

        let err = DriverError::capability("evaluator", "app.core", CapabilityError::Failed("boom".into()));
        assert_eq!(err.to_string(), "evaluator failed for app.core: boom");
    }
}
