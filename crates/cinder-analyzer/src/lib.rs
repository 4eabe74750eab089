//! Cinder Analyzer
//!
//! Turns reader forms into annotated [`Node`]s. Recognises `ns`, `def`,
//! `defn`, `defmacro`, `fn`, `let`, `if`, `do`, `quote` and invocations, and
//! records namespace declarations and definitions in the registry. No macro
//! expansion is performed.

mod analyzer;
mod error;
mod ns;

pub use analyzer::Analyzer;
pub use error::AnalysisError;

use cinder_ast::{ExprContext, Form, Node, Symbol};
use cinder_symbols::NamespaceRegistry;

/// Where a form is being analyzed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisEnv {
    /// Current namespace
    pub ns: Symbol,
    /// Context of the top-level form
    pub context: ExprContext,
    /// Whether `def` evaluates to its var
    pub def_emits_var: bool,
    /// The unit is a macro namespace; `ns` names get the `$macros` suffix
    pub macros_ns: bool,
}

impl AnalysisEnv {
    pub fn new(ns: Symbol) -> Self {
        Self {
            ns,
            context: ExprContext::Expr,
            def_emits_var: false,
            macros_ns: false,
        }
    }
}

/// Analyze a single form
pub fn analyze(
    form: &Form,
    env: &AnalysisEnv,
    registry: &mut NamespaceRegistry,
) -> Result<Node, AnalysisError> {
    Analyzer::new().analyze(form, env, registry)
}
