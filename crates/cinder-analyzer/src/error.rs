//! Analysis error types

use cinder_ast::Span;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("invalid ns form: {message}")]
    InvalidNs { message: String, span: Span },

    #[error("malformed {form}: {message}")]
    Malformed {
        form: String,
        message: String,
        span: Span,
    },

    #[error("{what} is not supported")]
    Unsupported { what: String, span: Span },
}

impl AnalysisError {
    pub fn span(&self) -> Span {
        match self {
            AnalysisError::InvalidNs { span, .. } => *span,
            AnalysisError::Malformed { span, .. } => *span,
            AnalysisError::Unsupported { span, .. } => *span,
        }
    }

    pub(crate) fn ns(message: impl Into<String>, span: Span) -> Self {
        AnalysisError::InvalidNs {
            message: message.into(),
            span,
        }
    }

    pub(crate) fn malformed(form: &str, message: impl Into<String>, span: Span) -> Self {
        AnalysisError::Malformed {
            form: form.to_string(),
            message: message.into(),
            span,
        }
    }
}
