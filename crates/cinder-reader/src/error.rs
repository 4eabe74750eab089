//! Reader error types

use cinder_ast::Span;
use cinder_lexer::TokenKind;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ReadError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of input")]
    UnexpectedEof { span: Span },

    #[error("unmatched delimiter {found}")]
    UnmatchedDelimiter { found: String, span: Span },

    #[error("invalid token")]
    InvalidToken { span: Span },

    #[error("invalid number: {text}")]
    InvalidNumber { text: String, span: Span },

    #[error("invalid escape in string or character literal")]
    InvalidEscape { span: Span },

    #[error("map literal must contain an even number of forms")]
    OddMapEntries { span: Span },

    #[error("reader conditional must contain feature/form pairs")]
    InvalidReaderConditional { span: Span },

    #[error("spliced reader conditional must select a sequence")]
    InvalidSplice { span: Span },

    #[error("no reader function for tag {tag}")]
    UnknownTag { tag: String, span: Span },

    #[error("data reader for tag {tag} failed: {message}")]
    DataReader {
        tag: String,
        message: String,
        span: Span,
    },

    #[error("{what} is not supported")]
    Unsupported { what: String, span: Span },
}

impl ReadError {
    pub fn span(&self) -> Span {
        match self {
            ReadError::UnexpectedToken { span, .. } => *span,
            ReadError::UnexpectedEof { span } => *span,
            ReadError::UnmatchedDelimiter { span, .. } => *span,
            ReadError::InvalidToken { span } => *span,
            ReadError::InvalidNumber { span, .. } => *span,
            ReadError::InvalidEscape { span } => *span,
            ReadError::OddMapEntries { span } => *span,
            ReadError::InvalidReaderConditional { span } => *span,
            ReadError::InvalidSplice { span } => *span,
            ReadError::UnknownTag { span, .. } => *span,
            ReadError::DataReader { span, .. } => *span,
            ReadError::Unsupported { span, .. } => *span,
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        ReadError::UnexpectedToken {
            expected: expected.into(),
            found: found.describe().to_string(),
            span,
        }
    }
}
