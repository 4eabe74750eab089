//! Token definitions for Cinder source

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f,]+")] // Whitespace; commas are whitespace too
#[logos(skip r";[^\n]*")] // Line comments
pub enum TokenKind {
    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // === Dispatch macros ===
    #[token("#{")]
    SetOpen,
    #[token("#(")]
    FnOpen,
    #[token("#?(")]
    ReaderCond,
    #[token("#?@(")]
    ReaderCondSplice,
    #[token("#_")]
    Discard,
    #[regex(r#"#"([^"\\]|\\.)*""#)]
    Regex,
    #[regex(r"#[a-zA-Z][^\s,()\[\]{}\x22';@^`~\\]*")]
    Tag,

    // === Reader macros ===
    #[token("'")]
    Quote,
    #[token("`")]
    SyntaxQuote,
    #[token("~@")]
    UnquoteSplice,
    #[token("~")]
    Unquote,
    #[token("@")]
    Deref,
    #[token("^")]
    Meta,

    // === Atoms ===
    #[regex(r"[+-]?[0-9]+", priority = 10)]
    Int,
    #[regex(r"[+-]?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", priority = 10)]
    Float,
    #[regex(r#""([^"\\]|\\.)*""#)]
    String,
    #[regex(r"\\(newline|space|tab|return|u[0-9a-fA-F]{4}|.)")]
    Char,
    #[regex(r"::?[^\s,()\[\]{}\x22';@^`~\\]+")]
    Keyword,
    #[regex(r"[^\s,()\[\]{}\x22';@^`~\\#:0-9][^\s,()\[\]{}\x22';@^`~\\]*", priority = 1)]
    Symbol,

    // Special tokens
    Error,
    Eof,
}

impl TokenKind {
    /// Human-readable description of the token kind
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::SetOpen => "'#{'",
            TokenKind::FnOpen => "'#('",
            TokenKind::ReaderCond => "'#?('",
            TokenKind::ReaderCondSplice => "'#?@('",
            TokenKind::Discard => "'#_'",
            TokenKind::Regex => "regex",
            TokenKind::Tag => "tag",
            TokenKind::Quote => "quote",
            TokenKind::SyntaxQuote => "syntax quote",
            TokenKind::UnquoteSplice => "'~@'",
            TokenKind::Unquote => "'~'",
            TokenKind::Deref => "'@'",
            TokenKind::Meta => "'^'",
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::String => "string",
            TokenKind::Char => "character",
            TokenKind::Keyword => "keyword",
            TokenKind::Symbol => "symbol",
            TokenKind::Error => "error",
            TokenKind::Eof => "end of file",
        }
    }

    /// Whether this token closes a collection
    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace
        )
    }
}
