//! Cinder Lexer - Tokenization using logos
//!
//! Commas are whitespace, `;` starts a line comment, and `#` introduces the
//! dispatch macros (`#{`, `#?(`, `#_`, `#"..."`, `#tag`).

mod token;

pub use token::*;

use cinder_ast::Span;
use logos::Logos;

/// Tokenize a source string into a vector of tokens
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        let kind = match result {
            Ok(kind) => kind,
            Err(_) => TokenKind::Error,
        };
        tokens.push(Token { kind, span });
    }

    // Add EOF token
    let end = source.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });

    tokens
}

/// A token with its span
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_ns_form_tokens() {
        assert_eq!(
            kinds("(ns app.core (:require [b :as x]))"),
            vec![
                TokenKind::LParen,
                TokenKind::Symbol,
                TokenKind::Symbol,
                TokenKind::LParen,
                TokenKind::Keyword,
                TokenKind::LBracket,
                TokenKind::Symbol,
                TokenKind::Keyword,
                TokenKind::Symbol,
                TokenKind::RBracket,
                TokenKind::RParen,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_vs_symbols() {
        assert_eq!(
            kinds("-1 - +2.5 +"),
            vec![
                TokenKind::Int,
                TokenKind::Symbol,
                TokenKind::Float,
                TokenKind::Symbol,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dispatch_macros() {
        assert_eq!(
            kinds(r#"#{} #?(:cljs 1) #?@(:cljs [2]) #_x #"a+" #inst"#),
            vec![
                TokenKind::SetOpen,
                TokenKind::RBrace,
                TokenKind::ReaderCond,
                TokenKind::Keyword,
                TokenKind::Int,
                TokenKind::RParen,
                TokenKind::ReaderCondSplice,
                TokenKind::Keyword,
                TokenKind::LBracket,
                TokenKind::Int,
                TokenKind::RBracket,
                TokenKind::RParen,
                TokenKind::Discard,
                TokenKind::Symbol,
                TokenKind::Regex,
                TokenKind::Tag,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_and_commas_skipped() {
        let source = "; leading comment\n[1, 2] ; trailing";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[1].text(source), "1");
    }
}
