//! Incremental form reader

use std::collections::VecDeque;

use cinder_ast::{Form, FormKind, LineIndex, Span, Symbol};
use cinder_lexer::{tokenize, Token, TokenKind};

use crate::{DataReaders, ReadError, BUILTIN_TAGS};

/// Reader-conditional features this target selects, in priority order
pub const FEATURES: &[&str] = &["cljs", "default"];

/// Result of one read: a form, or the end-of-input sentinel
#[derive(Debug, Clone, PartialEq)]
pub enum Read {
    Form(Form),
    Eof,
}

/// What reading one item produced
enum Item {
    One(Form),
    /// A spliced reader conditional
    Many(Vec<Form>),
    /// `#_` discard or an unmatched reader conditional
    Nothing,
}

/// Reads forms one at a time from an owned source string
pub struct FormReader {
    source: String,
    tokens: Vec<Token>,
    pos: usize,
    lines: LineIndex,
    data_readers: DataReaders,
    pending: VecDeque<Form>,
}

impl FormReader {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let tokens = tokenize(&source);
        let lines = LineIndex::new(&source);
        Self {
            source,
            tokens,
            pos: 0,
            lines,
            data_readers: DataReaders::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn with_data_readers(mut self, data_readers: DataReaders) -> Self {
        self.data_readers = data_readers;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Read the next top-level form
    pub fn read(&mut self) -> Result<Read, ReadError> {
        loop {
            if let Some(form) = self.pending.pop_front() {
                return Ok(Read::Form(form));
            }
            if self.at(TokenKind::Eof) {
                return Ok(Read::Eof);
            }
            match self.read_item()? {
                Item::One(form) => return Ok(Read::Form(form)),
                Item::Many(forms) => self.pending.extend(forms),
                Item::Nothing => {}
            }
        }
    }

    /// Read every remaining form
    pub fn read_all(&mut self) -> Result<Vec<Form>, ReadError> {
        let mut forms = Vec::new();
        while let Read::Form(form) = self.read()? {
            forms.push(form);
        }
        Ok(forms)
    }

    // === Utilities ===

    fn current(&self) -> &Token {
        // tokenize always ends with Eof, so the last token exists
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn text(&self, token: &Token) -> &str {
        token.text(&self.source)
    }

    fn form(&self, kind: FormKind, span: Span) -> Form {
        Form::new(kind, span, self.lines.position(&self.source, span.start))
    }

    // === Items ===

    fn read_item(&mut self) -> Result<Item, ReadError> {
        let token = self.advance();
        let span = token.span;
        match token.kind {
            TokenKind::Eof => Err(ReadError::UnexpectedEof { span }),
            TokenKind::LParen => {
                let (items, end) = self.read_seq(TokenKind::RParen)?;
                Ok(Item::One(self.form(FormKind::List(items), span.merge(end))))
            }
            TokenKind::LBracket => {
                let (items, end) = self.read_seq(TokenKind::RBracket)?;
                Ok(Item::One(self.form(FormKind::Vector(items), span.merge(end))))
            }
            TokenKind::SetOpen => {
                let (items, end) = self.read_seq(TokenKind::RBrace)?;
                Ok(Item::One(self.form(FormKind::Set(items), span.merge(end))))
            }
            TokenKind::LBrace => {
                let (items, end) = self.read_seq(TokenKind::RBrace)?;
                let span = span.merge(end);
                if items.len() % 2 != 0 {
                    return Err(ReadError::OddMapEntries { span });
                }
                let mut entries = Vec::with_capacity(items.len() / 2);
                let mut items = items.into_iter();
                while let (Some(k), Some(v)) = (items.next(), items.next()) {
                    entries.push((k, v));
                }
                Ok(Item::One(self.form(FormKind::Map(entries), span)))
            }
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                Err(ReadError::UnmatchedDelimiter {
                    found: token.kind.describe().to_string(),
                    span,
                })
            }
            TokenKind::Quote => self.read_wrapped("quote", span),
            TokenKind::Deref => self.read_wrapped("deref", span),
            TokenKind::Meta => {
                // Metadata is read and dropped
                self.read_required()?;
                self.read_item()
            }
            TokenKind::Discard => {
                self.read_required()?;
                Ok(Item::Nothing)
            }
            TokenKind::ReaderCond => self.read_conditional(span, false),
            TokenKind::ReaderCondSplice => self.read_conditional(span, true),
            TokenKind::Tag => self.read_tagged(&token),
            TokenKind::FnOpen
            | TokenKind::SyntaxQuote
            | TokenKind::Unquote
            | TokenKind::UnquoteSplice => Err(ReadError::Unsupported {
                what: token.kind.describe().to_string(),
                span,
            }),
            TokenKind::Error => Err(ReadError::InvalidToken { span }),
            _ => self.read_atom(&token).map(Item::One),
        }
    }

    /// Read exactly one form, skipping discarded items
    fn read_required(&mut self) -> Result<Form, ReadError> {
        loop {
            let span = self.current().span;
            match self.read_item()? {
                Item::One(form) => return Ok(form),
                Item::Many(_) => return Err(ReadError::InvalidSplice { span }),
                Item::Nothing => {}
            }
        }
    }

    /// Read items up to `close`, returning them and the closing token's span
    fn read_seq(&mut self, close: TokenKind) -> Result<(Vec<Form>, Span), ReadError> {
        let mut items = Vec::new();
        loop {
            if self.at(close) {
                let end = self.advance().span;
                return Ok((items, end));
            }
            if self.at(TokenKind::Eof) {
                return Err(ReadError::UnexpectedEof {
                    span: self.current().span,
                });
            }
            if self.peek().is_closing() {
                let token = self.advance();
                return Err(ReadError::unexpected(close.describe(), token.kind, token.span));
            }
            match self.read_item()? {
                Item::One(form) => items.push(form),
                Item::Many(forms) => items.extend(forms),
                Item::Nothing => {}
            }
        }
    }

    fn read_wrapped(&mut self, head: &str, span: Span) -> Result<Item, ReadError> {
        let inner = self.read_required()?;
        let span = span.merge(inner.span);
        let head = self.form(FormKind::Symbol(Symbol::new(head)), span);
        Ok(Item::One(self.form(FormKind::List(vec![head, inner]), span)))
    }

    fn read_conditional(&mut self, span: Span, splice: bool) -> Result<Item, ReadError> {
        let (items, end) = self.read_seq(TokenKind::RParen)?;
        let span = span.merge(end);
        if items.len() % 2 != 0 {
            return Err(ReadError::InvalidReaderConditional { span });
        }

        let mut selected = None;
        for pair in items.chunks(2) {
            let feature = pair[0]
                .as_keyword()
                .ok_or(ReadError::InvalidReaderConditional { span: pair[0].span })?;
            if selected.is_none() && FEATURES.contains(&feature.as_str()) {
                selected = Some(pair[1].clone());
            }
        }

        match selected {
            None => Ok(Item::Nothing),
            Some(form) if splice => match form.kind {
                FormKind::List(items) | FormKind::Vector(items) => Ok(Item::Many(items)),
                _ => Err(ReadError::InvalidSplice { span: form.span }),
            },
            Some(form) => Ok(Item::One(form)),
        }
    }

    fn read_tagged(&mut self, token: &Token) -> Result<Item, ReadError> {
        let tag = Symbol::new(&self.text(token)[1..]);
        let inner = self.read_required()?;
        let span = token.span.merge(inner.span);

        if let Some(reader) = self.data_readers.get(&tag) {
            let form = reader(inner).map_err(|message| ReadError::DataReader {
                tag: tag.to_string(),
                message,
                span,
            })?;
            return Ok(Item::One(form));
        }
        if BUILTIN_TAGS.contains(&tag.as_str()) {
            let kind = FormKind::Tagged {
                tag,
                form: Box::new(inner),
            };
            return Ok(Item::One(self.form(kind, span)));
        }
        Err(ReadError::UnknownTag {
            tag: tag.to_string(),
            span: token.span,
        })
    }

    fn read_atom(&self, token: &Token) -> Result<Form, ReadError> {
        let text = self.text(token);
        let span = token.span;
        let kind = match token.kind {
            TokenKind::Int => FormKind::Int(text.parse().map_err(|_| ReadError::InvalidNumber {
                text: text.to_string(),
                span,
            })?),
            TokenKind::Float => {
                FormKind::Float(text.parse().map_err(|_| ReadError::InvalidNumber {
                    text: text.to_string(),
                    span,
                })?)
            }
            TokenKind::String => FormKind::Str(unescape(&text[1..text.len() - 1], span)?),
            TokenKind::Regex => FormKind::Regex(text[2..text.len() - 1].to_string()),
            TokenKind::Char => FormKind::Char(read_char(&text[1..], span)?),
            TokenKind::Keyword => FormKind::Keyword(Symbol::new(&text[1..])),
            TokenKind::Symbol => match text {
                "nil" => FormKind::Nil,
                "true" => FormKind::Bool(true),
                "false" => FormKind::Bool(false),
                _ => FormKind::Symbol(Symbol::new(text)),
            },
            other => return Err(ReadError::unexpected("form", other, span)),
        };
        Ok(self.form(kind, span))
    }
}

fn unescape(body: &str, span: Span) -> Result<String, ReadError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                out.push(unicode_escape(&hex, span)?);
            }
            _ => return Err(ReadError::InvalidEscape { span }),
        }
    }
    Ok(out)
}

fn read_char(text: &str, span: Span) -> Result<char, ReadError> {
    match text {
        "newline" => Ok('\n'),
        "space" => Ok(' '),
        "tab" => Ok('\t'),
        "return" => Ok('\r'),
        _ if text.len() == 5 && text.starts_with('u') => unicode_escape(&text[1..], span),
        _ => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(ReadError::InvalidEscape { span }),
            }
        }
    }
}

fn unicode_escape(hex: &str, span: Span) -> Result<char, ReadError> {
    u32::from_str_radix(hex, 16)
        .ok()
        .filter(|_| hex.len() == 4)
        .and_then(char::from_u32)
        .ok_or(ReadError::InvalidEscape { span })
}
