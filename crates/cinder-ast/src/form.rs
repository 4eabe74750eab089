//! Forms produced by the reader

use crate::{Position, Span, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of source syntax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub kind: FormKind,
    pub span: Span,
    /// Line/column of the form's first character
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormKind {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Regex(String),
    /// Keyword without its leading colon
    Keyword(Symbol),
    Symbol(Symbol),
    List(Vec<Form>),
    Vector(Vec<Form>),
    /// Map entries in source order
    Map(Vec<(Form, Form)>),
    Set(Vec<Form>),
    /// `#tag form` left for the analyzer when no data reader claimed it
    Tagged { tag: Symbol, form: Box<Form> },
}

impl Form {
    pub fn new(kind: FormKind, span: Span, pos: Position) -> Self {
        Self { kind, span, pos }
    }

    /// A form with no source location, for synthesized code
    pub fn synthetic(kind: FormKind) -> Self {
        Self::new(kind, Span::dummy(), Position::default())
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match &self.kind {
            FormKind::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&Symbol> {
        match &self.kind {
            FormKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    /// Elements of a list or vector
    pub fn as_seq(&self) -> Option<&[Form]> {
        match &self.kind {
            FormKind::List(items) | FormKind::Vector(items) => Some(items),
            _ => None,
        }
    }

    /// Head symbol of a list form, e.g. `ns` for `(ns foo)`
    pub fn head_symbol(&self) -> Option<&Symbol> {
        match &self.kind {
            FormKind::List(items) => items.first().and_then(Form::as_symbol),
            _ => None,
        }
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        matches!(&self.kind, FormKind::Keyword(kw) if kw.as_str() == name)
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Form]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match &self.kind {
            FormKind::Nil => f.write_str("nil"),
            FormKind::Bool(b) => write!(f, "{}", b),
            FormKind::Int(n) => write!(f, "{}", n),
            FormKind::Float(n) => write!(f, "{:?}", n),
            FormKind::Str(s) => write!(f, "{:?}", s),
            FormKind::Char(c) => write!(f, "\\{}", c),
            FormKind::Regex(r) => write!(f, "#\"{}\"", r),
            FormKind::Keyword(kw) => write!(f, ":{}", kw),
            FormKind::Symbol(sym) => write!(f, "{}", sym),
            FormKind::List(items) => {
                f.write_str("(")?;
                join(f, items)?;
                f.write_str(")")
            }
            FormKind::Vector(items) => {
                f.write_str("[")?;
                join(f, items)?;
                f.write_str("]")
            }
            FormKind::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", k, v)?;
                }
                f.write_str("}")
            }
            FormKind::Set(items) => {
                f.write_str("#{")?;
                join(f, items)?;
                f.write_str("}")
            }
            FormKind::Tagged { tag, form } => write!(f, "#{} {}", tag, form),
        }
    }
}
