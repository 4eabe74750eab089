//! Symbols and JavaScript name munging

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix distinguishing a macro namespace from its runtime namesake
pub const MACROS_SUFFIX: &str = "$macros";

/// A possibly namespace-qualified symbol, e.g. `str`, `clojure.string/join`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Build `ns/name`
    pub fn qualified(ns: &str, name: &str) -> Self {
        Self(format!("{}/{}", ns, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace part of a qualified symbol. A lone `/` is unqualified.
    pub fn namespace(&self) -> Option<&str> {
        if self.0 == "/" {
            return None;
        }
        self.0.split_once('/').map(|(ns, _)| ns).filter(|ns| !ns.is_empty())
    }

    /// Name part of the symbol
    pub fn name(&self) -> &str {
        match self.namespace() {
            Some(ns) => &self.0[ns.len() + 1..],
            None => &self.0,
        }
    }

    /// The macro namespace paired with this namespace (`foo` -> `foo$macros`)
    pub fn macros_ns(&self) -> Symbol {
        if self.is_macros_ns() {
            self.clone()
        } else {
            Symbol(format!("{}{}", self.0, MACROS_SUFFIX))
        }
    }

    pub fn is_macros_ns(&self) -> bool {
        self.0.ends_with(MACROS_SUFFIX)
    }

    /// Runtime namespace of a macro namespace (`foo$macros` -> `foo`)
    pub fn without_macros_suffix(&self) -> Symbol {
        match self.0.strip_suffix(MACROS_SUFFIX) {
            Some(base) => Symbol(base.to_string()),
            None => self.clone(),
        }
    }

    /// Relative module path of a namespace: `foo.bar-baz` -> `foo/bar_baz`
    pub fn relpath(&self) -> String {
        munge(self.without_macros_suffix().as_str()).replace('.', "/")
    }

    /// JavaScript identifier path for this symbol
    pub fn munged(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}.{}", munge(ns), munge(self.name())),
            None => munge(&self.0),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Symbol::new(text)
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Symbol(text)
    }
}

const CHAR_MAP: &[(char, &str)] = &[
    ('-', "_"),
    (':', "_COLON_"),
    ('+', "_PLUS_"),
    ('>', "_GT_"),
    ('<', "_LT_"),
    ('=', "_EQ_"),
    ('~', "_TILDE_"),
    ('!', "_BANG_"),
    ('@', "_CIRCA_"),
    ('#', "_SHARP_"),
    ('\'', "_SINGLEQUOTE_"),
    ('"', "_DOUBLEQUOTE_"),
    ('%', "_PERCENT_"),
    ('^', "_CARET_"),
    ('&', "_AMPERSAND_"),
    ('*', "_STAR_"),
    ('|', "_BAR_"),
    ('{', "_LBRACE_"),
    ('}', "_RBRACE_"),
    ('[', "_LBRACK_"),
    (']', "_RBRACK_"),
    ('/', "_SLASH_"),
    ('\\', "_BSLASH_"),
    ('?', "_QMARK_"),
];

const JS_RESERVED: &[&str] = &[
    "arguments", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "super", "switch",
    "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Munge a name into a JavaScript-safe identifier. Dots are preserved so
/// namespace names stay object paths.
pub fn munge(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match CHAR_MAP.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    let reserved = out.split('.').any(|segment| JS_RESERVED.contains(&segment));
    if reserved {
        out = out
            .split('.')
            .map(|segment| {
                if JS_RESERVED.contains(&segment) {
                    format!("{}$", segment)
                } else {
                    segment.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_and_name() {
        let sym = Symbol::new("clojure.string/join");
        assert_eq!(sym.namespace(), Some("clojure.string"));
        assert_eq!(sym.name(), "join");

        let bare = Symbol::new("inc");
        assert_eq!(bare.namespace(), None);
        assert_eq!(bare.name(), "inc");

        let slash = Symbol::new("/");
        assert_eq!(slash.namespace(), None);
        assert_eq!(slash.name(), "/");
    }

    #[test]
    fn test_relpath() {
        assert_eq!(Symbol::new("foo.bar-baz").relpath(), "foo/bar_baz");
        assert_eq!(Symbol::new("foo.core$macros").relpath(), "foo/core");
    }

    #[test]
    fn test_macros_ns_roundtrip() {
        let ns = Symbol::new("app.macros");
        let macros = ns.macros_ns();
        assert_eq!(macros.as_str(), "app.macros$macros");
        assert!(macros.is_macros_ns());
        assert_eq!(macros.macros_ns(), macros);
        assert_eq!(macros.without_macros_suffix(), ns);
    }

    #[test]
    fn test_munge() {
        assert_eq!(munge("valid?"), "valid_QMARK_");
        assert_eq!(munge("swap!"), "swap_BANG_");
        assert_eq!(munge("my-app.core"), "my_app.core");
        assert_eq!(munge("default"), "default$");
        assert_eq!(Symbol::new("cljs.core/+").munged(), "cljs.core._PLUS_");
    }
}
