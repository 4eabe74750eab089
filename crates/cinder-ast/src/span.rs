//! Source location tracking

use serde::{Deserialize, Serialize};

/// A span representing a range in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start
    pub start: usize,
    /// Byte offset of the end (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Merge two spans into one that covers both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

/// Zero-based line/column of a source location, as source maps expect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Maps byte offsets to line/column positions
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Position of a byte offset; columns count UTF-16 code units, not bytes
    pub fn position(&self, source: &str, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let end = offset.min(source.len());
        let column = source.get(start..end).map(|s| s.encode_utf16().count()).unwrap_or(0);
        Position::new(line as u32, column as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let source = "(ns a)\n(def x 1)\n  y";
        let index = LineIndex::new(source);
        assert_eq!(index.position(source, 0), Position::new(0, 0));
        assert_eq!(index.position(source, 7), Position::new(1, 0));
        assert_eq!(index.position(source, 12), Position::new(1, 5));
        assert_eq!(index.position(source, 19), Position::new(2, 2));
    }

    #[test]
    fn test_columns_count_utf16_units() {
        let source = "(str \"\u{1F600}\" x)";
        let index = LineIndex::new(source);
        let x = source.find('x').unwrap();
        // the emoji is two UTF-16 units
        assert_eq!(index.position(source, x), Position::new(0, 10));
    }

    #[test]
    fn test_merge() {
        let span = Span::new(4, 8).merge(Span::new(2, 5));
        assert_eq!(span, Span::new(2, 8));
    }
}
