//! Per-unit source map accumulation

use cinder_codegen::{Emission, Segment, SourceMapTable};

/// Collects chunk mappings for one unit, offsetting each chunk by where it
/// lands in the unit's generated text. Starts at line 0, column 0.
#[derive(Debug, Default)]
pub struct Accumulator {
    table: SourceMapTable,
    line: u32,
    col: u32,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk that is appended to the unit output
    pub fn push(&mut self, chunk: &Emission) {
        for mapping in &chunk.mappings {
            let gen_col = if mapping.gen_line == 0 {
                self.col + mapping.gen_col
            } else {
                mapping.gen_col
            };
            self.table.add(
                self.line + mapping.gen_line,
                Segment {
                    gen_col,
                    source_line: mapping.source_line,
                    source_col: mapping.source_col,
                    name: mapping.name.clone(),
                },
            );
        }

        for c in chunk.text.chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += c.len_utf16() as u32;
            }
        }
    }

    /// Current generated (line, column)
    pub fn cursor(&self) -> (u32, u32) {
        (self.line, self.col)
    }

    pub fn finish(self) -> SourceMapTable {
        self.table
    }
}

/// Trailing directives naming the synthesized file and inlining the map
pub fn inline_directives(file: &str, map_json: &str) -> String {
    use base64::Engine;
    format!(
        "\n//# sourceURL={}\n//# sourceMappingURL=data:application/json;base64,{}",
        file,
        base64::engine::general_purpose::STANDARD.encode(map_json)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_codegen::Mapping;

    fn mapping(gen_line: u32, gen_col: u32, source_line: u32) -> Mapping {
        Mapping {
            gen_line,
            gen_col,
            source_line,
            source_col: 0,
            name: None,
        }
    }

    #[test]
    fn test_chunks_are_offset_by_cursor() {
        let mut acc = Accumulator::new();
        acc.push(&Emission {
            text: "a = 1;\n".into(),
            mappings: vec![mapping(0, 0, 0)],
        });
        acc.push(&Emission {
            text: "f(\n  x);".into(),
            mappings: vec![mapping(0, 0, 1), mapping(1, 2, 2)],
        });
        acc.push(&Emission {
            text: "g();\n".into(),
            mappings: vec![mapping(0, 0, 3)],
        });

        let table = acc.finish();
        let cols = |line: u32| -> Vec<u32> { table.lines[&line].iter().map(|s| s.gen_col).collect() };
        assert_eq!(cols(0), vec![0]);
        assert_eq!(cols(1), vec![0]);
        // third chunk starts after "  x);" on line 2
        assert_eq!(cols(2), vec![2, 5]);
    }

    #[test]
    fn test_columns_advance_in_utf16_units() {
        let mut acc = Accumulator::new();
        acc.push(&Emission {
            text: "\"\u{1F600}\";".into(),
            mappings: vec![],
        });
        assert_eq!(acc.cursor(), (0, 5));

        acc.push(&Emission {
            text: "x;\n".into(),
            mappings: vec![mapping(0, 0, 0)],
        });
        assert_eq!(acc.finish().lines[&0][0].gen_col, 5);
    }

    #[test]
    fn test_fresh_accumulator_starts_at_zero() {
        let mut first = Accumulator::new();
        first.push(&Emission {
            text: "x;\ny;\n".into(),
            mappings: vec![],
        });
        assert_eq!(first.cursor(), (2, 0));

        assert_eq!(Accumulator::new().cursor(), (0, 0));
    }

    #[test]
    fn test_inline_directives() {
        let text = inline_directives("app_core.js", "{}");
        assert_eq!(
            text,
            "\n//# sourceURL=app_core.js\n//# sourceMappingURL=data:application/json;base64,e30="
        );
    }
}
