//! Source map tables and v3 encoding

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceMapError {
    #[error("failed to serialize source map: {0}")]
    Json(#[from] serde_json::Error),
}

/// One mapped position on a generated line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub gen_col: u32,
    pub source_line: u32,
    pub source_col: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Generated line -> segments, for one compiled unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapTable {
    pub lines: BTreeMap<u32, Vec<Segment>>,
}

impl SourceMapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, gen_line: u32, segment: Segment) {
        self.lines.entry(gen_line).or_default().push(segment);
    }

    /// Total number of segments
    pub fn len(&self) -> usize {
        self.lines.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.values().all(Vec::is_empty)
    }
}

/// Source map v3 document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapV3 {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

/// Encode a table as source map v3 JSON with a single source
pub fn encode(
    table: &SourceMapTable,
    file: &str,
    source_name: &str,
    source: &str,
) -> Result<String, SourceMapError> {
    let (mappings, names) = encode_mappings(table);
    let map = SourceMapV3 {
        version: 3,
        file: file.to_string(),
        sources: vec![source_name.to_string()],
        sources_content: vec![source.to_string()],
        names,
        mappings,
    };
    Ok(serde_json::to_string(&map)?)
}

/// Encode the `mappings` field and collect the `names` table
pub fn encode_mappings(table: &SourceMapTable) -> (String, Vec<String>) {
    let mut out = String::new();
    let mut names: Vec<String> = Vec::new();

    // Fields other than the generated column are relative across lines
    let mut prev_source_line = 0i64;
    let mut prev_source_col = 0i64;
    let mut prev_name = 0i64;

    let last_line = match table.lines.keys().next_back() {
        Some(line) => *line,
        None => return (out, names),
    };

    for line in 0..=last_line {
        if line > 0 {
            out.push(';');
        }
        let Some(segments) = table.lines.get(&line) else {
            continue;
        };

        let mut sorted: Vec<&Segment> = segments.iter().collect();
        sorted.sort_by_key(|seg| seg.gen_col);

        let mut prev_gen_col = 0i64;
        for (i, seg) in sorted.into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let gen_col = i64::from(seg.gen_col);
            encode_vlq(&mut out, gen_col - prev_gen_col);
            prev_gen_col = gen_col;

            // single source, index 0
            encode_vlq(&mut out, 0);

            let source_line = i64::from(seg.source_line);
            encode_vlq(&mut out, source_line - prev_source_line);
            prev_source_line = source_line;

            let source_col = i64::from(seg.source_col);
            encode_vlq(&mut out, source_col - prev_source_col);
            prev_source_col = source_col;

            if let Some(name) = &seg.name {
                let index = match names.iter().position(|n| n == name) {
                    Some(index) => index,
                    None => {
                        names.push(name.clone());
                        names.len() - 1
                    }
                } as i64;
                encode_vlq(&mut out, index - prev_name);
                prev_name = index;
            }
        }
    }

    (out, names)
}

const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Append the base64 VLQ encoding of `value`
pub fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_DIGITS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut out = String::new();
        encode_vlq(&mut out, value);
        out
    }

    fn seg(gen_col: u32, source_line: u32, source_col: u32) -> Segment {
        Segment {
            gen_col,
            source_line,
            source_col,
            name: None,
        }
    }

    #[test]
    fn test_vlq_digits() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(123), "2H");
    }

    #[test]
    fn test_mappings_with_empty_line() {
        let mut table = SourceMapTable::new();
        table.add(0, seg(0, 0, 0));
        table.add(0, seg(4, 0, 4));
        table.add(2, seg(2, 1, 0));

        let (mappings, names) = encode_mappings(&table);
        assert_eq!(mappings, "AAAA,IAAI;;EACJ");
        assert!(names.is_empty());
    }

    #[test]
    fn test_names_are_indexed() {
        let mut table = SourceMapTable::new();
        table.add(
            0,
            Segment {
                name: Some("inc".to_string()),
                ..seg(0, 0, 0)
            },
        );
        table.add(
            0,
            Segment {
                name: Some("inc".to_string()),
                ..seg(3, 0, 1)
            },
        );

        let (mappings, names) = encode_mappings(&table);
        assert_eq!(names, vec!["inc".to_string()]);
        assert_eq!(mappings, "AAAAA,GAACA");
    }

    #[test]
    fn test_encode_document() {
        let mut table = SourceMapTable::new();
        table.add(0, seg(0, 0, 0));

        let json = encode(&table, "app_core.js", "app.core", "(ns app.core)").unwrap();
        let map: SourceMapV3 = serde_json::from_str(&json).unwrap();
        assert_eq!(map.version, 3);
        assert_eq!(map.file, "app_core.js");
        assert_eq!(map.sources, vec!["app.core"]);
        assert_eq!(map.sources_content, vec!["(ns app.core)"]);
        assert_eq!(map.mappings, "AAAA");
    }

    #[test]
    fn test_empty_table() {
        let table = SourceMapTable::new();
        assert!(table.is_empty());
        assert_eq!(encode_mappings(&table).0, "");
    }
}
