use serde::Serialize;
use sourcemap::{SourceMap, SourceMapBuilder as ExternalBuilder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceMapError {
    #[error("Failed to encode source map: {0}")]
    Encode(#[from] sourcemap::Error),

    #[error("Source map is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Line/column pair. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: String,
    pub original: Position,
    pub generated: Position,
}

/// Every mapping produced for one generated file, plus the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapRecord {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_content: Option<String>,
    pub mappings: Vec<Mapping>,
}

impl SourceMapRecord {
    /// Mappings recorded for a generated line.
    pub fn mappings_for_line(&self, line: u32) -> impl Iterator<Item = &Mapping> {
        self.mappings
            .iter()
            .filter(move |mapping| mapping.generated.line == line)
    }

    /// Encode as a version 3 source map.
    pub fn to_sourcemap(&self) -> SourceMap {
        let mut builder = ExternalBuilder::new(Some(&self.file));

        let source_id = builder.add_source(&self.file);
        if let Some(content) = &self.source_content {
            builder.set_source_contents(source_id, Some(content));
        }

        for mapping in &self.mappings {
            let name_id = mapping.name.as_deref().map(|name| builder.add_name(name));
            builder.add_raw(
                mapping.generated.line.saturating_sub(1),
                mapping.generated.column,
                mapping.original.line.saturating_sub(1),
                mapping.original.column,
                Some(source_id),
                name_id,
                false,
            );
        }

        builder.into_sourcemap()
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, SourceMapError> {
        let mut buf = Vec::new();
        self.to_sourcemap().to_writer(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SourceMapRecord {
        SourceMapRecord {
            file: "card.pug".to_string(),
            source_content: Some("div\n  span".to_string()),
            mappings: vec![
                Mapping {
                    name: Some("div".to_string()),
                    source: "card.pug".to_string(),
                    original: Position { line: 1, column: 0 },
                    generated: Position { line: 3, column: 0 },
                },
                Mapping {
                    name: Some("span".to_string()),
                    source: "card.pug".to_string(),
                    original: Position { line: 2, column: 0 },
                    generated: Position { line: 4, column: 0 },
                },
            ],
        }
    }

    #[test]
    fn test_encode_lines_are_zero_based() {
        let map = record().to_sourcemap();

        assert_eq!(map.get_source(0), Some("card.pug"));
        let token = map.lookup_token(3, 0).expect("token for generated line 4");
        assert_eq!(token.get_src_line(), 1);
        assert_eq!(token.get_name(), Some("span"));
    }

    #[test]
    fn test_json_output() {
        let json = record().to_json().unwrap();

        assert!(json.contains("\"version\":3"));
        assert!(json.contains("card.pug"));
        assert!(json.contains("sourcesContent"));
    }

    #[test]
    fn test_mappings_for_line() {
        let record = record();
        let names: Vec<_> = record
            .mappings_for_line(4)
            .filter_map(|m| m.name.as_deref())
            .collect();
        assert_eq!(names, vec!["span"]);
    }
}
