use crate::record::{Mapping, Position, SourceMapRecord};

/// Builder for generating source maps during compilation
pub struct SourceMapBuilder {
    source_file: String,
    source_content: Option<String>,
    mappings: Vec<Mapping>,
    current_line: u32,
    current_col: u32,
}

impl SourceMapBuilder {
    /// Create a new source map builder
    ///
    /// # Arguments
    /// * `source_file` - The original template path
    /// * `source_content` - The original template text, if available
    pub fn new(source_file: &str, source_content: Option<&str>) -> Self {
        Self {
            source_file: source_file.to_string(),
            source_content: source_content.map(str::to_string),
            mappings: Vec::new(),
            current_line: 1,
            current_col: 0,
        }
    }

    /// Start counting generated lines from `line` instead of 1.
    pub fn starting_at(mut self, line: u32) -> Self {
        self.current_line = line;
        self
    }

    /// Map the current generated line to a line of the template.
    ///
    /// Both sides point at column 0: mappings are per statement.
    pub fn add_mapping(&mut self, src_line: u32, name: Option<&str>) {
        self.mappings.push(Mapping {
            name: name.map(str::to_string),
            source: self.source_file.clone(),
            original: Position {
                line: src_line,
                column: 0,
            },
            generated: Position {
                line: self.current_line,
                column: 0,
            },
        });
    }

    /// Track position advancement as we emit generated code
    ///
    /// Call this after appending text to the output buffer to keep
    /// track of the current position in the generated file.
    pub fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.current_line += 1;
                self.current_col = 0;
            } else {
                self.current_col += 1;
            }
        }
    }

    /// Get the current position in the generated output
    pub fn current_position(&self) -> (u32, u32) {
        (self.current_line, self.current_col)
    }

    pub fn build(self) -> SourceMapRecord {
        SourceMapRecord {
            file: self.source_file,
            source_content: self.source_content,
            mappings: self.mappings,
        }
    }
}
