use facade_ast::Node;
use facade_sourcemap::{SourceMapBuilder, SourceMapRecord};

pub const DEFAULT_FILE: &str = "template.pug";

/// Options for template compilation
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Template path recorded in the source map
    pub file: Option<String>,
    /// Template text embedded as the source map's content
    pub source: Option<String>,
    /// Lines emitted ahead of the generated function by whoever wraps it
    pub line_offset: u32,
}

impl CompileOptions {
    pub fn file_name(&self) -> &str {
        self.file.as_deref().unwrap_or(DEFAULT_FILE)
    }
}

/// Node whose statements are being emitted.
#[derive(Debug, Clone)]
pub struct Origin {
    line: u32,
    name: Option<String>,
}

/// Compilation context for managing state during code generation.
///
/// One context per compile call; nothing here is shared between calls.
pub struct CompilerContext {
    buffer: String,
    indent_level: usize,
    uid: usize,
    origin: Option<Origin>,
    map: SourceMapBuilder,
}

impl CompilerContext {
    pub fn new(options: &CompileOptions) -> Self {
        let map = SourceMapBuilder::new(options.file_name(), options.source.as_deref())
            .starting_at(options.line_offset + 1);

        Self {
            buffer: String::new(),
            indent_level: 0,
            uid: 0,
            origin: None,
            map,
        }
    }

    /// Emit one statement. While a node is being visited the statement is
    /// mapped back to that node's template line.
    pub fn add_line(&mut self, text: &str) {
        if let Some(origin) = &self.origin {
            self.map.add_mapping(origin.line, origin.name.as_deref());
        }

        let indent = "  ".repeat(self.indent_level);
        self.buffer.push_str(&indent);
        self.buffer.push_str(text);
        self.buffer.push('\n');

        self.map.advance(&indent);
        self.map.advance(text);
        self.map.advance("\n");
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Fresh temporary: `e$0`, `e$1`, ...
    pub fn next_temp(&mut self) -> String {
        let name = format!("e${}", self.uid);
        self.uid += 1;
        name
    }

    /// Make `node` the origin of subsequent statements, returning the
    /// previous origin for [`CompilerContext::leave`].
    pub fn enter(&mut self, node: &Node) -> Option<Origin> {
        let origin = Origin {
            line: node.line,
            name: node.name().map(str::to_string),
        };
        self.origin.replace(origin)
    }

    pub fn leave(&mut self, previous: Option<Origin>) {
        self.origin = previous;
    }

    /// Line the next statement will be written to.
    pub fn current_line(&self) -> u32 {
        self.map.current_position().0
    }

    pub fn get_output(&self) -> &str {
        &self.buffer
    }

    pub fn finish(self) -> (String, SourceMapRecord) {
        (self.buffer, self.map.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_counter_follows_newlines() {
        let mut ctx = CompilerContext::new(&CompileOptions::default());
        assert_eq!(ctx.current_line(), 1);

        ctx.add_line("a");
        assert_eq!(ctx.current_line(), 2);

        ctx.add_line("b\nc\nd");
        assert_eq!(ctx.current_line(), 5);
    }

    #[test]
    fn test_line_offset() {
        let options = CompileOptions {
            line_offset: 1,
            ..Default::default()
        };
        let ctx = CompilerContext::new(&options);
        assert_eq!(ctx.current_line(), 2);
    }

    #[test]
    fn test_indentation() {
        let mut ctx = CompilerContext::new(&CompileOptions::default());
        ctx.add_line("{");
        ctx.indent();
        ctx.add_line("x");
        ctx.dedent();
        ctx.dedent();
        ctx.add_line("}");

        assert_eq!(ctx.get_output(), "{\n  x\n}\n");
    }

    #[test]
    fn test_temporaries_increase() {
        let mut ctx = CompilerContext::new(&CompileOptions::default());
        assert_eq!(ctx.next_temp(), "e$0");
        assert_eq!(ctx.next_temp(), "e$1");
        assert_eq!(ctx.next_temp(), "e$2");
    }

    #[test]
    fn test_mapping_only_inside_nodes() {
        let mut ctx = CompilerContext::new(&CompileOptions::default());
        ctx.add_line("function template(__INIT__) {");

        let node = Node::tag("div").at_line(4);
        let previous = ctx.enter(&node);
        ctx.add_line("let e$0 = $$.create(\"div\")");
        ctx.leave(previous);
        ctx.add_line("}");

        let (_, map) = ctx.finish();
        assert_eq!(map.mappings.len(), 1);
        assert_eq!(map.mappings[0].generated.line, 2);
        assert_eq!(map.mappings[0].original.line, 4);
        assert_eq!(map.mappings[0].name.as_deref(), Some("div"));
    }
}
