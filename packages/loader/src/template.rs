use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use facade_ast::Node;
use facade_compiler::{compile, CompileOptions};
use regex::Regex;
use tracing::{debug, instrument};

use crate::error::{LoaderError, LoaderResult};
use crate::filesystem::{FileSystem, RealFileSystem};
use crate::plugin::{builtin_filter, path_matches, read_source, FailurePolicy, LoadedModule, LoaderPlugin};

pub const DEFAULT_RUNTIME_EXPORT: &str = "VdomRuntime";
pub const DEFAULT_RUNTIME_MODULE: &str = "@steelskysoftware/facade-builder";

/// Turns template source into a template tree.
pub trait TemplateParser {
    /// Path pattern of the files this parser understands.
    fn filter(&self) -> &'static str;

    fn parse(&self, source: &str, path: &Path) -> LoaderResult<Node>;
}

/// Files that already contain the JSON template tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAstParser;

impl TemplateParser for JsonAstParser {
    fn filter(&self) -> &'static str {
        r"\.pug\.json$"
    }

    fn parse(&self, source: &str, _path: &Path) -> LoaderResult<Node> {
        Ok(Node::from_json(source)?)
    }
}

/// Pipes the template source through an external program that prints the
/// JSON template tree on stdout.
#[derive(Debug, Clone)]
pub struct CommandParser {
    program: String,
    args: Vec<String>,
}

impl CommandParser {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Split a whitespace separated command line, e.g. `node parse-pug.js`.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut words = command.split_whitespace();
        let program = words.next()?;
        Some(Self {
            program: program.to_string(),
            args: words.map(str::to_string).collect(),
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TemplateParser for CommandParser {
    fn filter(&self) -> &'static str {
        r"\.pug$"
    }

    #[instrument(skip(self, source), fields(command = %self.command_line()))]
    fn parse(&self, source: &str, path: &Path) -> LoaderResult<Node> {
        let failed = |message: String| LoaderError::command(self.command_line(), message);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("FACADE_TEMPLATE", path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| failed(err.to_string()))?;

        // Stdin is written from its own thread while both output pipes drain.
        let (output, written) = thread::scope(|scope| {
            let writer = child
                .stdin
                .take()
                .map(|mut stdin| scope.spawn(move || stdin.write_all(source.as_bytes())));
            let output = child.wait_with_output();
            (output, writer.map(|writer| writer.join()))
        });

        let output = output.map_err(|err| failed(err.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("{} ({})", stderr.trim(), output.status)));
        }

        match written {
            Some(Err(_)) => return Err(failed("stdin writer panicked".to_string())),
            Some(Ok(Err(err))) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!("parser exited before reading all of stdin");
            }
            Some(Ok(Err(err))) => return Err(failed(err.to_string())),
            Some(Ok(Ok(()))) | None => {}
        }

        let json = String::from_utf8(output.stdout).map_err(|err| failed(err.to_string()))?;
        debug!(bytes = json.len(), "parser command finished");
        Ok(Node::from_json(&json)?)
    }
}

/// Compiles templates into modules exporting the generated `template`
/// function.
pub struct TemplatePlugin<P: TemplateParser> {
    parser: P,
    filter: Regex,
    runtime_export: String,
    runtime_module: String,
    fs: Box<dyn FileSystem>,
    policy: FailurePolicy,
}

impl<P: TemplateParser> TemplatePlugin<P> {
    pub fn new(parser: P) -> Self {
        let filter = builtin_filter(parser.filter());
        Self {
            parser,
            filter,
            runtime_export: DEFAULT_RUNTIME_EXPORT.to_string(),
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            fs: Box::new(RealFileSystem),
            policy: FailurePolicy::Propagate,
        }
    }

    pub fn with_filter(mut self, pattern: &str) -> LoaderResult<Self> {
        self.filter = Regex::new(pattern)?;
        Ok(self)
    }

    pub fn with_runtime(mut self, export: impl Into<String>, module: impl Into<String>) -> Self {
        self.runtime_export = export.into();
        self.runtime_module = module.into();
        self
    }

    pub fn with_file_system(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The single line placed ahead of the generated function.
    pub fn header(&self) -> String {
        format!(
            "import {{ {} as $$ }} from '{}'",
            self.runtime_export, self.runtime_module
        )
    }

    fn build(&self, path: &Path) -> LoaderResult<LoadedModule> {
        let source = read_source(self.fs.as_ref(), path)?;
        let mut ast = self.parser.parse(&source, path)?;

        let compiled = compile(
            &mut ast,
            CompileOptions {
                file: Some(path.display().to_string()),
                source: Some(source),
                line_offset: 1,
            },
        )?;

        let contents = [
            self.header().as_str(),
            compiled.code.trim_end(),
            "export default template",
        ]
        .join("\n");

        Ok(LoadedModule::script(contents).with_map(compiled.map_json()?))
    }
}

impl<P: TemplateParser> LoaderPlugin for TemplatePlugin<P> {
    fn name(&self) -> &str {
        "pug"
    }

    fn matches(&self, path: &Path) -> bool {
        path_matches(&self.filter, path)
    }

    #[instrument(skip(self), fields(plugin = "pug"))]
    fn load(&self, path: &Path) -> LoaderResult<LoadedModule> {
        let result = self.build(path);
        self.policy.apply(self.name(), path, result)
    }
}
