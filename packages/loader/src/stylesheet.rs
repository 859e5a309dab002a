use std::path::Path;

use regex::Regex;
use tracing::instrument;

use crate::error::LoaderResult;
use crate::filesystem::{FileSystem, RealFileSystem};
use crate::plugin::{builtin_filter, path_matches, read_source, FailurePolicy, LoadedModule, LoaderPlugin};

const STYLESHEET_FILTER: &str = r"\.styl$";

/// Turns stylesheet source into plain CSS.
pub trait StyleCompiler {
    fn compile(&self, source: &str, path: &Path) -> LoaderResult<String>;
}

/// For sources that are already CSS.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughStyleCompiler;

impl StyleCompiler for PassthroughStyleCompiler {
    fn compile(&self, source: &str, _path: &Path) -> LoaderResult<String> {
        Ok(source.to_string())
    }
}

/// Exposes compiled CSS as the default export of a script module.
pub struct StylesheetPlugin<C: StyleCompiler> {
    compiler: C,
    filter: Regex,
    fs: Box<dyn FileSystem>,
    policy: FailurePolicy,
}

impl<C: StyleCompiler> StylesheetPlugin<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            filter: builtin_filter(STYLESHEET_FILTER),
            fs: Box::new(RealFileSystem),
            policy: FailurePolicy::InertModule,
        }
    }

    pub fn with_filter(mut self, pattern: &str) -> LoaderResult<Self> {
        self.filter = Regex::new(pattern)?;
        Ok(self)
    }

    pub fn with_file_system(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn build(&self, path: &Path) -> LoaderResult<LoadedModule> {
        let source = read_source(self.fs.as_ref(), path)?;
        let css = self.compiler.compile(&source, path)?;
        Ok(LoadedModule::script(format!("export default `{}`", escape_template(&css))))
    }
}

impl<C: StyleCompiler> LoaderPlugin for StylesheetPlugin<C> {
    fn name(&self) -> &str {
        "stylus"
    }

    fn matches(&self, path: &Path) -> bool {
        path_matches(&self.filter, path)
    }

    #[instrument(skip(self), fields(plugin = "stylus"))]
    fn load(&self, path: &Path) -> LoaderResult<LoadedModule> {
        let result = self.build(path);
        self.policy.apply(self.name(), path, result)
    }
}

/// Keep the CSS byte-for-byte inside a template literal.
fn escape_template(css: &str) -> String {
    css.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_template() {
        assert_eq!(escape_template("a { content: \"\\201C\" }"), "a { content: \"\\\\201C\" }");
        assert_eq!(escape_template("`${x}`"), "\\`\\${x}\\`");
        assert_eq!(escape_template("p { color: red }"), "p { color: red }");
    }
}
