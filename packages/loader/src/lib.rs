//! Bundler plugins for facade sources.
//!
//! Templates are parsed into a template tree, compiled, and wrapped into a
//! module that imports the runtime as `$$`. Stylesheets become a module whose
//! default export is the CSS text.

mod error;
mod filesystem;
mod plugin;
mod stylesheet;
mod template;

pub use error::{LoaderError, LoaderResult};
pub use filesystem::{FileSystem, MemoryFileSystem, RealFileSystem};
pub use plugin::{FailurePolicy, LoadedModule, Loader, LoaderKind, LoaderPlugin, INERT_MODULE};
pub use stylesheet::{PassthroughStyleCompiler, StyleCompiler, StylesheetPlugin};
pub use template::{
    CommandParser, JsonAstParser, TemplateParser, TemplatePlugin, DEFAULT_RUNTIME_EXPORT, DEFAULT_RUNTIME_MODULE,
};
