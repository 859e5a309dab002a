use std::path::Path;

use regex::Regex;
use tracing::error;

use crate::error::{LoaderError, LoaderResult};
use crate::filesystem::FileSystem;

/// Module body substituted for a source that failed to load.
pub const INERT_MODULE: &str = "export default () => {}";

/// How the bundler should interpret [`LoadedModule::contents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    Script,
}

impl LoaderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderKind::Script => "js",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModule {
    pub contents: String,
    pub loader: LoaderKind,
    /// Source map JSON for `contents`, when the plugin produces one
    pub map: Option<String>,
}

impl LoadedModule {
    pub fn script(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            loader: LoaderKind::Script,
            map: None,
        }
    }

    pub fn with_map(mut self, map: String) -> Self {
        self.map = Some(map);
        self
    }

    pub fn inert() -> Self {
        Self::script(INERT_MODULE)
    }
}

/// What a plugin does when loading a file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Propagate,
    /// Log the failure and hand back [`INERT_MODULE`] so the bundle still builds.
    InertModule,
}

impl FailurePolicy {
    pub fn apply(self, plugin: &str, path: &Path, result: LoaderResult<LoadedModule>) -> LoaderResult<LoadedModule> {
        match (self, result) {
            (FailurePolicy::InertModule, Err(err)) => {
                error!(plugin, path = %path.display(), error = %err, "load failed, emitting inert module");
                Ok(LoadedModule::inert())
            }
            (_, result) => result,
        }
    }
}

pub trait LoaderPlugin {
    fn name(&self) -> &str;

    fn matches(&self, path: &Path) -> bool;

    fn load(&self, path: &Path) -> LoaderResult<LoadedModule>;
}

/// Filter for one of the built-in plugins. The patterns are literals.
pub(crate) fn builtin_filter(pattern: &'static str) -> Regex {
    Regex::new(pattern).expect("built-in filter pattern is valid")
}

pub(crate) fn path_matches(filter: &Regex, path: &Path) -> bool {
    filter.is_match(&path.to_string_lossy())
}

pub(crate) fn read_source(fs: &dyn FileSystem, path: &Path) -> LoaderResult<String> {
    fs.read_to_string(path).map_err(|source| LoaderError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Ordered set of plugins; the first one whose filter matches a path loads it.
#[derive(Default)]
pub struct Loader {
    plugins: Vec<Box<dyn LoaderPlugin>>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin(mut self, plugin: impl LoaderPlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    pub fn handles(&self, path: &Path) -> bool {
        self.plugin_for(path).is_some()
    }

    pub fn plugin_for(&self, path: &Path) -> Option<&dyn LoaderPlugin> {
        self.plugins
            .iter()
            .find(|plugin| plugin.matches(path))
            .map(|plugin| plugin.as_ref())
    }

    /// `None` when no plugin claims the path.
    pub fn load(&self, path: &Path) -> Option<LoaderResult<LoadedModule>> {
        self.plugin_for(path).map(|plugin| plugin.load(path))
    }
}
