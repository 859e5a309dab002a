use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::Args;
use colored::Colorize;
use facade_loader::{
    CommandParser, JsonAstParser, LoadedModule, Loader, PassthroughStyleCompiler, StylesheetPlugin, TemplatePlugin,
};
use facade_watcher::{FileWatcher, LogLevel, Rebuild};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{BuildOptions, Config, PluginName};
use crate::logging;

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Template, stylesheet, or a directory of them
    pub entry: PathBuf,

    /// Output directory [default: build]
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Write a source map next to every compiled template
    #[arg(short, long)]
    pub sourcemap: bool,

    /// Rebuild whenever a watched file changes
    #[arg(short, long)]
    pub watch: bool,

    /// Also watch these directories
    #[arg(long, value_delimiter = ',')]
    pub also_watch_dirs: Vec<PathBuf>,

    /// Do not watch these files/paths
    #[arg(long, value_delimiter = ',')]
    pub ignore_watch: Vec<PathBuf>,

    /// silent, error, warning, info, debug or verbose [default: info]
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Plugins to load [default: pug,stylus]
    #[arg(long, value_enum, value_delimiter = ',')]
    pub plugins: Vec<PluginName>,

    /// Also watch symlinked directories and files
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Program that reads pug source on stdin and prints its JSON tree
    #[arg(long)]
    pub parser_command: Option<String>,
}

pub fn build(args: BuildArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let options = BuildOptions::resolve(args, config, cwd);
    logging::init(options.log_level);

    let mut builder = Builder::new(&options)?;
    let failed = builder.build_all()?;

    if !options.watch {
        if failed > 0 {
            bail!("{} file(s) failed to build", failed);
        }
        return Ok(());
    }

    let (watcher, issues) = FileWatcher::new(cwd, &options.watch_config)?;
    if options.log_level.allows(LogLevel::Error) {
        for line in issues.lines() {
            eprintln!("{}", line.yellow());
        }
    }

    println!("\n{}", "👀 Watching for changes...".bright_blue());
    watcher.run(&mut builder);
    Ok(())
}

/// Loads every source under the entry and writes the modules to the output
/// directory, mirroring the entry's layout.
pub struct Builder {
    loader: Loader,
    entry: PathBuf,
    outdir: PathBuf,
    sourcemap: bool,
    quiet: bool,
}

impl Builder {
    pub fn new(options: &BuildOptions) -> Result<Self> {
        if !options.entry.exists() {
            return Err(anyhow!("Entry does not exist: {}", options.entry.display()));
        }

        Ok(Self {
            loader: loader_for(options)?,
            entry: options.entry.clone(),
            outdir: options.outdir.clone(),
            sourcemap: options.sourcemap,
            quiet: !options.log_level.allows(LogLevel::Info),
        })
    }

    /// Source files to build, in a stable order.
    pub fn sources(&self) -> Result<Vec<PathBuf>> {
        if self.entry.is_file() {
            if !self.loader.handles(&self.entry) {
                bail!(
                    "No plugin handles {} (loaded: {})",
                    self.entry.display(),
                    self.loader.names().join(", ")
                );
            }
            return Ok(vec![self.entry.clone()]);
        }

        let outdir = self.outdir.clone();
        let mut files: Vec<PathBuf> = WalkDir::new(&self.entry)
            .into_iter()
            .filter_entry(move |entry| {
                let name = entry.file_name().to_string_lossy();
                entry.depth() == 0 || !(name.starts_with('.') || name == "node_modules" || entry.path() == outdir)
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && self.loader.handles(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Build everything, reporting each file. Returns the number of failures.
    pub fn build_all(&mut self) -> Result<usize> {
        let sources = self.sources()?;
        if sources.is_empty() {
            self.say(format!("{}", "⚠️  No sources found".yellow()));
            return Ok(0);
        }

        self.say(format!("{}", "🔨 Building...".bright_blue().bold()));
        let mut failed = 0;
        for source in &sources {
            let shown = self.relative(source).display().to_string();
            match self.build_file(source) {
                Ok(output) => self.say(format!("  {} {} → {}", "✓".green(), shown, output.display())),
                Err(err) => {
                    failed += 1;
                    eprintln!("  {} {} - {}", "✗".red(), shown, err.to_string().red());
                }
            }
        }

        info!(built = sources.len() - failed, failed, "build finished");
        Ok(failed)
    }

    /// Write one module (and its map) and return the module's path.
    pub fn build_file(&self, source: &Path) -> Result<PathBuf> {
        let module = self
            .loader
            .load(source)
            .ok_or_else(|| anyhow!("No plugin handles {}", source.display()))??;

        let output = self.output_path(source);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = self.write_map(&module, &output)?;
        fs::write(&output, contents)?;
        debug!(source = %source.display(), output = %output.display(), "wrote module");
        Ok(output)
    }

    /// `<outdir>/<relative dir>/<stem>.js`, where the stem stops at the first dot.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        let relative = self.relative(source);
        let name = relative
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.split('.').next().unwrap_or_default();

        let dir = match relative.parent() {
            Some(parent) => self.outdir.join(parent),
            None => self.outdir.clone(),
        };
        dir.join(format!("{}.js", stem))
    }

    fn write_map(&self, module: &LoadedModule, output: &Path) -> Result<String> {
        let (true, Some(map)) = (self.sourcemap, &module.map) else {
            return Ok(module.contents.clone());
        };

        let map_path = output.with_extension("js.map");
        fs::write(&map_path, map)?;

        let map_name = map_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("{}\n//# sourceMappingURL={}\n", module.contents, map_name))
    }

    fn relative<'a>(&self, source: &'a Path) -> &'a Path {
        let base = if self.entry.is_file() {
            self.entry.parent().unwrap_or(&self.entry)
        } else {
            &self.entry
        };
        source.strip_prefix(base).unwrap_or(source)
    }

    fn say(&self, line: String) {
        if !self.quiet {
            println!("{}", line);
        }
    }
}

impl Rebuild for Builder {
    type Error = anyhow::Error;

    fn rebuild(&mut self, _changed: &Path) -> Result<()> {
        match self.build_all()? {
            0 => Ok(()),
            failed => Err(anyhow!("{} file(s) failed to build", failed)),
        }
    }
}

fn loader_for(options: &BuildOptions) -> Result<Loader> {
    let mut loader = Loader::new();

    for plugin in &options.plugins {
        match plugin {
            PluginName::Pug => {
                loader = loader.with_plugin(with_runtime(TemplatePlugin::new(JsonAstParser), options));
                if let Some(command) = &options.parser_command {
                    let parser = CommandParser::from_command_line(command)
                        .ok_or_else(|| anyhow!("--parser-command is empty"))?;
                    loader = loader.with_plugin(with_runtime(TemplatePlugin::new(parser), options));
                }
            }
            PluginName::Stylus => loader = loader.with_plugin(StylesheetPlugin::new(PassthroughStyleCompiler)),
        }
    }

    Ok(loader)
}

fn with_runtime<P: facade_loader::TemplateParser>(plugin: TemplatePlugin<P>, options: &BuildOptions) -> TemplatePlugin<P> {
    match (&options.runtime_export, &options.runtime_module) {
        (None, None) => plugin,
        (export, module) => plugin.with_runtime(
            export.as_deref().unwrap_or(facade_loader::DEFAULT_RUNTIME_EXPORT),
            module.as_deref().unwrap_or(facade_loader::DEFAULT_RUNTIME_MODULE),
        ),
    }
}
