use std::path::{Path, PathBuf};

use clap::ValueEnum;
use facade_watcher::{LogLevel, WatchConfig};
use serde::{Deserialize, Serialize};

use crate::commands::BuildArgs;

pub const DEFAULT_CONFIG_NAME: &str = "facade.config.json";
pub const DEFAULT_OUTDIR: &str = "build";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginName {
    Pug,
    Stylus,
}

/// `facade.config.json`. Every field is optional; command line flags win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub outdir: Option<PathBuf>,
    pub sourcemap: bool,
    pub watch: bool,
    pub also_watch_dirs: Vec<PathBuf>,
    pub ignore_watch: Vec<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub plugins: Option<Vec<PluginName>>,
    pub follow_symlinks: bool,
    /// External program that turns `.pug` source into a JSON template tree
    pub parser_command: Option<String>,
    pub runtime_export: Option<String>,
    pub runtime_module: Option<String>,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Everything one `build` run needs, with paths made absolute.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub entry: PathBuf,
    pub outdir: PathBuf,
    pub sourcemap: bool,
    pub watch: bool,
    pub plugins: Vec<PluginName>,
    pub parser_command: Option<String>,
    pub runtime_export: Option<String>,
    pub runtime_module: Option<String>,
    pub log_level: LogLevel,
    pub watch_config: WatchConfig,
}

impl BuildOptions {
    pub fn resolve(args: BuildArgs, config: Config, cwd: &Path) -> Self {
        let outdir = args
            .outdir
            .or(config.outdir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDIR));
        let log_level = args.log_level.or(config.log_level).unwrap_or_default();
        let follow_symlinks = args.follow_symlinks || config.follow_symlinks;

        let watch_config = WatchConfig {
            also_watch_dirs: prefer(args.also_watch_dirs, config.also_watch_dirs),
            ignore_watch: prefer(args.ignore_watch, config.ignore_watch),
            follow_symlinks,
            outdir: outdir.clone(),
            log_level,
        };

        Self {
            entry: cwd.join(args.entry),
            outdir: cwd.join(outdir),
            sourcemap: args.sourcemap || config.sourcemap,
            watch: args.watch || config.watch,
            plugins: if args.plugins.is_empty() {
                config
                    .plugins
                    .unwrap_or_else(|| vec![PluginName::Pug, PluginName::Stylus])
            } else {
                args.plugins
            },
            parser_command: args.parser_command.or(config.parser_command),
            runtime_export: config.runtime_export,
            runtime_module: config.runtime_module,
            log_level,
            watch_config,
        }
    }
}

fn prefer<T>(flags: Vec<T>, configured: Vec<T>) -> Vec<T> {
    if flags.is_empty() {
        configured
    } else {
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: BuildArgs,
    }

    fn args(argv: &[&str]) -> BuildArgs {
        Harness::parse_from(std::iter::once("facade").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "outdir": "dist",
            "sourcemap": true,
            "alsoWatchDirs": ["../shared"],
            "logLevel": "verbose",
            "plugins": ["stylus"],
            "parserCommand": "node parse.js"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.outdir, Some(PathBuf::from("dist")));
        assert!(config.sourcemap);
        assert_eq!(config.also_watch_dirs, vec![PathBuf::from("../shared")]);
        assert_eq!(config.log_level, Some(LogLevel::Verbose));
        assert_eq!(config.plugins, Some(vec![PluginName::Stylus]));
        assert_eq!(config.parser_command.as_deref(), Some("node parse.js"));
    }

    #[test]
    fn test_defaults() {
        let options = BuildOptions::resolve(args(&["src"]), Config::default(), Path::new("/work"));

        assert_eq!(options.entry, PathBuf::from("/work/src"));
        assert_eq!(options.outdir, PathBuf::from("/work/build"));
        assert_eq!(options.log_level, LogLevel::Info);
        assert_eq!(options.plugins, vec![PluginName::Pug, PluginName::Stylus]);
        assert!(!options.sourcemap && !options.watch);
        assert_eq!(options.watch_config.outdir, PathBuf::from("build"));
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            outdir: Some(PathBuf::from("dist")),
            log_level: Some(LogLevel::Debug),
            ignore_watch: vec![PathBuf::from("fixtures")],
            sourcemap: true,
            ..Config::default()
        };
        let options = BuildOptions::resolve(
            args(&["page.pug", "-o", "out", "-l", "silent", "--ignore-watch", "tmp,cache", "--plugins", "pug"]),
            config,
            Path::new("/work"),
        );

        assert_eq!(options.outdir, PathBuf::from("/work/out"));
        assert_eq!(options.log_level, LogLevel::Silent);
        assert_eq!(
            options.watch_config.ignore_watch,
            vec![PathBuf::from("tmp"), PathBuf::from("cache")]
        );
        assert_eq!(options.plugins, vec![PluginName::Pug]);
        assert!(options.sourcemap);
    }

    #[test]
    fn test_load_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "watch": true }"#).unwrap();
        assert!(Config::load(dir.path()).unwrap().watch);
    }
}
