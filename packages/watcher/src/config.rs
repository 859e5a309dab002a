use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Verbosity, from quietest to loudest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
    Verbose,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Silent,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Verbose,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Silent => "silent",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "trace",
        }
    }

    /// Whether messages at `level` are shown when running at `self`.
    pub fn allows(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && level <= *self
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = LogLevel::ALL.iter().map(LogLevel::name).collect();
                format!("unknown log level '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchConfig {
    /// Directories outside the usual tree whose entries are watched too
    pub also_watch_dirs: Vec<PathBuf>,
    /// Paths, relative to the root, that never trigger a rebuild
    pub ignore_watch: Vec<PathBuf>,
    pub follow_symlinks: bool,
    pub outdir: PathBuf,
    pub log_level: LogLevel,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            also_watch_dirs: Vec::new(),
            ignore_watch: Vec::new(),
            follow_symlinks: false,
            outdir: PathBuf::from("build"),
            log_level: LogLevel::default(),
        }
    }
}
