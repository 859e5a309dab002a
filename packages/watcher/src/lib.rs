//! Watches a project for source changes and triggers rebuilds.

mod config;
mod error;
mod ignore;
mod issues;
mod watcher;

pub use config::{LogLevel, WatchConfig};
pub use error::{WatcherError, WatcherResult};
pub use ignore::IgnoreRules;
pub use issues::{WatchIssueKind, WatchIssues};
pub use watcher::{dispatch, translate, ChangeEvent, FileWatcher, Rebuild};

#[cfg(test)]
mod tests;
