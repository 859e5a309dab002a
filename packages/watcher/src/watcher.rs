use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tracing::{debug, error, info, instrument};

use crate::config::WatchConfig;
use crate::error::{WatcherError, WatcherResult};
use crate::ignore::IgnoreRules;
use crate::issues::{WatchIssueKind, WatchIssues};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Changed(PathBuf),
    Added(PathBuf),
    Removed(PathBuf),
    Error(String),
}

/// Whatever should happen after a watched source changes.
pub trait Rebuild {
    type Error: fmt::Display;

    fn rebuild(&mut self, changed: &Path) -> Result<(), Self::Error>;
}

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    rules: IgnoreRules,
    root: PathBuf,
}

impl FileWatcher {
    /// Watch `root` recursively plus every entry of the configured
    /// `also_watch_dirs`. Missing extra directories are reported, not fatal.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn new(root: &Path, config: &WatchConfig) -> WatcherResult<(Self, WatchIssues)> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|err| WatcherError::Watch {
                path: root.to_path_buf(),
                message: err.to_string(),
            })?;

        let mut issues = WatchIssues::default();
        for dir in &config.also_watch_dirs {
            let dir = root.join(dir);
            let entries = match std::fs::symlink_metadata(&dir).and_then(|_| std::fs::read_dir(&dir)) {
                Ok(entries) => entries,
                Err(_) => {
                    issues.record(WatchIssueKind::AlsoWatchDirs, "path does not exist, skipping");
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                let mode = if path.is_dir() {
                    RecursiveMode::Recursive
                } else {
                    RecursiveMode::NonRecursive
                };
                info!(path = %path.display(), "manually added");
                if let Err(err) = watcher.watch(&path, mode) {
                    error!(path = %path.display(), error = %err, "could not watch extra path");
                }
            }
        }

        let rules = IgnoreRules::new(root, config);
        Ok((
            Self {
                _watcher: watcher,
                receiver: rx,
                rules,
                root: root.to_path_buf(),
            },
            issues,
        ))
    }

    /// Block until the next batch of relevant changes. `None` once the
    /// underlying watcher is gone.
    pub fn next_events(&self) -> Option<Vec<ChangeEvent>> {
        loop {
            let raw = self.receiver.recv().ok()?;
            let events = translate(&self.rules, raw);
            if !events.is_empty() {
                return Some(events);
            }
        }
    }

    /// Like [`FileWatcher::next_events`], giving up after `timeout` with an
    /// empty batch.
    pub fn next_events_timeout(&self, timeout: Duration) -> Option<Vec<ChangeEvent>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(raw) => Some(translate(&self.rules, raw)),
            Err(RecvTimeoutError::Timeout) => Some(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Rebuild on every change until the watcher shuts down.
    pub fn run<R: Rebuild>(&self, rebuilder: &mut R) {
        info!(root = %self.root.display(), "ready.");
        while let Some(events) = self.next_events() {
            for event in events {
                dispatch(&event, rebuilder);
            }
        }
    }
}

/// Log one change and rebuild when a source was modified.
pub fn dispatch<R: Rebuild>(event: &ChangeEvent, rebuilder: &mut R) {
    match event {
        ChangeEvent::Changed(path) => {
            info!(path = %path.display(), "changed");
            match rebuilder.rebuild(path) {
                Ok(()) => info!("rebuilt."),
                Err(err) => error!(path = %path.display(), error = %err, "rebuild failed"),
            }
        }
        ChangeEvent::Added(path) => debug!(path = %path.display(), "added"),
        ChangeEvent::Removed(path) => debug!(path = %path.display(), "unlinked"),
        ChangeEvent::Error(message) => error!(%message, "watch error"),
    }
}

/// Map a raw notification onto change events, dropping ignored paths.
pub fn translate(rules: &IgnoreRules, raw: notify::Result<Event>) -> Vec<ChangeEvent> {
    let event = match raw {
        Ok(event) => event,
        Err(err) => return vec![ChangeEvent::Error(err.to_string())],
    };

    let role = |index: usize| -> Option<fn(PathBuf) -> ChangeEvent> {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeEvent::Added),
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                Some(ChangeEvent::Removed)
            }
            // old path first, new path second
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if index == 0 => Some(ChangeEvent::Removed),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Some(ChangeEvent::Added),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(ChangeEvent::Changed),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
        }
    };

    event
        .paths
        .iter()
        .enumerate()
        .filter_map(|(index, path)| {
            let make = role(index)?;
            (!rules.is_ignored(path)).then(|| make(path.clone()))
        })
        .collect()
}
