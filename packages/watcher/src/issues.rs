use std::fmt;

/// Configuration option a [`WatchIssues`] entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchIssueKind {
    AlsoWatchDirs,
}

impl fmt::Display for WatchIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchIssueKind::AlsoWatchDirs => f.write_str("alsoWatchDirs"),
        }
    }
}

/// Non-fatal problems met while setting up a watch, in the order they
/// were found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchIssues {
    entries: Vec<(WatchIssueKind, String)>,
}

impl WatchIssues {
    pub fn record(&mut self, kind: WatchIssueKind, message: impl Into<String>) {
        self.entries.push((kind, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(WatchIssueKind, String)> {
        self.entries.iter()
    }

    /// `[kind]: message`, one per issue.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(kind, message)| format!("[{}]: {}", kind, message))
            .collect()
    }
}
