use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    Create(#[from] notify::Error),

    #[error("Cannot watch {}: {message}", path.display())]
    Watch { path: PathBuf, message: String },
}

pub type WatcherResult<T> = Result<T, WatcherError>;
