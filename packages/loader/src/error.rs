use std::path::PathBuf;

use facade_ast::AstError;
use facade_compiler::CompileError;
use thiserror::Error;

pub type LoaderResult<T> = Result<T, LoaderError>;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ast(#[from] AstError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Parser command `{command}` failed: {message}")]
    Command { command: String, message: String },

    #[error("Invalid path filter: {0}")]
    Filter(#[from] regex::Error),

    #[error("Stylesheet {} failed to compile: {message}", path.display())]
    Style { path: PathBuf, message: String },
}

impl LoaderError {
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        LoaderError::Command {
            command: command.into(),
            message: message.into(),
        }
    }
}
