use facade_sourcemap::SourceMapError;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Error, Debug)]
pub enum CompileError {
    /// No code generation rule exists for this node kind. The whole compile
    /// is abandoned; a template with silently dropped markup is worse.
    #[error("{kind} not implemented (template line {line})")]
    UnsupportedNode { kind: &'static str, line: u32 },

    #[error(transparent)]
    SourceMap(#[from] SourceMapError),
}
