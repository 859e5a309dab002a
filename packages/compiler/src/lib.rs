mod attributes;
mod compiler;
mod context;
mod error;
mod object;

pub use compiler::{compile, CompiledTemplate, INIT_NAME, RESULT_NAME};
pub use context::{CompileOptions, CompilerContext, Origin, DEFAULT_FILE};
pub use error::{CompileError, CompileResult};
