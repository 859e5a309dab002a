use facade_runtime::HookError;
use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("{kind} not implemented (template line {line})")]
    UnsupportedNode { kind: &'static str, line: u32 },

    #[error("Syntax error in `{expression}` at {pos}: {message}")]
    Syntax {
        expression: String,
        pos: usize,
        message: String,
    },

    #[error("'{name}' is not defined")]
    UndefinedVariable { name: String },

    #[error("Unsupported statement: {statement}")]
    UnsupportedStatement { statement: String },

    #[error("Type error: {message}")]
    Type { message: String },

    #[error(transparent)]
    Hook(#[from] HookError),
}

impl EvalError {
    pub fn syntax(expression: &str, pos: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.to_string(),
            pos,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }
}
