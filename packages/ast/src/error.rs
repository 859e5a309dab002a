use thiserror::Error;

pub type AstResult<T> = Result<T, AstError>;

#[derive(Error, Debug)]
pub enum AstError {
    #[error("Invalid template tree: {0}")]
    Decode(#[from] serde_json::Error),
}
