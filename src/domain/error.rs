use thiserror::Error;

use super::todo::TodoId;

pub type TodoResult<T> = std::result::Result<T, TodoError>;

#[derive(Debug, Error)]
pub enum TodoError {
    /// Caller-supplied text was empty or whitespace-only.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("todo with id {0} not found")]
    NotFound(TodoId),

    /// The storage engine itself failed. Opaque to callers.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl TodoError {
    pub fn empty_text() -> Self {
        Self::InvalidInput("text cannot be empty".into())
    }
}

impl From<sqlx::Error> for TodoError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.into())
    }
}
