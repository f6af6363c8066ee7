//! Error types for the workout core

use thiserror::Error;

/// Errors raised by timer, session and storage operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad set index, non-positive duration, empty name, ...
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown exercise id {0}")]
    UnknownExercise(u32),

    /// Storage rejected or failed the operation. Never retried.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl CoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidArgument(msg.into())
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::PersistenceFailure(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
