//! Model and composition error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid name prefix '{0}': {1}")]
    InvalidPrefix(String, String),

    #[error("Unknown stack: {0}")]
    UnknownStack(String),

    #[error("Stack dependency cycle involving: {0}")]
    DependencyCycle(String),

    #[error("Duplicate resource '{0}' in stack '{1}'")]
    DuplicateResource(String, String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
