//! Error types for the answerboard service.
//!
//! `ServerError` covers startup and configuration failures and is what
//! `main` returns. `AppError` is what request handlers return; it renders as
//! a JSON error body with a status code chosen from the failure kind.
mod api;

pub use api::AppError;

use answerboard_repository::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
