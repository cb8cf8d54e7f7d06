//! Error types returned by the vote, acceptance and content services.
use answerboard_repository::RepositoryError;
use answerboard_shared::types::ParseVoteDirectionError;
use thiserror::Error;

/// Represents errors that can occur within the ledger services.
///
/// The first four variants are business-rule violations and are surfaced to
/// the caller as they are; none of them is retried. `Conflict` is only
/// returned once the bounded retries on a contended item are exhausted.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<RepositoryError> for LedgerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => Self::NotFound(msg),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Repository(other),
        }
    }
}

impl From<ParseVoteDirectionError> for LedgerError {
    fn from(err: ParseVoteDirectionError) -> Self {
        Self::ValidationError(err.to_string())
    }
}
