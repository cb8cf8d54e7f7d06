//! Error types for the answerboard repository.
//! Defines specific errors that can occur during storage operations.
use thiserror::Error;

/// Represents errors that can occur within the repository.
///
/// `NotFound` and `Conflict` are raised by guarded writes: the former when a
/// row the write depends on is missing or soft-deleted, the latter when a
/// concurrent writer changed the state the write was conditioned on.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
