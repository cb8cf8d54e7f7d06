//! This module defines the `QuestionRepository` trait, which provides an interface
//! for storing questions and answers and for applying acceptance transitions.
use answerboard_shared::types::{AcceptanceChangeset, Answer, AnswerId, Question, QuestionId};

use crate::errors::RepositoryError;

/// A trait that defines the interface for the question and answer documents.
#[async_trait::async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn insert_question(&self, question: &Question) -> Result<(), RepositoryError>;

    /// Loads a question, including soft-deleted ones.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, RepositoryError>;

    async fn insert_answer(&self, answer: &Answer) -> Result<(), RepositoryError>;

    /// Loads an answer, including soft-deleted ones.
    async fn get_answer(&self, id: AnswerId) -> Result<Option<Answer>, RepositoryError>;

    /// Lists the non-deleted answers of a question, oldest first.
    async fn list_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, RepositoryError>;

    /// Soft-deletes an answer.
    ///
    /// If the answer was the accepted one, its flag and the question pointer
    /// are cleared in the same unit of work.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The answer was deleted
    /// * `Ok(false)` - The answer was absent or already deleted
    async fn soft_delete_answer(&self, id: AnswerId) -> Result<bool, RepositoryError>;

    /// Atomically applies an acceptance transition.
    ///
    /// The previous answer's flag is cleared, the next answer's flag is set and
    /// the question pointer is moved, in that order and as one unit.
    ///
    /// # Errors
    ///
    /// * `RepositoryError::NotFound` - The question, or the next answer, is
    ///   absent, soft-deleted or does not belong to the question
    /// * `RepositoryError::Conflict` - The stored pointer is no longer
    ///   `changeset.previous`
    async fn commit_acceptance(&self, changeset: &AcceptanceChangeset) -> Result<(), RepositoryError>;
}
