//! Creating, reading and soft-deleting questions and answers.
use std::sync::Arc;

use answerboard_repository::QuestionRepository;
use answerboard_shared::types::{Answer, AnswerId, Question, QuestionId, UserId};
use tracing::{info, instrument};

use crate::errors::LedgerError;

/// A question together with its non-deleted answers, oldest first.
#[derive(Debug, Clone)]
pub struct QuestionThread {
    pub question: Question,
    pub answers: Vec<Answer>,
}

pub struct ContentService {
    repository: Arc<dyn QuestionRepository>,
}

impl ContentService {
    pub fn new(repository: Arc<dyn QuestionRepository>) -> Self {
        Self { repository }
    }

    /// Creates a question authored by `author_id`.
    ///
    /// # Errors
    ///
    /// * `LedgerError::ValidationError` - The title or body is blank
    #[instrument(skip_all, fields(author_id = %author_id))]
    pub async fn create_question(
        &self,
        author_id: UserId,
        title: &str,
        body: &str,
    ) -> Result<Question, LedgerError> {
        let title = require_text("title", title)?;
        let body = require_text("body", body)?;

        let question = Question::new(author_id, title, body);
        self.repository.insert_question(&question).await?;

        info!(question_id = %question.id, "Question created");
        Ok(question)
    }

    /// Posts an answer to a live question.
    ///
    /// # Errors
    ///
    /// * `LedgerError::ValidationError` - The body is blank
    /// * `LedgerError::NotFound` - The question is absent or soft-deleted
    #[instrument(skip_all, fields(question_id = %question_id, author_id = %author_id))]
    pub async fn post_answer(
        &self,
        question_id: QuestionId,
        author_id: UserId,
        body: &str,
    ) -> Result<Answer, LedgerError> {
        let body = require_text("body", body)?;
        self.live_question(question_id).await?;

        let answer = Answer::new(question_id, author_id, body);
        self.repository.insert_answer(&answer).await?;

        info!(answer_id = %answer.id, "Answer posted");
        Ok(answer)
    }

    pub async fn get_thread(&self, question_id: QuestionId) -> Result<QuestionThread, LedgerError> {
        let question = self.live_question(question_id).await?;
        let answers = self.repository.list_answers(question_id).await?;
        Ok(QuestionThread { question, answers })
    }

    /// Soft-deletes an answer. Deleting the accepted answer also clears the
    /// question's acceptance.
    ///
    /// # Errors
    ///
    /// * `LedgerError::NotFound` - The answer is absent or already deleted
    /// * `LedgerError::Forbidden` - The requester is not the answer's author
    #[instrument(skip_all, fields(answer_id = %answer_id, requester_id = %requester_id))]
    pub async fn delete_answer(&self, answer_id: AnswerId, requester_id: UserId) -> Result<(), LedgerError> {
        let answer = self
            .repository
            .get_answer(answer_id)
            .await?
            .filter(|answer| !answer.deleted)
            .ok_or_else(|| LedgerError::not_found(format!("answer {answer_id}")))?;

        if answer.author_id != requester_id {
            return Err(LedgerError::forbidden("only the author can delete an answer"));
        }

        if !self.repository.soft_delete_answer(answer_id).await? {
            return Err(LedgerError::not_found(format!("answer {answer_id}")));
        }

        info!(was_accepted = answer.is_accepted, "Answer deleted");
        Ok(())
    }

    async fn live_question(&self, question_id: QuestionId) -> Result<Question, LedgerError> {
        self.repository
            .get_question(question_id)
            .await?
            .filter(|question| !question.deleted)
            .ok_or_else(|| LedgerError::not_found(format!("question {question_id}")))
    }
}

fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}
