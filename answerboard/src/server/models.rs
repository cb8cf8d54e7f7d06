// Request and response bodies
use answerboard_ledger::{LedgerError, QuestionThread};
use answerboard_shared::types::{Answer, AnswerId, Question, QuestionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct PostAnswerRequest {
    pub body: String,
}

/// The direction is kept as raw JSON so a missing, non-string or unknown value
/// surfaces as a validation error rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub direction: Option<Value>,
}

impl VoteRequest {
    pub fn direction_text(&self) -> Result<&str, LedgerError> {
        match &self.direction {
            Some(Value::String(direction)) => Ok(direction),
            Some(other) => Err(LedgerError::validation(format!(
                "direction must be \"up\" or \"down\", got {other}"
            ))),
            None => Err(LedgerError::validation("direction is required")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub id: QuestionId,
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    pub score: i64,
    pub accepted_answer_id: Option<AnswerId>,
    pub created_at: DateTime<Utc>,
}

impl From<&Question> for QuestionResponse {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            author_id: question.author_id,
            title: question.title.clone(),
            body: question.body.clone(),
            score: question.score(),
            accepted_answer_id: question.accepted_answer_id,
            created_at: question.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub author_id: UserId,
    pub body: String,
    pub score: i64,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Answer> for AnswerResponse {
    fn from(answer: &Answer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            author_id: answer.author_id,
            body: answer.body.clone(),
            score: answer.score(),
            is_accepted: answer.is_accepted,
            created_at: answer.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadResponse {
    #[serde(flatten)]
    pub question: QuestionResponse,
    pub answers: Vec<AnswerResponse>,
}

impl From<&QuestionThread> for ThreadResponse {
    fn from(thread: &QuestionThread) -> Self {
        Self {
            question: QuestionResponse::from(&thread.question),
            answers: thread.answers.iter().map(AnswerResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub score: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptanceResponse {
    pub accepted: bool,
}
