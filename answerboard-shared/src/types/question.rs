use chrono::{DateTime, Utc};

use crate::types::{AnswerId, QuestionId, UserId, VotableKind, VotableRecord, VoteLedger};

/// A question document.
///
/// `accepted_answer_id` points at the single accepted answer, if any. When it
/// is set, that answer's `is_accepted` flag is true and no other answer of
/// this question has it set.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    pub ledger: VoteLedger,
    pub vote_version: i64,
    pub accepted_answer_id: Option<AnswerId>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Creates a new question with an empty ledger and no accepted answer.
    pub fn new(author_id: UserId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: QuestionId::new_v4(),
            author_id,
            title: title.into(),
            body: body.into(),
            ledger: VoteLedger::new(),
            vote_version: 0,
            accepted_answer_id: None,
            deleted: false,
            created_at: Utc::now(),
        }
    }

    pub fn score(&self) -> i64 {
        self.ledger.score()
    }

    pub fn votable(&self) -> VotableRecord {
        VotableRecord {
            kind: VotableKind::Question,
            id: self.id,
            author_id: self.author_id,
            ledger: self.ledger.clone(),
            version: self.vote_version,
        }
    }
}
