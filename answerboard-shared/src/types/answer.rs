use chrono::{DateTime, Utc};

use crate::types::{AnswerId, QuestionId, UserId, VotableKind, VotableRecord, VoteLedger};

/// An answer document, owned by exactly one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub author_id: UserId,
    pub body: String,
    pub ledger: VoteLedger,
    pub vote_version: i64,
    pub is_accepted: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    /// Creates a new, unaccepted answer with an empty ledger.
    pub fn new(question_id: QuestionId, author_id: UserId, body: impl Into<String>) -> Self {
        Self {
            id: AnswerId::new_v4(),
            question_id,
            author_id,
            body: body.into(),
            ledger: VoteLedger::new(),
            vote_version: 0,
            is_accepted: false,
            deleted: false,
            created_at: Utc::now(),
        }
    }

    pub fn score(&self) -> i64 {
        self.ledger.score()
    }

    pub fn votable(&self) -> VotableRecord {
        VotableRecord {
            kind: VotableKind::Answer,
            id: self.id,
            author_id: self.author_id,
            ledger: self.ledger.clone(),
            version: self.vote_version,
        }
    }
}
