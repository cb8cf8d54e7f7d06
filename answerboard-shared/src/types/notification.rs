use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AnswerId, ItemId, NotificationId, QuestionId, UserId, VotableKind, VoteDirection};

/// What a notification is about, together with its payload.
///
/// Serialized internally tagged, e.g.
/// `{"kind":"answer_accepted","question_id":"…","answer_id":"…"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    /// The recipient's answer was accepted by the question author.
    AnswerAccepted {
        question_id: QuestionId,
        answer_id: AnswerId,
    },
    /// Someone voted on content authored by the recipient.
    VoteReceived {
        item_kind: VotableKind,
        item_id: ItemId,
        direction: VoteDirection,
    },
}

impl NotificationKind {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationKind::AnswerAccepted { .. } => "answer_accepted",
            NotificationKind::VoteReceived { .. } => "vote_received",
        }
    }
}

/// A notification addressed to a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    #[serde(flatten)]
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient_id: UserId, kind: NotificationKind) -> Self {
        Self {
            id: NotificationId::new_v4(),
            recipient_id,
            kind,
            read: false,
            created_at: Utc::now(),
        }
    }
}
