use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ItemId, UserId, VoteLedger};

/// Represents the kind of content a vote targets.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VotableKind {
    Question,
    Answer,
}

impl VotableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VotableKind::Question => "question",
            VotableKind::Answer => "answer",
        }
    }
}

impl fmt::Display for VotableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The voting view of a question or an answer.
///
/// `version` is bumped by storage on every ledger write and is what
/// compare-and-swap updates are conditioned on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VotableRecord {
    pub kind: VotableKind,
    pub id: ItemId,
    pub author_id: UserId,
    pub ledger: VoteLedger,
    pub version: i64,
}
