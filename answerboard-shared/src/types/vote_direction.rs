use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents the direction of a vote cast by a user.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    /// Indicates an upvote, contributing `+1` to the score.
    Up,
    /// Indicates a downvote, contributing `-1` to the score.
    Down,
}

/// Returned when a string is neither `up` nor `down`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid vote direction '{0}', expected 'up' or 'down'")]
pub struct ParseVoteDirectionError(pub String);

impl VoteDirection {
    /// Signed contribution of this direction to an item's score.
    pub fn value(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            VoteDirection::Up => VoteDirection::Down,
            VoteDirection::Down => VoteDirection::Up,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = ParseVoteDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            _ => Err(ParseVoteDirectionError(s.to_string())),
        }
    }
}
