mod acceptance;
mod answer;
mod ids;
mod notification;
mod question;
mod votable;
mod vote_direction;
mod vote_ledger;

pub use acceptance::{AcceptanceChangeset, AcceptanceState};
pub use answer::Answer;
pub use ids::{AnswerId, ItemId, NotificationId, QuestionId, UserId};
pub use notification::{Notification, NotificationKind};
pub use question::Question;
pub use votable::{VotableKind, VotableRecord};
pub use vote_direction::{ParseVoteDirectionError, VoteDirection};
pub use vote_ledger::{VoteChange, VoteLedger};
