use uuid::Uuid;

pub type UserId = Uuid;
pub type QuestionId = Uuid;
pub type AnswerId = Uuid;
pub type NotificationId = Uuid;

/// Identifier of a votable item, either a question or an answer.
pub type ItemId = Uuid;
