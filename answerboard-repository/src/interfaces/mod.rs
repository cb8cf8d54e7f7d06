//! This module defines and re-exports the interfaces for the answerboard repository.
//! It serves as a central point for accessing traits related to data interaction.
mod notifications;
mod questions;
mod votable;

pub use notifications::NotificationRepository;
pub use questions::QuestionRepository;
pub use votable::VotableRepository;
