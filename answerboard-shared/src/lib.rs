//! # Answerboard Shared
//! This crate defines the data structures shared across the answerboard services.
//! It includes the vote ledger kept by every votable item, the question and
//! answer documents, the acceptance transition and the notification messages.
pub mod types;
