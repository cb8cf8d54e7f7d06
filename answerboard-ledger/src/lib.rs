//! # Answerboard Ledger
//! This crate holds the state-transition logic of answerboard: the per-item
//! vote ledger, the single-accepted-answer rule and the best-effort
//! notification dispatch that follows both.
//!
//! ## Modules
//!
//! - [`votes`]: casts votes through an optimistic compare-and-swap on the item's ledger
//! - [`acceptance`]: accepts and unaccepts answers as single transitions
//! - [`notifications`]: hands notifications to a background dispatcher
//! - [`content`]: creates, reads and soft-deletes questions and answers
//! - [`errors`]: error types shared by the services
pub mod acceptance;
pub mod content;
pub mod errors;
pub mod notifications;
pub mod votes;

pub use acceptance::{AcceptanceReceipt, AcceptanceService};
pub use content::{ContentService, QuestionThread};
pub use errors::LedgerError;
pub use notifications::{NotificationDispatcher, NotificationEmitter, NotificationInbox};
pub use votes::{VoteReceipt, VoteService};
