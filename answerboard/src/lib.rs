//! # Answerboard
//! HTTP service for questions, answers, votes and accepted answers.
//!
//! ## Modules
//!
//! - [`config`]: environment configuration and dependency wiring
//! - [`server`]: axum router, handlers and the acting-user extractor
//! - [`errors`]: startup errors and the HTTP error response
pub mod config;
pub mod errors;
pub mod server;

pub use config::{Config, Dependencies, StorageBackend};
pub use errors::{AppError, ServerError};
