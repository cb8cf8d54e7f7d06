//! # Answerboard Repository
//! This crate provides traits and implementations for persisting questions,
//! answers, their vote ledgers and user notifications. It includes definitions
//! for errors, interfaces, a PostgreSQL implementation and an in-memory
//! implementation used in tests and database-less deployments.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::RepositoryError;
pub use interfaces::{NotificationRepository, QuestionRepository, VotableRepository};
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
