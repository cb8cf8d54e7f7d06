//! PostgreSQL implementation of the answerboard repository.
mod repository;

pub use repository::PostgresRepository;
