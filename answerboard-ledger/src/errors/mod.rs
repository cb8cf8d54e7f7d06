//! Error types for the answerboard ledger services.
mod ledger;

pub use ledger::LedgerError;
