//! This module defines the `VotableRepository` trait, the storage interface
//! used by the vote ledger. Both questions and answers are reachable through
//! it, selected by `VotableKind`.
use answerboard_shared::types::{ItemId, VotableKind, VotableRecord, VoteLedger};

use crate::errors::RepositoryError;

/// A trait that defines the interface for reading and conditionally writing
/// the vote ledger of a question or an answer.
#[async_trait::async_trait]
pub trait VotableRepository: Send + Sync {
    /// Loads the voting view of an item.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(VotableRecord))` - The item exists and is not soft-deleted
    /// * `Ok(None)` - The item is absent or soft-deleted
    /// * `Err(RepositoryError)` - Storage failure
    async fn get_votable(
        &self,
        kind: VotableKind,
        id: ItemId,
    ) -> Result<Option<VotableRecord>, RepositoryError>;

    /// Replaces the ledger and cached score of an item if its version is still
    /// `expected_version`, bumping the version on success.
    ///
    /// # Arguments
    ///
    /// * `kind` - Question or answer
    /// * `id` - Item identifier
    /// * `expected_version` - Version the new ledger was computed from
    /// * `ledger` - The new ledger; its score is stored as the cached score
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The write was applied
    /// * `Ok(false)` - The version moved on (or the item vanished); nothing was written
    /// * `Err(RepositoryError)` - Storage failure
    async fn compare_and_swap_ledger(
        &self,
        kind: VotableKind,
        id: ItemId,
        expected_version: i64,
        ledger: &VoteLedger,
    ) -> Result<bool, RepositoryError>;
}
