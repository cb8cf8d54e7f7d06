use std::collections::HashMap;

use crate::types::{UserId, VoteDirection};

/// Describes how a single cast changed a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteChange {
    /// The voter had no entry; one was added.
    Added,
    /// The voter cast the direction they already held; the entry was removed.
    Removed,
    /// The voter cast the opposite direction; the entry was replaced.
    Flipped,
}

/// Per-item record of one vote per voter, with the cached score.
///
/// The score is a cache of the sum of all entries. It is only ever changed
/// together with the entries, through [`VoteLedger::cast`], so the two cannot
/// drift. Ledgers loaded from storage are rebuilt with
/// [`VoteLedger::from_votes`], which recomputes the score from the entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteLedger {
    votes: HashMap<UserId, VoteDirection>,
    score: i64,
}

impl VoteLedger {
    /// Creates an empty ledger with a score of zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from stored entries, recomputing the score.
    pub fn from_votes(votes: HashMap<UserId, VoteDirection>) -> Self {
        let score = votes.values().map(|direction| direction.value()).sum();
        Self { votes, score }
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn votes(&self) -> &HashMap<UserId, VoteDirection> {
        &self.votes
    }

    /// Returns the current vote of `voter`, if any.
    pub fn vote_of(&self, voter: &UserId) -> Option<VoteDirection> {
        self.votes.get(voter).copied()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Applies a vote from `voter` and returns what changed.
    ///
    /// - no entry: the vote is added and the score moves by `direction`;
    /// - same direction: the vote is toggled off and its contribution reversed;
    /// - opposite direction: the vote is replaced and the score moves by
    ///   twice `direction`.
    ///
    /// Self-vote rejection is the caller's job, since only the caller knows
    /// the item's author.
    pub fn cast(&mut self, voter: UserId, direction: VoteDirection) -> VoteChange {
        match self.votes.get(&voter).copied() {
            None => {
                self.votes.insert(voter, direction);
                self.score += direction.value();
                VoteChange::Added
            }
            Some(current) if current == direction => {
                self.votes.remove(&voter);
                self.score -= direction.value();
                VoteChange::Removed
            }
            Some(_) => {
                self.votes.insert(voter, direction);
                self.score += 2 * direction.value();
                VoteChange::Flipped
            }
        }
    }

    /// Sum of all entries, independent of the cached score.
    pub fn recomputed_score(&self) -> i64 {
        self.votes.values().map(|direction| direction.value()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = VoteLedger::new();
        assert_eq!(ledger.score(), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_first_vote_is_added() {
        let mut ledger = VoteLedger::new();
        let voter = Uuid::new_v4();

        assert_eq!(ledger.cast(voter, VoteDirection::Down), VoteChange::Added);
        assert_eq!(ledger.score(), -1);
        assert_eq!(ledger.vote_of(&voter), Some(VoteDirection::Down));
    }

    #[test]
    fn test_same_direction_twice_toggles_off() {
        let mut ledger = VoteLedger::new();
        let other = Uuid::new_v4();
        let voter = Uuid::new_v4();
        ledger.cast(other, VoteDirection::Up);
        let before = ledger.score();

        ledger.cast(voter, VoteDirection::Up);
        assert_eq!(ledger.cast(voter, VoteDirection::Up), VoteChange::Removed);

        assert_eq!(ledger.score(), before);
        assert_eq!(ledger.vote_of(&voter), None);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_opposite_direction_moves_score_by_two() {
        let mut ledger = VoteLedger::new();
        let voter = Uuid::new_v4();

        ledger.cast(voter, VoteDirection::Up);
        let after_up = ledger.score();
        assert_eq!(ledger.cast(voter, VoteDirection::Down), VoteChange::Flipped);

        assert_eq!(ledger.score() - after_up, -2);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_documented_scenario() {
        let mut ledger = VoteLedger::new();
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();

        ledger.cast(u1, VoteDirection::Up);
        assert_eq!(ledger.score(), 1);
        ledger.cast(u2, VoteDirection::Down);
        assert_eq!(ledger.score(), 0);
        ledger.cast(u1, VoteDirection::Down);
        assert_eq!(ledger.score(), -2);
        ledger.cast(u1, VoteDirection::Down);
        assert_eq!(ledger.score(), -1);

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.vote_of(&u2), Some(VoteDirection::Down));
        assert_eq!(ledger.vote_of(&u1), None);
    }

    #[test]
    fn test_score_matches_entries_after_mixed_sequence() {
        let mut ledger = VoteLedger::new();
        let voters: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();

        // Deterministic but irregular pattern of casts across voters.
        for step in 0..60usize {
            let voter = voters[(step * 5 + step / 3) % voters.len()];
            let direction = if (step * 7) % 3 == 0 {
                VoteDirection::Down
            } else {
                VoteDirection::Up
            };
            ledger.cast(voter, direction);
            assert_eq!(ledger.score(), ledger.recomputed_score());
        }
    }

    #[test]
    fn test_from_votes_recomputes_score() {
        let mut votes = HashMap::new();
        votes.insert(Uuid::new_v4(), VoteDirection::Up);
        votes.insert(Uuid::new_v4(), VoteDirection::Up);
        votes.insert(Uuid::new_v4(), VoteDirection::Down);

        let ledger = VoteLedger::from_votes(votes);
        assert_eq!(ledger.score(), 1);
        assert_eq!(ledger.len(), 3);
    }
}
