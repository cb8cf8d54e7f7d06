//! Vote casting on questions and answers.
//!
//! Each cast is a read-modify-write of one item's ledger. The write is a
//! compare-and-swap on the item's ledger version, so two concurrent casts on
//! the same item can never both apply against the same snapshot: the loser
//! re-reads and tries again after a short jittered backoff. Casts on
//! different items never contend.
use std::sync::Arc;
use std::time::Duration;

use answerboard_repository::VotableRepository;
use answerboard_shared::types::{
    ItemId, NotificationKind, UserId, VotableKind, VoteChange, VoteDirection,
};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, instrument};

use crate::errors::LedgerError;
use crate::notifications::NotificationEmitter;

/// Default number of retries after a lost compare-and-swap.
pub const DEFAULT_MAX_RETRIES: usize = 5;

/// Outcome of a successful cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteReceipt {
    /// Score of the item after the cast.
    pub score: i64,
    pub change: VoteChange,
}

pub struct VoteService {
    repository: Arc<dyn VotableRepository>,
    notifications: NotificationEmitter,
    max_retries: usize,
}

impl VoteService {
    pub fn new(repository: Arc<dyn VotableRepository>, notifications: NotificationEmitter) -> Self {
        Self {
            repository,
            notifications,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Casts a vote from `voter_id` on an item.
    ///
    /// Casting the direction the voter already holds removes the vote;
    /// casting the opposite direction replaces it.
    ///
    /// # Errors
    ///
    /// * `LedgerError::NotFound` - The item is absent or soft-deleted
    /// * `LedgerError::InvalidOperation` - The voter authored the item
    /// * `LedgerError::Conflict` - The item stayed contended through every retry
    #[instrument(skip_all, fields(kind = %kind, item_id = %item_id, voter_id = %voter_id, direction = %direction))]
    pub async fn cast_vote(
        &self,
        kind: VotableKind,
        item_id: ItemId,
        voter_id: UserId,
        direction: VoteDirection,
    ) -> Result<VoteReceipt, LedgerError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .max_delay(Duration::from_millis(50))
            .map(jitter)
            .take(self.max_retries);

        let (receipt, author_id) = RetryIf::spawn(
            strategy,
            || self.try_cast(kind, item_id, voter_id, direction),
            LedgerError::is_conflict,
        )
        .await?;

        debug!(score = receipt.score, change = ?receipt.change, "Vote applied");

        if receipt.change != VoteChange::Removed {
            self.notifications.emit(
                author_id,
                NotificationKind::VoteReceived {
                    item_kind: kind,
                    item_id,
                    direction,
                },
            );
        }

        Ok(receipt)
    }

    /// Like [`VoteService::cast_vote`], with the direction given as text
    /// (`"up"` or `"down"`, case-insensitive).
    ///
    /// # Errors
    ///
    /// * `LedgerError::ValidationError` - The direction is neither up nor down
    /// * Any error of [`VoteService::cast_vote`]
    pub async fn cast_raw_vote(
        &self,
        kind: VotableKind,
        item_id: ItemId,
        voter_id: UserId,
        direction: &str,
    ) -> Result<VoteReceipt, LedgerError> {
        let direction = direction.parse::<VoteDirection>()?;
        self.cast_vote(kind, item_id, voter_id, direction).await
    }

    /// One read-compute-swap attempt. A lost swap is reported as `Conflict`.
    async fn try_cast(
        &self,
        kind: VotableKind,
        item_id: ItemId,
        voter_id: UserId,
        direction: VoteDirection,
    ) -> Result<(VoteReceipt, UserId), LedgerError> {
        let record = self
            .repository
            .get_votable(kind, item_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("{kind} {item_id}")))?;

        if record.author_id == voter_id {
            return Err(LedgerError::invalid_operation(format!(
                "cannot vote on your own {kind}"
            )));
        }

        let mut ledger = record.ledger;
        let change = ledger.cast(voter_id, direction);

        let swapped = self
            .repository
            .compare_and_swap_ledger(kind, item_id, record.version, &ledger)
            .await?;
        if !swapped {
            debug!(version = record.version, "Ledger changed concurrently, retrying");
            return Err(LedgerError::conflict(format!("{kind} {item_id} is being voted on concurrently")));
        }

        Ok((
            VoteReceipt {
                score: ledger.score(),
                change,
            },
            record.author_id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use answerboard_repository::{
        InMemoryRepository, NotificationRepository, QuestionRepository, RepositoryError,
    };
    use answerboard_shared::types::{Answer, Question, VotableRecord, VoteLedger};
    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use crate::notifications::NotificationDispatcher;

    async fn seeded() -> (Arc<InMemoryRepository>, Question, Answer) {
        let repository = Arc::new(InMemoryRepository::new());
        let question = Question::new(Uuid::new_v4(), "Title", "Body");
        let answer = Answer::new(question.id, Uuid::new_v4(), "Answer");
        repository.insert_question(&question).await.unwrap();
        repository.insert_answer(&answer).await.unwrap();
        (repository, question, answer)
    }

    fn service(repository: Arc<InMemoryRepository>) -> VoteService {
        VoteService::new(repository, NotificationEmitter::disabled())
    }

    #[tokio::test]
    async fn test_documented_scenario_through_service() {
        let (repository, question, _) = seeded().await;
        let votes = service(repository.clone());
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();
        let kind = VotableKind::Question;

        assert_eq!(votes.cast_vote(kind, question.id, u1, VoteDirection::Up).await.unwrap().score, 1);
        assert_eq!(votes.cast_vote(kind, question.id, u2, VoteDirection::Down).await.unwrap().score, 0);
        assert_eq!(votes.cast_vote(kind, question.id, u1, VoteDirection::Down).await.unwrap().score, -2);

        let receipt = votes.cast_vote(kind, question.id, u1, VoteDirection::Down).await.unwrap();
        assert_eq!(receipt.score, -1);
        assert_eq!(receipt.change, VoteChange::Removed);

        let stored = repository.get_question(question.id).await.unwrap().unwrap();
        assert_eq!(stored.ledger.len(), 1);
        assert_eq!(stored.ledger.vote_of(&u2), Some(VoteDirection::Down));
    }

    #[tokio::test]
    async fn test_malformed_direction_is_validation_error() {
        let (repository, question, _) = seeded().await;
        let votes = service(repository.clone());
        let voter = Uuid::new_v4();

        let err = votes
            .cast_raw_vote(VotableKind::Question, question.id, voter, "sideways")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)));

        let receipt = votes
            .cast_raw_vote(VotableKind::Question, question.id, voter, " Up ")
            .await
            .unwrap();
        assert_eq!(receipt.score, 1);
    }

    #[tokio::test]
    async fn test_self_vote_is_rejected() {
        let (repository, _, answer) = seeded().await;
        let votes = service(repository.clone());

        let err = votes
            .cast_vote(VotableKind::Answer, answer.id, answer.author_id, VoteDirection::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOperation(_)));

        // Still rejected once other votes exist, and nothing was written.
        votes
            .cast_vote(VotableKind::Answer, answer.id, Uuid::new_v4(), VoteDirection::Up)
            .await
            .unwrap();
        let err = votes
            .cast_vote(VotableKind::Answer, answer.id, answer.author_id, VoteDirection::Down)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOperation(_)));

        let stored = repository.get_answer(answer.id).await.unwrap().unwrap();
        assert_eq!(stored.score(), 1);
        assert_eq!(stored.ledger.vote_of(&answer.author_id), None);
    }

    #[tokio::test]
    async fn test_missing_and_deleted_items_are_not_found() {
        let (repository, _, answer) = seeded().await;
        let votes = service(repository.clone());

        let err = votes
            .cast_vote(VotableKind::Question, Uuid::new_v4(), Uuid::new_v4(), VoteDirection::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        repository.soft_delete_answer(answer.id).await.unwrap();
        let err = votes
            .cast_vote(VotableKind::Answer, answer.id, Uuid::new_v4(), VoteDirection::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_question_id_is_not_an_answer() {
        let (repository, question, _) = seeded().await;
        let votes = service(repository);

        let err = votes
            .cast_vote(VotableKind::Answer, question.id, Uuid::new_v4(), VoteDirection::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_vote_notifies_author_except_on_toggle_off() {
        let (repository, _, answer) = seeded().await;
        let (dispatcher, emitter) = NotificationDispatcher::new(repository.clone(), 16);
        let votes = VoteService::new(repository.clone(), emitter);
        let voter = Uuid::new_v4();

        votes.cast_vote(VotableKind::Answer, answer.id, voter, VoteDirection::Up).await.unwrap();
        votes.cast_vote(VotableKind::Answer, answer.id, voter, VoteDirection::Down).await.unwrap();
        votes.cast_vote(VotableKind::Answer, answer.id, voter, VoteDirection::Down).await.unwrap();
        drop(votes);
        dispatcher.run().await;

        let received = repository.list_notifications(answer.author_id, false).await.unwrap();
        assert_eq!(received.len(), 2);
        assert!(received.iter().all(|n| n.kind.name() == "vote_received"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_voters_never_lose_updates() {
        let (repository, question, _) = seeded().await;
        let votes = Arc::new(service(repository.clone()).with_max_retries(10_000));

        let mut handles = Vec::new();
        for i in 0..40 {
            let votes = votes.clone();
            let question_id = question.id;
            handles.push(tokio::spawn(async move {
                let voter = Uuid::new_v4();
                let direction = if i % 4 == 0 { VoteDirection::Down } else { VoteDirection::Up };
                votes
                    .cast_vote(VotableKind::Question, question_id, voter, direction)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repository.get_question(question.id).await.unwrap().unwrap();
        assert_eq!(stored.ledger.len(), 40);
        assert_eq!(stored.score(), 30 - 10);
        assert_eq!(stored.score(), stored.ledger.recomputed_score());
        assert_eq!(stored.vote_version, 40);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_repeat_voters_keep_score_consistent() {
        let (repository, _, answer) = seeded().await;
        let votes = Arc::new(service(repository.clone()).with_max_retries(10_000));
        let voters: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();

        let mut handles = Vec::new();
        for (i, voter) in voters.iter().copied().enumerate() {
            let votes = votes.clone();
            let answer_id = answer.id;
            handles.push(tokio::spawn(async move {
                for step in 0..(i + 3) {
                    let direction = if (i + step) % 3 == 0 { VoteDirection::Down } else { VoteDirection::Up };
                    votes
                        .cast_vote(VotableKind::Answer, answer_id, voter, direction)
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repository.get_answer(answer.id).await.unwrap().unwrap();
        assert_eq!(stored.score(), stored.ledger.recomputed_score());
        assert!(stored.ledger.len() <= voters.len());
    }

    /// Repository whose swaps always lose.
    struct AlwaysStale {
        author_id: UserId,
        attempts: Mutex<usize>,
    }

    #[async_trait]
    impl VotableRepository for AlwaysStale {
        async fn get_votable(
            &self,
            kind: VotableKind,
            id: ItemId,
        ) -> Result<Option<VotableRecord>, RepositoryError> {
            Ok(Some(VotableRecord {
                kind,
                id,
                author_id: self.author_id,
                ledger: VoteLedger::new(),
                version: 0,
            }))
        }

        async fn compare_and_swap_ledger(
            &self,
            _kind: VotableKind,
            _id: ItemId,
            _expected_version: i64,
            _ledger: &VoteLedger,
        ) -> Result<bool, RepositoryError> {
            *self.attempts.lock().await += 1;
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let repository = Arc::new(AlwaysStale {
            author_id: Uuid::new_v4(),
            attempts: Mutex::new(0),
        });
        let votes = VoteService::new(repository.clone(), NotificationEmitter::disabled()).with_max_retries(3);

        let err = votes
            .cast_vote(VotableKind::Question, Uuid::new_v4(), Uuid::new_v4(), VoteDirection::Up)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(*repository.attempts.lock().await, 4);
    }
}
