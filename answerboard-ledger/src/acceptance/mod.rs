//! Accepting and unaccepting answers.
//!
//! A question has at most one accepted answer. Every change is planned from
//! the question's current [`AcceptanceState`] as an [`AcceptanceChangeset`]
//! and committed by the repository as a single unit, conditioned on the
//! question still pointing where the plan assumed. If another transition got
//! there first the plan is rebuilt from fresh state and retried.
//!
//! [`AcceptanceChangeset`]: answerboard_shared::types::AcceptanceChangeset
use std::sync::Arc;
use std::time::Duration;

use answerboard_repository::QuestionRepository;
use answerboard_shared::types::{
    AcceptanceState, Answer, AnswerId, NotificationKind, Question, QuestionId, UserId,
};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{info, instrument};

use crate::errors::LedgerError;
use crate::notifications::NotificationEmitter;
use crate::votes::DEFAULT_MAX_RETRIES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceReceipt {
    pub accepted: bool,
}

pub struct AcceptanceService {
    questions: Arc<dyn QuestionRepository>,
    notifications: NotificationEmitter,
    max_retries: usize,
}

impl AcceptanceService {
    pub fn new(questions: Arc<dyn QuestionRepository>, notifications: NotificationEmitter) -> Self {
        Self {
            questions,
            notifications,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Marks `answer_id` as the accepted answer of `question_id`.
    ///
    /// A previously accepted answer is unaccepted as part of the same
    /// transition. Accepting the answer that is already accepted succeeds
    /// without changing anything. On a change, the answer's author is
    /// notified after the transition has been committed.
    ///
    /// # Errors
    ///
    /// * `LedgerError::NotFound` - The question or answer is absent or
    ///   soft-deleted, or the answer belongs to another question
    /// * `LedgerError::Forbidden` - The requester is not the question's author
    #[instrument(skip_all, fields(question_id = %question_id, answer_id = %answer_id, requester_id = %requester_id))]
    pub async fn accept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        requester_id: UserId,
    ) -> Result<AcceptanceReceipt, LedgerError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .max_delay(Duration::from_millis(50))
            .map(jitter)
            .take(self.max_retries);

        let accepted_author = RetryIf::spawn(
            strategy,
            || self.try_accept(question_id, answer_id, requester_id),
            LedgerError::is_conflict,
        )
        .await?;

        if let Some(answer_author) = accepted_author {
            info!("Answer accepted");
            if answer_author != requester_id {
                self.notifications.emit(
                    answer_author,
                    NotificationKind::AnswerAccepted {
                        question_id,
                        answer_id,
                    },
                );
            }
        }

        Ok(AcceptanceReceipt { accepted: true })
    }

    /// Clears the acceptance of `answer_id` on `question_id`.
    ///
    /// # Errors
    ///
    /// * `LedgerError::NotFound` - The question or answer is absent or
    ///   soft-deleted, or the answer belongs to another question
    /// * `LedgerError::Forbidden` - The requester is not the question's author
    /// * `LedgerError::InvalidOperation` - The answer is not the accepted one
    #[instrument(skip_all, fields(question_id = %question_id, answer_id = %answer_id, requester_id = %requester_id))]
    pub async fn unaccept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        requester_id: UserId,
    ) -> Result<AcceptanceReceipt, LedgerError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .max_delay(Duration::from_millis(50))
            .map(jitter)
            .take(self.max_retries);

        RetryIf::spawn(
            strategy,
            || self.try_unaccept(question_id, answer_id, requester_id),
            LedgerError::is_conflict,
        )
        .await?;

        info!("Answer unaccepted");
        Ok(AcceptanceReceipt { accepted: false })
    }

    /// Returns the author of the newly accepted answer, or `None` if it was
    /// already accepted.
    async fn try_accept(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        requester_id: UserId,
    ) -> Result<Option<UserId>, LedgerError> {
        let question = self.authorized_question(question_id, requester_id).await?;
        let answer = self.answer_of(&question, answer_id).await?;

        match AcceptanceState::from(question.accepted_answer_id).accept(question_id, answer_id) {
            Some(changeset) => {
                self.questions.commit_acceptance(&changeset).await?;
                Ok(Some(answer.author_id))
            }
            None => Ok(None),
        }
    }

    async fn try_unaccept(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        requester_id: UserId,
    ) -> Result<(), LedgerError> {
        let question = self.authorized_question(question_id, requester_id).await?;
        self.answer_of(&question, answer_id).await?;

        let changeset = AcceptanceState::from(question.accepted_answer_id)
            .unaccept(question_id, answer_id)
            .ok_or_else(|| {
                LedgerError::invalid_operation(format!("answer {answer_id} is not the accepted answer"))
            })?;

        self.questions.commit_acceptance(&changeset).await?;
        Ok(())
    }

    async fn authorized_question(
        &self,
        question_id: QuestionId,
        requester_id: UserId,
    ) -> Result<Question, LedgerError> {
        let question = self
            .questions
            .get_question(question_id)
            .await?
            .filter(|question| !question.deleted)
            .ok_or_else(|| LedgerError::not_found(format!("question {question_id}")))?;

        if question.author_id != requester_id {
            return Err(LedgerError::forbidden(
                "only the question author can change the accepted answer",
            ));
        }
        Ok(question)
    }

    async fn answer_of(&self, question: &Question, answer_id: AnswerId) -> Result<Answer, LedgerError> {
        self.questions
            .get_answer(answer_id)
            .await?
            .filter(|answer| answer.question_id == question.id && !answer.deleted)
            .ok_or_else(|| {
                LedgerError::not_found(format!("answer {answer_id} of question {}", question.id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use answerboard_repository::{InMemoryRepository, NotificationRepository, RepositoryError};
    use answerboard_shared::types::{Notification, NotificationId};
    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::notifications::NotificationDispatcher;

    struct Fixture {
        repository: Arc<InMemoryRepository>,
        service: AcceptanceService,
        question: Question,
        answers: Vec<Answer>,
    }

    async fn fixture(answer_count: usize) -> Fixture {
        let repository = Arc::new(InMemoryRepository::new());
        let question = Question::new(Uuid::new_v4(), "Title", "Body");
        repository.insert_question(&question).await.unwrap();

        let mut answers = Vec::new();
        for i in 0..answer_count {
            let answer = Answer::new(question.id, Uuid::new_v4(), format!("Answer {i}"));
            repository.insert_answer(&answer).await.unwrap();
            answers.push(answer);
        }

        let service = AcceptanceService::new(repository.clone(), NotificationEmitter::disabled());
        Fixture {
            repository,
            service,
            question,
            answers,
        }
    }

    /// Checks that at most one answer is flagged and that it matches the pointer.
    async fn assert_single_accepted(repository: &InMemoryRepository, question_id: QuestionId) -> Option<AnswerId> {
        let question = repository.get_question(question_id).await.unwrap().unwrap();
        let flagged: Vec<AnswerId> = repository
            .list_answers(question_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|answer| answer.is_accepted)
            .map(|answer| answer.id)
            .collect();

        assert!(flagged.len() <= 1, "more than one accepted answer: {flagged:?}");
        assert_eq!(flagged.first().copied(), question.accepted_answer_id);
        question.accepted_answer_id
    }

    #[tokio::test]
    async fn test_accept_then_switch_then_unaccept() {
        let f = fixture(2).await;
        let (a, b) = (f.answers[0].id, f.answers[1].id);
        let owner = f.question.author_id;

        let receipt = f.service.accept_answer(f.question.id, a, owner).await.unwrap();
        assert!(receipt.accepted);
        assert_eq!(assert_single_accepted(&f.repository, f.question.id).await, Some(a));

        f.service.accept_answer(f.question.id, b, owner).await.unwrap();
        assert_eq!(assert_single_accepted(&f.repository, f.question.id).await, Some(b));
        assert!(!f.repository.get_answer(a).await.unwrap().unwrap().is_accepted);

        let receipt = f.service.unaccept_answer(f.question.id, b, owner).await.unwrap();
        assert!(!receipt.accepted);
        assert_eq!(assert_single_accepted(&f.repository, f.question.id).await, None);
    }

    #[tokio::test]
    async fn test_accepting_accepted_answer_is_idempotent() {
        let f = fixture(1).await;
        let a = f.answers[0].id;
        let owner = f.question.author_id;

        f.service.accept_answer(f.question.id, a, owner).await.unwrap();
        f.service.accept_answer(f.question.id, a, owner).await.unwrap();

        assert_eq!(assert_single_accepted(&f.repository, f.question.id).await, Some(a));
    }

    #[tokio::test]
    async fn test_only_question_author_may_accept_or_unaccept() {
        let f = fixture(1).await;
        let a = f.answers[0].id;

        let err = f.service.accept_answer(f.question.id, a, f.answers[0].author_id).await.unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden(_)));

        f.service.accept_answer(f.question.id, a, f.question.author_id).await.unwrap();
        let err = f.service.unaccept_answer(f.question.id, a, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden(_)));
        assert_eq!(assert_single_accepted(&f.repository, f.question.id).await, Some(a));
    }

    #[tokio::test]
    async fn test_unknown_foreign_and_deleted_answers_are_not_found() {
        let f = fixture(2).await;
        let owner = f.question.author_id;

        let err = f.service.accept_answer(f.question.id, Uuid::new_v4(), owner).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let err = f.service.accept_answer(Uuid::new_v4(), f.answers[0].id, owner).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let other = Question::new(owner, "Other", "Body");
        let foreign = Answer::new(other.id, Uuid::new_v4(), "Foreign");
        f.repository.insert_question(&other).await.unwrap();
        f.repository.insert_answer(&foreign).await.unwrap();
        let err = f.service.accept_answer(f.question.id, foreign.id, owner).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        f.service.accept_answer(f.question.id, f.answers[1].id, owner).await.unwrap();
        f.repository.soft_delete_answer(f.answers[0].id).await.unwrap();
        let err = f.service.accept_answer(f.question.id, f.answers[0].id, owner).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        // The failed accept left the existing acceptance alone.
        assert_eq!(
            assert_single_accepted(&f.repository, f.question.id).await,
            Some(f.answers[1].id)
        );
    }

    #[tokio::test]
    async fn test_unaccept_of_non_accepted_answer_is_invalid() {
        let f = fixture(2).await;
        let (a, b) = (f.answers[0].id, f.answers[1].id);
        let owner = f.question.author_id;

        let err = f.service.unaccept_answer(f.question.id, a, owner).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOperation(_)));
        assert_eq!(assert_single_accepted(&f.repository, f.question.id).await, None);

        f.service.accept_answer(f.question.id, a, owner).await.unwrap();
        let err = f.service.unaccept_answer(f.question.id, b, owner).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOperation(_)));
        assert_eq!(assert_single_accepted(&f.repository, f.question.id).await, Some(a));
    }

    #[tokio::test]
    async fn test_accept_notifies_answer_author() {
        let f = fixture(1).await;
        let (dispatcher, emitter) = NotificationDispatcher::new(f.repository.clone(), 8);
        let service = AcceptanceService::new(f.repository.clone(), emitter);
        let answer = &f.answers[0];

        service.accept_answer(f.question.id, answer.id, f.question.author_id).await.unwrap();
        // Re-accepting changes nothing and sends nothing.
        service.accept_answer(f.question.id, answer.id, f.question.author_id).await.unwrap();
        drop(service);
        dispatcher.run().await;

        let received = f.repository.list_notifications(answer.author_id, false).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0].kind,
            NotificationKind::AnswerAccepted {
                question_id: f.question.id,
                answer_id: answer.id,
            }
        );
    }

    #[tokio::test]
    async fn test_accepting_own_answer_sends_nothing() {
        let repository = Arc::new(InMemoryRepository::new());
        let owner = Uuid::new_v4();
        let question = Question::new(owner, "Title", "Body");
        let answer = Answer::new(question.id, owner, "Self answer");
        repository.insert_question(&question).await.unwrap();
        repository.insert_answer(&answer).await.unwrap();

        let (dispatcher, emitter) = NotificationDispatcher::new(repository.clone(), 8);
        let service = AcceptanceService::new(repository.clone(), emitter);
        service.accept_answer(question.id, answer.id, owner).await.unwrap();
        drop(service);
        dispatcher.run().await;

        assert!(repository.list_notifications(owner, false).await.unwrap().is_empty());
    }

    struct BrokenSink;

    #[async_trait]
    impl NotificationRepository for BrokenSink {
        async fn insert_notification(&self, _: &Notification) -> Result<(), RepositoryError> {
            Err(RepositoryError::conflict("sink unavailable"))
        }

        async fn list_notifications(&self, _: UserId, _: bool) -> Result<Vec<Notification>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn mark_notification_read(&self, _: UserId, _: NotificationId) -> Result<bool, RepositoryError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_undo_acceptance() {
        let f = fixture(1).await;
        let (dispatcher, emitter) = NotificationDispatcher::new(Arc::new(BrokenSink), 8);
        let handle = dispatcher.spawn();
        let service = AcceptanceService::new(f.repository.clone(), emitter);

        let receipt = service
            .accept_answer(f.question.id, f.answers[0].id, f.question.author_id)
            .await
            .unwrap();
        drop(service);
        handle.await.unwrap();

        assert!(receipt.accepted);
        assert_eq!(
            assert_single_accepted(&f.repository, f.question.id).await,
            Some(f.answers[0].id)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accepts_leave_exactly_one_accepted() {
        let f = fixture(6).await;
        let service = Arc::new(
            AcceptanceService::new(f.repository.clone(), NotificationEmitter::disabled())
                .with_max_retries(10_000),
        );

        let mut handles = Vec::new();
        for answer in &f.answers {
            let service = service.clone();
            let (question_id, answer_id, owner) = (f.question.id, answer.id, f.question.author_id);
            handles.push(tokio::spawn(async move {
                service.accept_answer(question_id, answer_id, owner).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let accepted = assert_single_accepted(&f.repository, f.question.id).await;
        assert!(accepted.is_some());
    }
}
