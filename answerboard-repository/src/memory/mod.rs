//! In-memory implementation of the answerboard repository.
//!
//! All documents live behind a single `tokio::sync::RwLock`, so every write,
//! including a whole acceptance transition, is applied atomically with
//! respect to readers. Used by tests and by deployments running without
//! PostgreSQL.
use std::collections::HashMap;

use answerboard_shared::types::{
    AcceptanceChangeset, Answer, AnswerId, ItemId, Notification, NotificationId, Question,
    QuestionId, UserId, VotableKind, VotableRecord, VoteLedger,
};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{NotificationRepository, QuestionRepository, RepositoryError, VotableRepository};

#[derive(Default)]
struct Store {
    questions: HashMap<QuestionId, Question>,
    answers: HashMap<AnswerId, Answer>,
    notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VotableRepository for InMemoryRepository {
    async fn get_votable(
        &self,
        kind: VotableKind,
        id: ItemId,
    ) -> Result<Option<VotableRecord>, RepositoryError> {
        let store = self.store.read().await;
        let record = match kind {
            VotableKind::Question => store
                .questions
                .get(&id)
                .filter(|question| !question.deleted)
                .map(Question::votable),
            VotableKind::Answer => store
                .answers
                .get(&id)
                .filter(|answer| !answer.deleted)
                .map(Answer::votable),
        };
        Ok(record)
    }

    async fn compare_and_swap_ledger(
        &self,
        kind: VotableKind,
        id: ItemId,
        expected_version: i64,
        ledger: &VoteLedger,
    ) -> Result<bool, RepositoryError> {
        let mut store = self.store.write().await;
        let slot = match kind {
            VotableKind::Question => store
                .questions
                .get_mut(&id)
                .filter(|question| !question.deleted)
                .map(|question| (&mut question.ledger, &mut question.vote_version)),
            VotableKind::Answer => store
                .answers
                .get_mut(&id)
                .filter(|answer| !answer.deleted)
                .map(|answer| (&mut answer.ledger, &mut answer.vote_version)),
        };

        match slot {
            Some((stored, version)) if *version == expected_version => {
                *stored = ledger.clone();
                *version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(&self, question: &Question) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        if store.questions.contains_key(&question.id) {
            return Err(RepositoryError::conflict(format!("question {} already exists", question.id)));
        }
        store.questions.insert(question.id, question.clone());
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, RepositoryError> {
        Ok(self.store.read().await.questions.get(&id).cloned())
    }

    async fn insert_answer(&self, answer: &Answer) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        if !store.questions.contains_key(&answer.question_id) {
            return Err(RepositoryError::not_found(format!("question {}", answer.question_id)));
        }
        if store.answers.contains_key(&answer.id) {
            return Err(RepositoryError::conflict(format!("answer {} already exists", answer.id)));
        }
        store.answers.insert(answer.id, answer.clone());
        Ok(())
    }

    async fn get_answer(&self, id: AnswerId) -> Result<Option<Answer>, RepositoryError> {
        Ok(self.store.read().await.answers.get(&id).cloned())
    }

    async fn list_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, RepositoryError> {
        let store = self.store.read().await;
        let mut answers: Vec<Answer> = store
            .answers
            .values()
            .filter(|answer| answer.question_id == question_id && !answer.deleted)
            .cloned()
            .collect();
        answers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(answers)
    }

    async fn soft_delete_answer(&self, id: AnswerId) -> Result<bool, RepositoryError> {
        let mut store = self.store.write().await;
        let Some(answer) = store.answers.get_mut(&id).filter(|answer| !answer.deleted) else {
            return Ok(false);
        };

        let was_accepted = answer.is_accepted;
        let question_id = answer.question_id;
        answer.deleted = true;
        answer.is_accepted = false;

        if was_accepted {
            if let Some(question) = store.questions.get_mut(&question_id) {
                if question.accepted_answer_id == Some(id) {
                    question.accepted_answer_id = None;
                }
            }
        }
        Ok(true)
    }

    async fn commit_acceptance(&self, changeset: &AcceptanceChangeset) -> Result<(), RepositoryError> {
        let question_id = changeset.question_id;
        let mut store = self.store.write().await;

        let current = match store.questions.get(&question_id) {
            Some(question) if !question.deleted => question.accepted_answer_id,
            _ => return Err(RepositoryError::not_found(format!("question {question_id}"))),
        };
        if current != changeset.previous {
            return Err(RepositoryError::conflict(format!(
                "question {question_id} accepted answer changed concurrently"
            )));
        }

        // Validate before mutating so a failed transition leaves no trace.
        if let Some(next) = changeset.sets() {
            let valid = store
                .answers
                .get(&next)
                .is_some_and(|answer| answer.question_id == question_id && !answer.deleted);
            if !valid {
                return Err(RepositoryError::not_found(format!(
                    "answer {next} of question {question_id}"
                )));
            }
        }

        if let Some(previous) = changeset.clears() {
            if let Some(answer) = store
                .answers
                .get_mut(&previous)
                .filter(|answer| answer.question_id == question_id)
            {
                answer.is_accepted = false;
            }
        }
        if let Some(next) = changeset.sets() {
            if let Some(answer) = store.answers.get_mut(&next) {
                answer.is_accepted = true;
            }
        }
        if let Some(question) = store.questions.get_mut(&question_id) {
            question.accepted_answer_id = changeset.next;
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepository {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), RepositoryError> {
        self.store.write().await.notifications.push(notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        recipient_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let store = self.store.read().await;
        let mut notifications: Vec<Notification> = store
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && (!unread_only || !n.read))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        recipient_id: UserId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError> {
        let mut store = self.store.write().await;
        match store
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
