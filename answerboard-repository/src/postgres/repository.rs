//! PostgreSQL implementation of the answerboard repository.
//!
//! Questions and answers are stored one row per document, with the vote
//! ledger kept as a JSONB map of voter id to direction next to the cached
//! `score` column.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - Ledger writes are compare-and-swap updates on `vote_version`
//! - Acceptance transitions run in one transaction with the question row locked
//! - A partial unique index keeps at most one accepted answer per question
//!
//! ## Database Tables
//!
//! - `questions`: Question documents with their ledger and accepted answer pointer
//! - `answers`: Answer documents with their ledger and acceptance flag
//! - `notifications`: Per-recipient notification documents
use std::collections::HashMap;

use answerboard_shared::types::{
    AcceptanceChangeset, Answer, AnswerId, ItemId, Notification, NotificationId,
    NotificationKind, Question, QuestionId, UserId, VotableKind, VotableRecord, VoteDirection,
    VoteLedger,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use crate::{NotificationRepository, QuestionRepository, RepositoryError, VotableRepository};

type VoteHistory = Json<HashMap<UserId, VoteDirection>>;

#[derive(sqlx::FromRow)]
struct VotableRow {
    id: Uuid,
    author_id: Uuid,
    vote_history: VoteHistory,
    vote_version: i64,
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    body: String,
    vote_history: VoteHistory,
    vote_version: i64,
    accepted_answer_id: Option<Uuid>,
    deleted: bool,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AnswerRow {
    id: Uuid,
    question_id: Uuid,
    author_id: Uuid,
    body: String,
    vote_history: VoteHistory,
    vote_version: i64,
    is_accepted: bool,
    deleted: bool,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    payload: Json<NotificationKind>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            body: row.body,
            ledger: VoteLedger::from_votes(row.vote_history.0),
            vote_version: row.vote_version,
            accepted_answer_id: row.accepted_answer_id,
            deleted: row.deleted,
            created_at: row.created_at,
        }
    }
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Answer {
            id: row.id,
            question_id: row.question_id,
            author_id: row.author_id,
            body: row.body,
            ledger: VoteLedger::from_votes(row.vote_history.0),
            vote_version: row.vote_version,
            is_accepted: row.is_accepted,
            deleted: row.deleted,
            created_at: row.created_at,
        }
    }
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            kind: row.payload.0,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

const QUESTION_COLUMNS: &str = "id, author_id, title, body, vote_history, vote_version, accepted_answer_id, deleted, created_at";
const ANSWER_COLUMNS: &str = "id, question_id, author_id, body, vote_history, vote_version, is_accepted, deleted, created_at";

fn table(kind: VotableKind) -> &'static str {
    match kind {
        VotableKind::Question => "questions",
        VotableKind::Answer => "answers",
    }
}

/// PostgreSQL implementation of the answerboard repository.
pub struct PostgresRepository {
    pool: sqlx::PgPool,
}

impl PostgresRepository {
    /// Creates a repository on top of an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with the required schema
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, RepositoryError> {
        Ok(Self { pool })
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("src/postgres/migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait]
impl VotableRepository for PostgresRepository {
    async fn get_votable(
        &self,
        kind: VotableKind,
        id: ItemId,
    ) -> Result<Option<VotableRecord>, RepositoryError> {
        let sql = format!(
            "SELECT id, author_id, vote_history, vote_version FROM {} WHERE id = $1 AND deleted = FALSE",
            table(kind)
        );

        let row = sqlx::query_as::<_, VotableRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| VotableRecord {
            kind,
            id: row.id,
            author_id: row.author_id,
            ledger: VoteLedger::from_votes(row.vote_history.0),
            version: row.vote_version,
        }))
    }

    async fn compare_and_swap_ledger(
        &self,
        kind: VotableKind,
        id: ItemId,
        expected_version: i64,
        ledger: &VoteLedger,
    ) -> Result<bool, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET vote_history = $1, score = $2, vote_version = vote_version + 1
            WHERE id = $3 AND vote_version = $4 AND deleted = FALSE
            "#,
            table(kind)
        );

        let result = sqlx::query(&sql)
            .bind(Json(ledger.votes()))
            .bind(ledger.score())
            .bind(id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl QuestionRepository for PostgresRepository {
    async fn insert_question(&self, question: &Question) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO questions (id, author_id, title, body, score, vote_history, vote_version, accepted_answer_id, deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(question.id)
        .bind(question.author_id)
        .bind(&question.title)
        .bind(&question.body)
        .bind(question.ledger.score())
        .bind(Json(question.ledger.votes()))
        .bind(question.vote_version)
        .bind(question.accepted_answer_id)
        .bind(question.deleted)
        .bind(question.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, RepositoryError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Question::from))
    }

    async fn insert_answer(&self, answer: &Answer) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO answers (id, question_id, author_id, body, score, vote_history, vote_version, is_accepted, deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(answer.id)
        .bind(answer.question_id)
        .bind(answer.author_id)
        .bind(&answer.body)
        .bind(answer.ledger.score())
        .bind(Json(answer.ledger.votes()))
        .bind(answer.vote_version)
        .bind(answer.is_accepted)
        .bind(answer.deleted)
        .bind(answer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_answer(&self, id: AnswerId) -> Result<Option<Answer>, RepositoryError> {
        let sql = format!("SELECT {ANSWER_COLUMNS} FROM answers WHERE id = $1");
        let row = sqlx::query_as::<_, AnswerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Answer::from))
    }

    async fn list_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, RepositoryError> {
        let sql = format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE question_id = $1 AND deleted = FALSE ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, AnswerRow>(&sql)
            .bind(question_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Answer::from).collect())
    }

    async fn soft_delete_answer(&self, id: AnswerId) -> Result<bool, RepositoryError> {
        let question_id: Option<Uuid> =
            sqlx::query_scalar("SELECT question_id FROM answers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(question_id) = question_id else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await?;

        // Question first, then answer: the same order commit_acceptance locks in.
        sqlx::query("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
            .bind(question_id)
            .execute(&mut *tx)
            .await?;

        let was_accepted: Option<bool> = sqlx::query_scalar(
            "SELECT is_accepted FROM answers WHERE id = $1 AND deleted = FALSE FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(was_accepted) = was_accepted else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query("UPDATE answers SET deleted = TRUE, is_accepted = FALSE WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if was_accepted {
            sqlx::query(
                "UPDATE questions SET accepted_answer_id = NULL WHERE id = $1 AND accepted_answer_id = $2",
            )
            .bind(question_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(answer_id = %id, question_id = %question_id, was_accepted, "Soft-deleted answer");
        Ok(true)
    }

    async fn commit_acceptance(&self, changeset: &AcceptanceChangeset) -> Result<(), RepositoryError> {
        let question_id = changeset.question_id;
        let mut tx = self.pool.begin().await?;

        let current: Option<Option<Uuid>> = sqlx::query_scalar(
            "SELECT accepted_answer_id FROM questions WHERE id = $1 AND deleted = FALSE FOR UPDATE",
        )
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Err(RepositoryError::not_found(format!("question {question_id}")));
        };
        if current != changeset.previous {
            tx.rollback().await?;
            return Err(RepositoryError::conflict(format!(
                "question {question_id} accepted answer changed concurrently"
            )));
        }

        if let Some(previous) = changeset.clears() {
            sqlx::query("UPDATE answers SET is_accepted = FALSE WHERE id = $1 AND question_id = $2")
                .bind(previous)
                .bind(question_id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(next) = changeset.sets() {
            let updated = sqlx::query(
                "UPDATE answers SET is_accepted = TRUE WHERE id = $1 AND question_id = $2 AND deleted = FALSE",
            )
            .bind(next)
            .bind(question_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() != 1 {
                tx.rollback().await?;
                return Err(RepositoryError::not_found(format!(
                    "answer {next} of question {question_id}"
                )));
            }
        }

        sqlx::query("UPDATE questions SET accepted_answer_id = $1 WHERE id = $2")
            .bind(changeset.next)
            .bind(question_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for PostgresRepository {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, kind, payload, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(notification.kind.name())
        .bind(Json(&notification.kind))
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        recipient_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_id, payload, read, created_at
            FROM notifications
            WHERE recipient_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(recipient_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn mark_notification_read(
        &self,
        recipient_id: UserId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
