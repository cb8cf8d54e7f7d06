// HTTP request handlers
use answerboard_shared::types::{
    AnswerId, ItemId, Notification, NotificationId, QuestionId, UserId, VotableKind,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::debug;

use crate::errors::AppError;
use crate::server::actor::Actor;
use crate::server::models::{
    AcceptanceResponse, AnswerResponse, CreateQuestionRequest, NotificationQuery,
    PostAnswerRequest, QuestionResponse, ThreadResponse, VoteRequest, VoteResponse,
};
use crate::server::state::AppState;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

pub async fn create_question(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<QuestionResponse>), AppError> {
    let question = state
        .content
        .create_question(actor, &payload.title, &payload.body)
        .await?;
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(&question))))
}

pub async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
) -> Result<Json<ThreadResponse>, AppError> {
    let thread = state.content.get_thread(question_id).await?;
    Ok(Json(ThreadResponse::from(&thread)))
}

pub async fn post_answer(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(question_id): Path<QuestionId>,
    Json(payload): Json<PostAnswerRequest>,
) -> Result<(StatusCode, Json<AnswerResponse>), AppError> {
    let answer = state
        .content
        .post_answer(question_id, actor, &payload.body)
        .await?;
    Ok((StatusCode::CREATED, Json(AnswerResponse::from(&answer))))
}

pub async fn delete_answer(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(answer_id): Path<AnswerId>,
) -> Result<StatusCode, AppError> {
    state.content.delete_answer(answer_id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote_question(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(question_id): Path<QuestionId>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    cast_vote(&state, VotableKind::Question, question_id, actor, &payload).await
}

pub async fn vote_answer(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(answer_id): Path<AnswerId>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    cast_vote(&state, VotableKind::Answer, answer_id, actor, &payload).await
}

async fn cast_vote(
    state: &AppState,
    kind: VotableKind,
    item_id: ItemId,
    actor: UserId,
    payload: &VoteRequest,
) -> Result<Json<VoteResponse>, AppError> {
    let receipt = state
        .votes
        .cast_raw_vote(kind, item_id, actor, payload.direction_text()?)
        .await?;
    debug!(change = ?receipt.change, "Vote request handled");
    Ok(Json(VoteResponse {
        score: receipt.score,
    }))
}

pub async fn accept_answer(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((question_id, answer_id)): Path<(QuestionId, AnswerId)>,
) -> Result<Json<AcceptanceResponse>, AppError> {
    let receipt = state
        .acceptance
        .accept_answer(question_id, answer_id, actor)
        .await?;
    Ok(Json(AcceptanceResponse {
        accepted: receipt.accepted,
    }))
}

pub async fn unaccept_answer(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((question_id, answer_id)): Path<(QuestionId, AnswerId)>,
) -> Result<Json<AcceptanceResponse>, AppError> {
    let receipt = state
        .acceptance
        .unaccept_answer(question_id, answer_id, actor)
        .await?;
    Ok(Json(AcceptanceResponse {
        accepted: receipt.accepted,
    }))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state.inbox.list(actor, query.unread).await?;
    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(notification_id): Path<NotificationId>,
) -> Result<StatusCode, AppError> {
    state.inbox.mark_read(actor, notification_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
