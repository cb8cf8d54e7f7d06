//! Identity of the user making a request.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! user's id in the `X-User-Id` header and every operation acts on behalf of
//! that id.
use answerboard_shared::types::UserId;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::AppError;

pub const ACTOR_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| AppError::unauthorized("missing X-User-Id header"))?;

        value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(Actor)
            .ok_or_else(|| AppError::unauthorized("X-User-Id must be a UUID"))
    }
}
