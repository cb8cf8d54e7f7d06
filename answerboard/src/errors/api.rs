use answerboard_ledger::LedgerError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure of a single HTTP request.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Ledger(LedgerError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            Self::Ledger(LedgerError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Ledger(LedgerError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Ledger(LedgerError::InvalidOperation(_)) => StatusCode::CONFLICT,
            Self::Ledger(LedgerError::Conflict(_) | LedgerError::Repository(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({
                "status": "error",
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use answerboard_repository::RepositoryError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::from(LedgerError::validation("bad")), StatusCode::BAD_REQUEST),
            (AppError::from(LedgerError::not_found("gone")), StatusCode::NOT_FOUND),
            (AppError::from(LedgerError::forbidden("no")), StatusCode::FORBIDDEN),
            (AppError::from(LedgerError::invalid_operation("self vote")), StatusCode::CONFLICT),
            (AppError::from(LedgerError::conflict("busy")), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::from(LedgerError::Repository(RepositoryError::SerializationError(
                    serde_json::from_str::<u8>("x").unwrap_err(),
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::unauthorized("who"), StatusCode::UNAUTHORIZED),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{error}");
        }
    }
}
