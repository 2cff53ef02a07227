use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use herald_broadcast::{BroadcastError, StorageError};
use herald_telegram::TelegramError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("WEBHOOK_URL is not configured")]
    WebhookNotConfigured,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::WebhookNotConfigured => (StatusCode::CONFLICT, self.to_string()),
            Self::Telegram(e) => {
                tracing::warn!(error = %e, "Telegram API call failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            Self::Storage(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::Broadcast(e) => {
                tracing::error!(error = %e, "Broadcast aborted");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
