//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::clients::assistant::AssistantError;
use crate::clients::monitor::UpstreamError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Auth errors
    TokenInvalid,
    Unauthorized,
    Forbidden,

    // Validation errors
    ValidationError(String),

    // External service errors
    Upstream(UpstreamError),
    Assistant(AssistantError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::TokenInvalid => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upstream(err) => {
                tracing::error!("Upstream error: {}", err);
                (StatusCode::BAD_GATEWAY, "Monitoring backend error".to_string())
            }
            AppError::Assistant(err) => {
                tracing::error!("Assistant error: {}", err);
                (StatusCode::BAD_GATEWAY, "Summarization backend error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        AppError::Upstream(err)
    }
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        AppError::Assistant(err)
    }
}
