use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short message suitable for a toast in the UI.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::UnprocessableEntity(msg) => msg.clone(),
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Llm(LlmError::Auth(_)) => {
                "The AI provider rejected the configured API key".to_string()
            }
            AppError::Llm(LlmError::AccessDenied(_)) => {
                "The AI model is not enabled for this account".to_string()
            }
            AppError::Llm(LlmError::EmptyResponse) => "The AI returned an empty answer".to_string(),
            AppError::Llm(
                LlmError::InvalidJson(_) | LlmError::NoJsonFound | LlmError::Schema(_),
            ) => "The AI returned an answer in an unexpected format".to_string(),
            AppError::Llm(_) => "An AI processing error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::UnprocessableEntity(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE_ENTITY")
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Llm(LlmError::Auth(_)) => (StatusCode::BAD_GATEWAY, "LLM_AUTH_ERROR"),
            AppError::Llm(LlmError::AccessDenied(_)) => {
                (StatusCode::BAD_GATEWAY, "LLM_ACCESS_DENIED")
            }
            AppError::Llm(_) => (StatusCode::BAD_GATEWAY, "LLM_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Llm(e) => tracing::error!("LLM error: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            _ => {}
        }

        let (status, code) = self.status_and_code();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_gets_specific_toast() {
        let err = AppError::from(LlmError::Auth("Invalid API Key".to_string()));
        assert_eq!(
            err.user_message(),
            "The AI provider rejected the configured API key"
        );
        assert_eq!(err.status_and_code().1, "LLM_AUTH_ERROR");
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = AppError::Validation("role_title cannot be empty".to_string());
        assert_eq!(err.user_message(), "role_title cannot be empty");
        assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_error_is_not_leaked() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.user_message(), "A database error occurred");
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::NotFound("Candidate x not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
