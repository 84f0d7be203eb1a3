use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Subscription required")]
    SubscriptionRequired,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Billing error: {0}")]
    Billing(String),

    #[error("Job search error: {0}")]
    JobSearch(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidSignature(reason) => {
                tracing::warn!("Rejected webhook: {reason}");
                (
                    StatusCode::BAD_REQUEST,
                    "INVALID_SIGNATURE",
                    "Webhook signature verification failed".to_string(),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::SubscriptionRequired => (
                StatusCode::PAYMENT_REQUIRED,
                "SUBSCRIPTION_REQUIRED",
                "An active subscription is required".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Billing(msg) => {
                tracing::error!("Billing error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BILLING_ERROR",
                    "A billing error occurred".to_string(),
                )
            }
            AppError::JobSearch(msg) => {
                tracing::error!("Job search error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "JOB_SEARCH_ERROR",
                    "The job search service is unavailable".to_string(),
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Pdf(msg) => {
                tracing::error!("PDF error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PDF_ERROR",
                    "The document could not be generated".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
