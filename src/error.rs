use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;

// Errors a handler can answer with. Each renders as `{"error": ...}`.
#[derive(Error, Debug)]
pub enum AppError {
    // Body was not parseable as the expected JSON shape
    #[error("Invalid JSON")]
    InvalidJson,

    // Structural validation failed
    #[error("{0}")]
    Validation(String),

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    // A required setting (API key) is missing at request time
    #[error("{0}")]
    NotConfigured(String),

    // Email provider answered with a non-success status
    #[error("Failed to send email")]
    Provider { status: u16, body: Value },

    // Email provider could not be reached
    #[error("Failed to send email")]
    Delivery(String),

    #[error("Failed to send notification")]
    Notification,

    #[error("Server error")]
    Server,

    #[error("Failed to encode metrics: {0}")]
    Metrics(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidJson => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotConfigured(_)
            | AppError::Provider { .. }
            | AppError::Delivery(_)
            | AppError::Notification
            | AppError::Server
            | AppError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Provider {
                status: provider_status,
                body,
            } => json!({
                "error": self.to_string(),
                "providerStatus": provider_status,
                "providerBody": body,
            }),
            AppError::Delivery(detail) => json!({
                "error": self.to_string(),
                "detail": detail,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
