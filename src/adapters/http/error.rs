use crate::domain::DomainError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;

/// API-layer error type
#[derive(Debug)]
pub enum ApiError {
    /// 400 - Bad request (invalid topic, bad file name)
    BadRequest(String),

    /// 404 - Report not found
    NotFound(String),

    /// 500 - Internal error
    Internal(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
    timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), message = %message, "request failed");
        }

        let body = ErrorBody {
            status: "error",
            message,
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidTopic(_)
            | DomainError::TopicRejected { .. }
            | DomainError::NotAFile(_)
            | DomainError::InvalidFileName(_)
            | DomainError::InvalidQuery(_) => ApiError::BadRequest(err.to_string()),
            DomainError::ReportNotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
