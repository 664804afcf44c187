//! Error handling for the HTTP shell.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use lovebot_core::error::LovebotError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<LovebotError> for ApiError {
    fn from(err: LovebotError) -> Self {
        let status = match &err {
            LovebotError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LovebotError::NotFound { .. } => StatusCode::NOT_FOUND,
            LovebotError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LovebotError::Archive(_) => StatusCode::BAD_REQUEST,
            LovebotError::Configuration(_) | LovebotError::UnsupportedProvider { .. } => {
                StatusCode::BAD_REQUEST
            }
            LovebotError::Llm { .. } | LovebotError::Network { .. } => StatusCode::BAD_GATEWAY,
            LovebotError::Database { .. }
            | LovebotError::Storage { .. }
            | LovebotError::Io(_)
            | LovebotError::Serialization(_)
            | LovebotError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut api = ApiError::new(status, err.code().as_str(), err.to_string());
        if let Some(suggestion) = err.suggestion() {
            api = api.with_details(serde_json::json!({ "suggestion": suggestion }));
        }
        api
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lovebot_error() {
        let api: ApiError = LovebotError::not_found("1@g.us").into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.code, "CONV_001");

        let api: ApiError = LovebotError::transcript("no messages").into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);

        let api: ApiError = LovebotError::llm("down").into();
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
    }
}
