//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{domain::ValueObjectError, infrastructure::dto::ErrorResponse, usecase::SendError};

/// Error returned by HTTP handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(err: ValueObjectError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<SendError> for ApiError {
    fn from(err: SendError) -> Self {
        let status = match err {
            SendError::EmptyText | SendError::TextTooLong { .. } | SendError::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            SendError::InFlight => StatusCode::CONFLICT,
            SendError::LogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.to_string())
    }
}
