//! HTTP error type and its mapping onto status codes.

use crate::session::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use libris_gatekeeper::GatekeeperError;
use libris_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed a field or lending rule
    #[error("{0}")]
    Validation(String),

    /// Request could not be parsed (malformed body, id or query)
    #[error("{0}")]
    BadRequest(String),

    /// Referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Operation conflicts with the record's current state
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Anything the client cannot fix
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Validation(msg) => AppError::Validation(msg),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other @ (StoreError::Database(_) | StoreError::InvalidData(_)) => {
                AppError::Internal(other.to_string())
            }
        }
    }
}

impl From<GatekeeperError> for AppError {
    fn from(e: GatekeeperError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::JwtEncode(_) => AppError::Internal(e.to_string()),
            SessionError::TokenExpired
            | SessionError::InvalidToken
            | SessionError::MissingToken
            | SessionError::InvalidCredentials => AppError::Unauthorized(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let cases = [
            (StoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (StoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (StoreError::Conflict("x".into()), StatusCode::CONFLICT),
            (StoreError::InvalidData("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_store_message_passes_through() {
        let err = AppError::from(StoreError::Validation(
            "A reader cannot hold more than 3 books at once".into(),
        ));
        assert_eq!(err.to_string(), "A reader cannot hold more than 3 books at once");
    }

    #[test]
    fn test_session_errors_are_unauthorized() {
        assert_eq!(
            AppError::from(SessionError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(SessionError::TokenExpired).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
