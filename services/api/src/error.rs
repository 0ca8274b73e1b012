//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and the single
//! place where errors are turned into HTTP status codes.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use feedback_coach_core::ports::PortError;
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core services or ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error while applying the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

// Extractor rejections are client mistakes; they share the `InvalidInput` mapping.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Port(PortError::InvalidInput(rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Port(PortError::InvalidInput(rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Port(PortError::InvalidInput(format!(
            "Failed to read multipart data: {}",
            e.body_text()
        )))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Port(PortError::InvalidInput(rejection.body_text()))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Port(port) => match port {
                PortError::InvalidInput(_) | PortError::TooLarge(_) | PortError::Conflict(_) => {
                    StatusCode::BAD_REQUEST
                }
                PortError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                PortError::NotFound(_) => StatusCode::NOT_FOUND,
                PortError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Port(PortError::NotFound(message)) => message.clone(),
            ApiError::Port(port) if !status.is_server_error() => port.to_string(),
            other => {
                error!(error = %other, "Request failed");
                "Internal server error".to_string()
            }
        };
        if !status.is_server_error() {
            debug!(status = status.as_u16(), %detail, "Request rejected");
        }

        let body = Json(ErrorBody { detail });
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PortError::InvalidInput("x".into()), StatusCode::BAD_REQUEST)]
    #[case(PortError::TooLarge("x".into()), StatusCode::BAD_REQUEST)]
    #[case(PortError::Conflict("x".into()), StatusCode::BAD_REQUEST)]
    #[case(PortError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED)]
    #[case(PortError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(PortError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_port_errors_to_status(#[case] error: PortError, #[case] expected: StatusCode) {
        assert_eq!(ApiError::from(error).into_response().status(), expected);
    }

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let response =
            ApiError::from(PortError::Unauthorized("Invalid or expired token".into())).into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[tokio::test]
    async fn internal_details_are_not_exposed() {
        let response =
            ApiError::from(PortError::Internal("password authentication failed".into()))
                .into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Internal server error");
    }
}
