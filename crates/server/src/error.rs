//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before a response is built, and their details never
//! reach the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::QueryError;

/// Application-level error type for the HTTP API.
#[derive(Debug, Error)]
pub enum AppError {
    /// The upstream platform failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Upstream(message) => Self::Upstream(message.to_string()),
            QueryError::InvalidId(_) | QueryError::InvalidTag(_) => {
                Self::BadRequest(err.to_string())
            }
            QueryError::NotFound(id) => Self::NotFound(id),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Upstream(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Upstream(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("gid://shopify/Customer/1".to_string());
        assert_eq!(err.to_string(), "Not found: gid://shopify/Customer/1");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Upstream("test".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_query_error_mapping() {
        assert!(matches!(
            AppError::from(QueryError::Upstream("Failed to fetch customer.")),
            AppError::Upstream(_)
        ));
        assert!(matches!(
            AppError::from(QueryError::InvalidId("x".to_string())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(QueryError::NotFound("x".to_string())),
            AppError::NotFound(_)
        ));
    }
}
