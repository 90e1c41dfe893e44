//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every error body has the same JSON shape:
//!
//! ```json
//! { "status": 400, "message": "...", "errors": { "email": "..." } }
//! ```
//!
//! `errors` is only present for field validation failures.

use std::sync::Arc;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationErrors;
use crate::services::auth::AuthError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The caller is authenticated but may not touch this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Field-level validation failed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The path exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Response encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a ValidationErrors>,
}

impl AppError {
    /// Recover an error shared by concurrent cache waiters.
    ///
    /// The cache keeps its own handle on the error, so every waiter gets a
    /// rebuilt copy with the same variant and therefore the same status.
    #[must_use]
    pub fn from_shared(error: Arc<Self>) -> Self {
        Arc::try_unwrap(error).unwrap_or_else(|shared| shared.replicate())
    }

    fn replicate(&self) -> Self {
        match self {
            Self::Auth(e) => Self::Auth(e.replicate()),
            Self::Forbidden(msg) => Self::Forbidden(msg.clone()),
            Self::NotFound(msg) => Self::NotFound(msg.clone()),
            Self::Validation(errors) => Self::Validation(errors.clone()),
            Self::BadRequest(msg) => Self::BadRequest(msg.clone()),
            Self::MethodNotAllowed => Self::MethodNotAllowed,
            Self::Database(e) => Self::Database(e.replicate()),
            Self::Serialization(e) => {
                Self::Serialization(serde::ser::Error::custom(e.to_string()))
            }
            Self::Internal(msg) => Self::Internal(msg.clone()),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => err.status(),
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(_) | Self::Serialization(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Auth(err) => err.client_message(),
            Self::Forbidden(msg) | Self::NotFound(msg) | Self::BadRequest(msg) => msg.as_str(),
            Self::Validation(_) => "Validation failed",
            Self::MethodNotAllowed => "Méthode non autorisée.",
            Self::Database(RepositoryError::NotFound) => "Resource not found",
            Self::Database(_) | Self::Serialization(_) | Self::Internal(_) => INTERNAL_MESSAGE,
        };
        let errors = match &self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        };

        let body = ErrorBody {
            status: status.as_u16(),
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated customer.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
