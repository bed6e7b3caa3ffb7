use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

/// Whether 500 responses carry the underlying error text. Set once at
/// startup from `NODE_ENV`; a global because `IntoResponse` has no access to
/// `AppState`.
static EXPOSE_DETAIL: AtomicBool = AtomicBool::new(false);

pub fn expose_error_detail(enabled: bool) {
    EXPOSE_DETAIL.store(enabled, Ordering::Relaxed);
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Reported as 400, like any other rejected write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request timed out")]
    Timeout,

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

impl AppError {
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        AppError::Internal {
            message: "Internal server error".to_string(),
            detail: detail.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => {
                AppError::Conflict("Duplicate value for a unique field".to_string())
            }
            StoreError::Validation(errors) => AppError::Validation(errors),
            other => AppError::internal(other),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::internal(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": "Validation failed", "errors": errors }),
            ),
            AppError::BadRequest(msg) | AppError::Conflict(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": msg }),
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "success": false, "message": msg }),
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                json!({ "success": false, "message": msg }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": msg }),
            ),
            AppError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                json!({ "success": false, "message": "Request timed out" }),
            ),
            AppError::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                json!({ "success": false, "message": "Invalid token" }),
            ),
            AppError::Internal { message, detail } => {
                tracing::error!(%detail, "{message}");
                let mut body = json!({ "success": false, "message": message });
                if EXPOSE_DETAIL.load(Ordering::Relaxed) {
                    body["error"] = json!(detail);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub trait ResultExt<T> {
    /// Replaces the client-facing message of an internal error.
    fn context(self, message: &str) -> AppResult<T>;
}

impl<T, E: Into<AppError>> ResultExt<T> for Result<T, E> {
    fn context(self, message: &str) -> AppResult<T> {
        self.map_err(|e| match e.into() {
            AppError::Internal { detail, .. } => AppError::Internal {
                message: message.to_string(),
                detail,
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_surface_as_bad_requests() {
        let err: AppError = StoreError::Duplicate("users_email_key".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn context_only_rewrites_internal_errors() {
        let failed: Result<(), AppError> = Err(AppError::internal("pool closed"));
        match failed.context("Server error while fetching tournaments") {
            Err(AppError::Internal { message, detail }) => {
                assert_eq!(message, "Server error while fetching tournaments");
                assert_eq!(detail, "pool closed");
            }
            other => panic!("unexpected {other:?}"),
        }

        let missing: Result<(), AppError> = Err(AppError::NotFound("Match not found".into()));
        assert!(matches!(
            missing.context("Server error while fetching match"),
            Err(AppError::NotFound(_))
        ));
    }
}
