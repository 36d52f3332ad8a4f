use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A single field that failed request validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    /// A non-admin token without a resolvable bot. Same signal as `NotFound`.
    #[error("{0}")]
    InvalidLinkage(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("token deactivated")]
    Inactive,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("storage error: {0}")]
    Storage(anyhow::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// True for every variant that means "does not resolve".
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::InvalidLinkage(_))
    }
}

/// Store errors arrive as `anyhow::Error`. Constraint violations are
/// expected outcomes and map to client errors; everything else is a
/// storage failure.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(db) = err
            .downcast_ref::<sqlx::Error>()
            .and_then(|e| e.as_database_error())
        {
            if db.is_unique_violation() {
                return AppError::Conflict("resource already exists".to_string());
            }
            if db.is_foreign_key_violation() {
                return AppError::NotFound("referenced resource not found".to_string());
            }
        }
        AppError::Storage(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidPath(rejection.body_text())
    }
}

/// Marker placed on responses for failures that must reach the
/// error-telemetry sink. Picked up by `middleware::telemetry`.
#[derive(Debug, Clone)]
pub struct ReportableFailure(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::NotFound(msg) | AppError::InvalidLinkage(msg) => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "not_found",
                msg.clone(),
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_token",
                msg.to_string(),
            ),
            AppError::Inactive => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "token_inactive",
                "token deactivated".to_string(),
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "forbidden",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                "invalid_request_error",
                "conflict",
                msg.clone(),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "malformed_body",
                msg.clone(),
            ),
            AppError::InvalidPath(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_path",
                msg.clone(),
            ),
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "validation_failed",
                "request validation failed".to_string(),
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let mut error = json!({
            "message": msg,
            "type": error_type,
            "code": code,
        });
        if let AppError::Validation(fields) = &self {
            error["fields"] = json!(fields);
        }

        let mut response = (status, Json(json!({ "error": error }))).into_response();

        if let AppError::Storage(e) = &self {
            response
                .extensions_mut()
                .insert(ReportableFailure(format!("{:#}", e)));
        }

        response
    }
}
