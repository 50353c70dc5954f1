use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pmaas_core::AppError;
use serde::Serialize;
use tracing::{debug, error};

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Auth failures and internal errors get fixed bodies; details only go to the log.
        let (status, message) = match self.0 {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::Unauthorized(detail) => {
                debug!(detail = %detail, "request rejected as unauthenticated");
                (
                    StatusCode::UNAUTHORIZED,
                    "authentication required".to_owned(),
                )
            }
            AppError::Forbidden(detail) => {
                debug!(detail = %detail, "request rejected as forbidden");
                (
                    StatusCode::FORBIDDEN,
                    "insufficient permissions".to_owned(),
                )
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
