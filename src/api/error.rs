//! API error responses
//!
//! Every failure leaves the service as `{"error": <code>, "message": <text>}`.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::ServiceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Service(err) => match err {
                ServiceError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
                }
                ServiceError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
                }
                ServiceError::AccountNotActive => {
                    (StatusCode::FORBIDDEN, "account_not_active", err.to_string())
                }
                ServiceError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
                ServiceError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
                ServiceError::Internal(detail) => {
                    error!(error = %detail, "Request failed with internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "Internal server error".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// JSON body extractor whose rejection is a 400 [`ApiError`].
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub type ApiResult<T> = Result<T, ApiError>;
