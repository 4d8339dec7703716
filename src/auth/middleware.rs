//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation and role gates
//!
//! Per request: header present -> `Bearer <token>` parsed -> signature and
//! expiry verified -> `user_id`/`role` claims extracted -> role predicate.
//! Every failure before the role check is a 401; a failed role check is a
//! 403. On success the [`AuthUser`] is stored in the request extensions and
//! handlers receive it as an extractor argument.

use crate::auth::{
    jwt::JwtHandler,
    models::{AuthUser, UserRole},
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Auth middleware that validates JWT tokens
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_bearer(req.headers())?;

    let claims = jwt_handler
        .verify(token)
        .map_err(|_| AuthError::InvalidToken)?;

    let user = claims.identity().ok_or(AuthError::InvalidClaims)?;

    debug!(user_id = %user.user_id, role = user.role.as_str(), "Request authenticated");

    // Add identity to request extensions so handlers can access it
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Role gate; layer it inside [`auth_middleware`] with the required role as state.
pub async fn require_role(
    State(required): State<UserRole>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingToken)?;

    if !user.has_role(required) {
        warn!(
            user_id = %user.user_id,
            role = user.role.as_str(),
            required = required.as_str(),
            "Role check failed"
        );
        return Err(AuthError::Forbidden(required));
    }

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::InvalidFormat),
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Auth error types
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
    InvalidClaims,
    Forbidden(UserRole),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authorization header required".to_string(),
            ),
            AuthError::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authorization header must be in format 'Bearer {token}'".to_string(),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid token".to_string(),
            ),
            AuthError::InvalidClaims => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid token claims".to_string(),
            ),
            AuthError::Forbidden(required) => (
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("This resource requires the '{}' role", required.as_str()),
            ),
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}
