//! Registration, login and profile handlers

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use super::{
    error::{ApiJson, ApiResult},
    AppState,
};
use crate::auth::models::{AuthUser, LoginRequest, LoginResponse, RegisterRequest};
use crate::models::User;

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user = state.users.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful, awaiting admin approval",
            "user": user,
        })),
    ))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let token = state.users.login(req).await?;
    Ok(Json(LoginResponse { token }))
}

/// GET /api/profile
pub async fn profile(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get_user(&user.user_id).await?))
}
