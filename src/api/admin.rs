//! Account administration (admin role only)

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use super::{
    error::{ApiJson, ApiResult},
    AppState,
};
use crate::auth::models::AuthUser;
use crate::models::{User, UserStats};
use crate::services::UserUpdate;

pub async fn pending_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.pending_users().await?))
}

pub async fn pending_count(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let count = state.users.pending_count().await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn all_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.all_users().await?))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<UserStats>> {
    Ok(Json(state.users.stats().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get_user(&id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.update_user(&admin, &id, update).await?))
}

pub async fn approve_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.users.approve(&id).await?;
    Ok(Json(json!({ "message": "User approved" })))
}

pub async fn reject_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.users.reject(&id).await?;
    Ok(Json(json!({ "message": "User rejected" })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.users.delete_user(&admin, &id).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}
