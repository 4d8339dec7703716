//! Course and material management (instructor role only)
//!
//! Handlers that take a body extract it as a `Result` and resolve ownership
//! first, so a non-owner always gets 403 whatever they sent.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::{
    error::{ApiError, ApiJson, ApiResult},
    AppState,
};
use crate::auth::models::AuthUser;
use crate::models::{Course, CourseWithMaterials, LearningMaterial};
use crate::services::{CourseInput, MaterialInput};

type JsonBody<T> = Result<ApiJson<T>, ApiError>;

pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<CourseInput>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    let course = state.courses.create_course(&user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn list_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(state.courses.instructor_courses(&user.user_id).await?))
}

pub async fn get_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
) -> ApiResult<Json<CourseWithMaterials>> {
    Ok(Json(
        state.courses.course_details(&user.user_id, &course_id).await?,
    ))
}

pub async fn update_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
    body: JsonBody<CourseInput>,
) -> ApiResult<Json<Course>> {
    let owned = state.courses.owned_course(&user.user_id, &course_id).await?;
    let ApiJson(input) = body?;

    Ok(Json(state.courses.update_course(&owned, input).await?))
}

pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.courses.delete_course(&user.user_id, &course_id).await?;
    Ok(Json(json!({ "message": "Course deleted" })))
}

pub async fn add_material(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
    body: JsonBody<MaterialInput>,
) -> ApiResult<(StatusCode, Json<LearningMaterial>)> {
    let owned = state.courses.owned_course(&user.user_id, &course_id).await?;
    let ApiJson(input) = body?;

    let material = state.courses.add_material(&owned, input).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn list_materials(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
) -> ApiResult<Json<Vec<LearningMaterial>>> {
    Ok(Json(
        state.courses.materials(&user.user_id, &course_id).await?,
    ))
}

pub async fn update_material(
    State(state): State<AppState>,
    user: AuthUser,
    Path((course_id, material_id)): Path<(String, String)>,
    body: JsonBody<MaterialInput>,
) -> ApiResult<Json<LearningMaterial>> {
    let owned = state.courses.owned_course(&user.user_id, &course_id).await?;
    let ApiJson(input) = body?;

    let material = state
        .courses
        .update_material(&owned, &material_id, input)
        .await?;
    Ok(Json(material))
}

pub async fn delete_material(
    State(state): State<AppState>,
    user: AuthUser,
    Path((course_id, material_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    state
        .courses
        .delete_material(&user.user_id, &course_id, &material_id)
        .await?;
    Ok(Json(json!({ "message": "Material deleted" })))
}
