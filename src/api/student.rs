//! Catalog browsing and enrollment

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::{error::ApiResult, AppState};
use crate::auth::models::AuthUser;
use crate::models::{Course, CourseWithMaterials};

/// GET /api/courses, no authentication.
pub async fn catalog(State(state): State<AppState>) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(state.courses.catalog().await?))
}

pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let enrollment = state.courses.enroll(&user.user_id, &course_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Enrolled successfully",
            "enrollment": enrollment,
        })),
    ))
}

pub async fn my_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(state.courses.enrolled_courses(&user.user_id).await?))
}

pub async fn course_details(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
) -> ApiResult<Json<CourseWithMaterials>> {
    Ok(Json(
        state
            .courses
            .enrolled_course_details(&user.user_id, &course_id)
            .await?,
    ))
}
