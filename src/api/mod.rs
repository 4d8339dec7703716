//! HTTP surface
//!
//! Layer order per request: CORS, request logging, then per group the
//! rate limiter (registration only) or the token check followed by the role
//! gate, then the handler.

pub mod admin;
pub mod auth;
pub mod error;
pub mod instructor;
pub mod student;

use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::{auth_middleware, require_role, JwtHandler, PasswordHasher, UserRole};
use crate::middleware::{rate_limit_middleware, request_logging, RateLimiter};
use crate::services::{CourseService, UserService};
use crate::store::Database;

pub use error::{ApiError, ApiJson, ApiResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub courses: CourseService,
    pub jwt: Arc<JwtHandler>,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        db: Database,
        hasher: PasswordHasher,
        jwt: Arc<JwtHandler>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            users: UserService::new(db.clone(), hasher, jwt.clone()),
            courses: CourseService::new(db),
            jwt,
            limiter,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn role_gate(role: UserRole, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(role, require_role))
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let register = Router::new()
        .route("/api/register", post(auth::register))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/login", post(auth::login))
        .route("/api/courses", get(student::catalog))
        .merge(register);

    let student_routes = role_gate(
        UserRole::Student,
        Router::new()
            .route("/api/courses/:id/enroll", post(student::enroll))
            .route("/api/student/my-courses", get(student::my_courses))
            .route("/api/student/courses/:id", get(student::course_details)),
    );

    let instructor_routes = role_gate(
        UserRole::Instructor,
        Router::new()
            .route(
                "/api/instructor/courses",
                post(instructor::create_course).get(instructor::list_courses),
            )
            .route(
                "/api/instructor/courses/:id",
                get(instructor::get_course)
                    .put(instructor::update_course)
                    .delete(instructor::delete_course),
            )
            .route(
                "/api/instructor/courses/:id/materials",
                post(instructor::add_material).get(instructor::list_materials),
            )
            .route(
                "/api/instructor/courses/:id/materials/:material_id",
                put(instructor::update_material).delete(instructor::delete_material),
            ),
    );

    let admin_routes = role_gate(
        UserRole::Admin,
        Router::new()
            .route("/api/admin/users/pending", get(admin::pending_users))
            .route("/api/admin/users/pending/count", get(admin::pending_count))
            .route("/api/admin/users/all", get(admin::all_users))
            .route("/api/admin/users/stats", get(admin::stats))
            .route(
                "/api/admin/users/:id",
                get(admin::get_user)
                    .put(admin::update_user)
                    .delete(admin::delete_user),
            )
            .route("/api/admin/users/:id/approve", put(admin::approve_user))
            .route("/api/admin/users/:id/reject", put(admin::reject_user)),
    );

    // Token check wraps every role gate
    let protected_routes = Router::new()
        .route("/api/profile", get(auth::profile))
        .merge(student_routes)
        .merge(instructor_routes)
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}
