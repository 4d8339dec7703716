//! End-to-end HTTP tests over the full router (in-memory database)

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use coursify_backend::{
    auth::{
        models::{LoginRequest, RegisterRequest},
        JwtHandler, PasswordHasher, UserRole,
    },
    create_router,
    middleware::{RateLimitConfig, RateLimiter},
    store::Database,
    AppState,
};

const ADMIN_EMAIL: &str = "admin@coursify.test";
const ADMIN_PASSWORD: &str = "admin-password";

struct TestApp {
    router: Router,
    state: AppState,
    admin_token: String,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_limits(RateLimitConfig {
            capacity: 100,
            ..RateLimitConfig::default()
        })
        .await
    }

    async fn with_limits(limits: RateLimitConfig) -> Self {
        let state = AppState::new(
            Database::open_in_memory().unwrap(),
            PasswordHasher::new(4 /* bcrypt minimum cost */),
            Arc::new(JwtHandler::new("integration-test-secret")),
            RateLimiter::new(limits),
        );
        state
            .users
            .bootstrap_admin(ADMIN_EMAIL, ADMIN_PASSWORD, "Admin")
            .await
            .unwrap();

        let router = create_router(state.clone())
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        let admin_token = state
            .users
            .login(LoginRequest {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .unwrap();

        Self {
            router,
            state,
            admin_token,
        }
    }

    /// Registered, approved account; returns (id, token).
    async fn active_user(&self, email: &str, role: UserRole) -> (String, String) {
        let user = self
            .state
            .users
            .register(RegisterRequest {
                full_name: "Test User".to_string(),
                email: email.to_string(),
                password: "pw".to_string(),
                role,
            })
            .await
            .unwrap();
        self.state.users.approve(&user.id).await.unwrap();
        let token = self
            .state
            .users
            .login(LoginRequest {
                email: email.to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        (user.id, token)
    }

    async fn raw(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.raw(builder.body(body).unwrap()).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn create_course(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/instructor/courses",
                Some(token),
                Some(json!({ "title": title, "description": "Course description" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }
}

fn text_material(title: &str) -> Value {
    json!({ "title": title, "content_type": "text", "text_content": "Lesson body" })
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_registration_approval_login_scenario() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "full_name": "Ada Lovelace",
                "email": "a@x.com",
                "password": "pw",
                "role": "student",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["status"], "pending");
    assert!(body["user"].get("password_hash").is_none());
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    let credentials = json!({ "email": "a@x.com", "password": "pw" });
    let (status, body) = app
        .send("POST", "/api/login", None, Some(credentials.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.get("token").is_none());

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/admin/users/{user_id}/approve"),
            Some(app.admin_token.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send("POST", "/api/login", None, Some(credentials))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.send("GET", "/api/profile", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.as_str());
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let app = TestApp::new().await;
    app.active_user("a@x.com", UserRole::Student).await;

    let wrong_password = app
        .send(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "wrong" })),
        )
        .await;
    let unknown_email = app
        .send(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": "nobody@x.com", "password": "pw" })),
        )
        .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_access_control() {
    let app = TestApp::new().await;
    let (_, student) = app.active_user("s@x.com", UserRole::Student).await;

    let (status, _) = app
        .send("GET", "/api/admin/users/pending", Some(student.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            "POST",
            "/api/instructor/courses",
            Some(student.as_str()),
            Some(json!({ "title": "x", "description": "y" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("GET", "/api/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send("GET", "/api/profile", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong_scheme = Request::builder()
        .uri("/api/profile")
        .header(header::AUTHORIZATION, format!("Token {student}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.raw(wrong_scheme).await.status(), StatusCode::UNAUTHORIZED);

    // Signed with another secret
    let forged = JwtHandler::new("some-other-secret")
        .issue("someone", UserRole::Admin)
        .unwrap();
    let (status, _) = app
        .send("GET", "/api/admin/users/all", Some(forged.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send("GET", "/api/courses", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_enrollment_and_course_access() {
    let app = TestApp::new().await;
    let (_, instructor) = app.active_user("i@x.com", UserRole::Instructor).await;
    let (_, student) = app.active_user("s@x.com", UserRole::Student).await;

    let course_id = app.create_course(&instructor, "Rust 101").await;
    let (status, _) = app
        .send(
            "POST",
            &format!("/api/instructor/courses/{course_id}/materials"),
            Some(instructor.as_str()),
            Some(text_material("Ownership")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let details_uri = format!("/api/student/courses/{course_id}");
    let (status, _) = app.send("GET", &details_uri, Some(student.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let enroll_uri = format!("/api/courses/{course_id}/enroll");
    let (status, _) = app.send("POST", &enroll_uri, Some(student.as_str()), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send("POST", &enroll_uri, Some(student.as_str()), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = app
        .send("POST", "/api/courses/missing/enroll", Some(student.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send("GET", "/api/student/my-courses", Some(student.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], course_id.as_str());

    let (status, body) = app.send("GET", &details_uri, Some(student.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Rust 101");
    assert_eq!(body["materials"][0]["title"], "Ownership");

    let (status, body) = app.send("GET", "/api/courses", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Instructors cannot enroll
    let (status, _) = app.send("POST", &enroll_uri, Some(instructor.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_material_positions_are_not_renumbered() {
    let app = TestApp::new().await;
    let (_, instructor) = app.active_user("i@x.com", UserRole::Instructor).await;
    let course_id = app.create_course(&instructor, "Rust 101").await;
    let materials_uri = format!("/api/instructor/courses/{course_id}/materials");

    let (_, first) = app
        .send("POST", &materials_uri, Some(instructor.as_str()), Some(text_material("One")))
        .await;
    let (_, second) = app
        .send(
            "POST",
            &materials_uri,
            Some(instructor.as_str()),
            Some(json!({
                "title": "Two",
                "content_type": "video",
                "video_url": "https://video.example/2",
            })),
        )
        .await;
    assert_eq!(first["position"], 1);
    assert_eq!(second["position"], 2);

    let first_id = first["id"].as_str().unwrap();
    let (status, _) = app
        .send(
            "DELETE",
            &format!("{materials_uri}/{first_id}"),
            Some(instructor.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", &materials_uri, Some(instructor.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["title"], "Two");
    assert_eq!(listed[0]["position"], 2);

    let (status, _) = app
        .send(
            "DELETE",
            &format!("{materials_uri}/{first_id}"),
            Some(instructor.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            "POST",
            &materials_uri,
            Some(instructor.as_str()),
            Some(json!({ "title": "Bad", "content_type": "pdf", "text_content": "oops" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_owner_is_forbidden_regardless_of_body() {
    let app = TestApp::new().await;
    let (_, owner) = app.active_user("owner@x.com", UserRole::Instructor).await;
    let (_, intruder) = app.active_user("intruder@x.com", UserRole::Instructor).await;

    let course_id = app.create_course(&owner, "Owned").await;
    let course_uri = format!("/api/instructor/courses/{course_id}");
    let (_, material) = app
        .send(
            "POST",
            &format!("{course_uri}/materials"),
            Some(owner.as_str()),
            Some(text_material("One")),
        )
        .await;
    let material_uri = format!("{course_uri}/materials/{}", material["id"].as_str().unwrap());

    let (status, _) = app
        .send(
            "PUT",
            &course_uri,
            Some(intruder.as_str()),
            Some(json!({ "title": "", "description": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let malformed = Request::builder()
        .method("PUT")
        .uri(&course_uri)
        .header(header::AUTHORIZATION, format!("Bearer {intruder}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    assert_eq!(app.raw(malformed).await.status(), StatusCode::FORBIDDEN);

    for (method, uri, body) in [
        ("GET", course_uri.as_str(), None),
        ("DELETE", course_uri.as_str(), None),
        ("PUT", material_uri.as_str(), Some(text_material("Hijacked"))),
        ("DELETE", material_uri.as_str(), None),
    ] {
        let (status, _) = app.send(method, uri, Some(intruder.as_str()), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
    }

    let (status, _) = app
        .send("GET", "/api/instructor/courses/missing", Some(intruder.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Owner still sees the untouched course
    let (status, body) = app.send("GET", &course_uri, Some(owner.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Owned");
    assert_eq!(body["materials"][0]["title"], "One");

    let (status, body) = app
        .send(
            "PUT",
            &course_uri,
            Some(owner.as_str()),
            Some(json!({ "title": "Renamed", "description": "Updated" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed");

    let (status, _) = app.send("DELETE", &course_uri, Some(owner.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", &course_uri, Some(owner.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({ "email": "a@x.com", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = app
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "full_name": "Root",
                "email": "root@x.com",
                "password": "pw",
                "role": "admin",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "full_name": "Dup",
                "email": ADMIN_EMAIL,
                "password": "pw",
                "role": "student",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_is_rate_limited() {
    let app = TestApp::with_limits(RateLimitConfig::default()).await;

    for i in 0..5 {
        let (status, _) = app
            .send(
                "POST",
                "/api/register",
                None,
                Some(json!({
                    "full_name": "Burst",
                    "email": format!("burst{i}@x.com"),
                    "password": "pw",
                    "role": "student",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let request = Request::builder()
        .method("POST")
        .uri("/api/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "full_name": "Burst",
                "email": "burst5@x.com",
                "password": "pw",
                "role": "student",
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.raw(request).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 60);

    // Login is not limited
    let (status, _) = app
        .send(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.state.limiter.config().refill_interval, Duration::from_secs(60));
}

#[tokio::test]
async fn test_admin_user_maintenance() {
    let app = TestApp::new().await;
    let admin = Some(app.admin_token.as_str());
    let (student_id, _) = app.active_user("s@x.com", UserRole::Student).await;
    app.state
        .users
        .register(RegisterRequest {
            full_name: "Waiting".to_string(),
            email: "wait@x.com".to_string(),
            password: "pw".to_string(),
            role: UserRole::Instructor,
        })
        .await
        .unwrap();

    let (status, body) = app.send("GET", "/api/admin/users/stats", admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "total_users": 3, "active_users": 2, "pending_users": 1 }));

    let (_, body) = app
        .send("GET", "/api/admin/users/pending/count", admin, None)
        .await;
    assert_eq!(body["count"], 1);

    let (_, body) = app.send("GET", "/api/admin/users/pending", admin, None).await;
    assert_eq!(body[0]["email"], "wait@x.com");

    let (_, body) = app.send("GET", "/api/admin/users/all", admin, None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let student_uri = format!("/api/admin/users/{student_id}");
    let (status, body) = app
        .send(
            "PUT",
            &student_uri,
            admin,
            Some(json!({ "full_name": "Promoted", "email": "s@x.com", "role": "instructor" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "instructor");
    assert_eq!(body["status"], "active");

    let (status, _) = app
        .send(
            "PUT",
            &student_uri,
            admin,
            Some(json!({ "full_name": "Clash", "email": "wait@x.com", "role": "student" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, profile) = app.send("GET", "/api/profile", admin, None).await;
    let admin_id = profile["id"].as_str().unwrap();
    let (status, _) = app
        .send("DELETE", &format!("/api/admin/users/{admin_id}"), admin, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/admin/users/{admin_id}"),
            admin,
            Some(json!({ "full_name": "Admin", "email": ADMIN_EMAIL, "role": "student" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    let (_, profile) = app.send("GET", "/api/profile", admin, None).await;
    assert_eq!(profile["role"], "admin");

    let (status, _) = app.send("DELETE", &student_uri, admin, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", &student_uri, admin, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("PUT", "/api/admin/users/missing/reject", admin, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
