//! Authentication Models
//! Mission: Define identity, token claims and credential payloads

use serde::{Deserialize, Serialize};

/// User roles for RBAC
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    #[serde(rename = "student")]
    Student, // Enrolls in courses, reads materials
    #[serde(rename = "instructor")]
    Instructor, // Owns courses and their materials
    #[serde(rename = "admin")]
    Admin, // Approves accounts, manages users
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Some(UserRole::Student),
            "instructor" => Some(UserRole::Instructor),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT Claims payload
///
/// `user_id` and `role` are optional on the way in so that a correctly
/// signed token with a missing claim is rejected by the access-control
/// layer rather than failing inside signature verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: usize, // expiration timestamp (unix seconds)
}

impl TokenClaims {
    /// Identity carried by the token, if every required claim is usable.
    pub fn identity(&self) -> Option<AuthUser> {
        let user_id = self.user_id.as_deref().filter(|id| !id.trim().is_empty())?;
        let role = self.role.as_deref().and_then(UserRole::parse)?;
        Some(AuthUser {
            user_id: user_id.to_string(),
            role,
        })
    }
}

/// Authenticated caller, built once by the auth middleware and handed to
/// handlers explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }
}

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
