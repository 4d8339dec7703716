//! Authentication Module
//! Mission: Password hashing, JWT identity tokens and role-gated access

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::{JwtHandler, TokenError};
pub use middleware::{auth_middleware, require_role, AuthError};
pub use models::{AuthUser, UserRole};
pub use password::{CredentialError, PasswordHasher};
