//! Business logic between the HTTP handlers and the store
//!
//! Services own validation, ownership checks and lifecycle rules. They speak
//! [`ServiceError`], which the API layer turns into status codes.

pub mod courses;
pub mod users;

pub use courses::{CourseInput, CourseService, MaterialInput, OwnedCourse};
pub use users::{UserService, UserUpdate};

use thiserror::Error;
use tracing::error;

use crate::auth::{CredentialError, TokenError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account is not active")]
    AccountNotActive,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Store failure with the entity name used for a missing row.
    pub(crate) fn from_store(entity: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound | StoreError::ForeignKey(_) => ServiceError::NotFound(entity),
            StoreError::Conflict(_) => ServiceError::Conflict(format!("{entity} already exists")),
            other => other.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound | StoreError::ForeignKey(_) => ServiceError::NotFound("Record"),
            StoreError::Conflict(_) => ServiceError::Conflict("Record already exists".to_string()),
            StoreError::Database(e) => {
                error!(error = %e, "Database operation failed");
                ServiceError::Internal(e.to_string())
            }
            StoreError::Task(e) => {
                error!(error = %e, "Database task failed");
                ServiceError::Internal(e)
            }
        }
    }
}

impl From<CredentialError> for ServiceError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::EmptySecret => ServiceError::Validation(err.to_string()),
            CredentialError::Hash(e) => {
                error!(error = %e, "Password hashing failed");
                ServiceError::Internal(e.to_string())
            }
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        error!(error = %err, "Token issuance failed");
        ServiceError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!(error = %err, "Blocking task failed");
        ServiceError::Internal(err.to_string())
    }
}

/// Trimmed value, or a validation error naming the field.
pub(crate) fn required(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
