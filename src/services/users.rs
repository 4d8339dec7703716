//! User lifecycle
//!
//! Registration always lands in `pending`. Only the admin transitions move
//! an account to `active` or `rejected`, and only `active` accounts receive
//! tokens.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{required, ServiceError, ServiceResult};
use crate::auth::models::{AuthUser, LoginRequest, RegisterRequest, UserRole};
use crate::auth::{JwtHandler, PasswordHasher};
use crate::models::{User, UserStats, UserStatus};
use crate::store::{Database, StoreError};

/// Admin edit of an account's profile fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
}

/// Hashed once per service and checked against when the email is unknown,
/// so both login failures pay for one bcrypt verification.
const DUMMY_SECRET: &str = "coursify-login-dummy-secret";

#[derive(Clone)]
pub struct UserService {
    db: Database,
    hasher: PasswordHasher,
    tokens: Arc<JwtHandler>,
    dummy_digest: Arc<OnceCell<String>>,
}

fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = required("email", email)?.to_lowercase();
    if !email.contains('@') {
        return Err(ServiceError::Validation("email is not valid".to_string()));
    }
    Ok(email)
}

fn email_conflict(err: StoreError) -> ServiceError {
    match err {
        StoreError::Conflict(_) => ServiceError::Conflict("Email is already registered".to_string()),
        other => ServiceError::from_store("User", other),
    }
}

impl UserService {
    pub fn new(db: Database, hasher: PasswordHasher, tokens: Arc<JwtHandler>) -> Self {
        Self {
            db,
            hasher,
            tokens,
            dummy_digest: Arc::new(OnceCell::new()),
        }
    }

    async fn hash_password(&self, password: String) -> ServiceResult<String> {
        let hasher = self.hasher;
        Ok(tokio::task::spawn_blocking(move || hasher.hash(&password)).await??)
    }

    async fn verify_password(&self, password: String, digest: String) -> ServiceResult<bool> {
        let hasher = self.hasher;
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&password, &digest)).await?)
    }

    async fn dummy_digest(&self) -> ServiceResult<String> {
        let digest = self
            .dummy_digest
            .get_or_try_init(|| self.hash_password(DUMMY_SECRET.to_string()))
            .await?;
        Ok(digest.clone())
    }

    async fn create(
        &self,
        full_name: String,
        email: String,
        password: String,
        role: UserRole,
        status: UserStatus,
    ) -> ServiceResult<User> {
        let password_hash = self.hash_password(password).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            full_name,
            email,
            password_hash,
            role,
            status,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_user(user).await.map_err(email_conflict)
    }

    pub async fn register(&self, req: RegisterRequest) -> ServiceResult<User> {
        let full_name = required("full_name", &req.full_name)?;
        let email = normalize_email(&req.email)?;
        if req.password.trim().is_empty() {
            return Err(ServiceError::Validation("password is required".to_string()));
        }
        if req.role == UserRole::Admin {
            return Err(ServiceError::Validation(
                "role must be 'student' or 'instructor'".to_string(),
            ));
        }

        let user = self
            .create(full_name, email, req.password, req.role, UserStatus::Pending)
            .await?;

        info!(user_id = %user.id, role = user.role.as_str(), "User registered, awaiting approval");
        Ok(user)
    }

    /// Issue a token for an active account.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, req: LoginRequest) -> ServiceResult<String> {
        let email = req.email.trim().to_lowercase();
        let Some(user) = self.db.user_by_email(&email).await? else {
            let digest = self.dummy_digest().await?;
            self.verify_password(req.password, digest).await?;
            debug!("Login attempt for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        let valid = self
            .verify_password(req.password, user.password_hash.clone())
            .await?;
        if !valid {
            debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        if !user.is_active() {
            info!(user_id = %user.id, status = user.status.as_str(), "Login refused for inactive account");
            return Err(ServiceError::AccountNotActive);
        }

        let token = self.tokens.issue(&user.id, user.role)?;
        info!(user_id = %user.id, role = user.role.as_str(), "User logged in");
        Ok(token)
    }

    pub async fn get_user(&self, id: &str) -> ServiceResult<User> {
        self.db
            .user_by_id(id)
            .await
            .map_err(|e| ServiceError::from_store("User", e))
    }

    async fn set_status(&self, id: &str, status: UserStatus) -> ServiceResult<()> {
        self.db
            .set_user_status(id, status, Utc::now())
            .await
            .map_err(|e| ServiceError::from_store("User", e))?;
        info!(user_id = id, status = status.as_str(), "User status changed");
        Ok(())
    }

    pub async fn approve(&self, id: &str) -> ServiceResult<()> {
        self.set_status(id, UserStatus::Active).await
    }

    pub async fn reject(&self, id: &str) -> ServiceResult<()> {
        self.set_status(id, UserStatus::Rejected).await
    }

    pub async fn pending_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.db.users_by_status(UserStatus::Pending).await?)
    }

    pub async fn pending_count(&self) -> ServiceResult<i64> {
        Ok(self.db.count_users_with_status(UserStatus::Pending).await?)
    }

    pub async fn all_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.db.all_users().await?)
    }

    pub async fn stats(&self) -> ServiceResult<UserStats> {
        Ok(self.db.user_stats().await?)
    }

    /// Replace an account's profile fields.
    ///
    /// An administrator cannot drop their own admin role, and the last active
    /// administrator cannot be demoted by anyone.
    pub async fn update_user(
        &self,
        actor: &AuthUser,
        id: &str,
        update: UserUpdate,
    ) -> ServiceResult<User> {
        let full_name = required("full_name", &update.full_name)?;
        let email = normalize_email(&update.email)?;

        let current = self.get_user(id).await?;
        if current.role == UserRole::Admin && update.role != UserRole::Admin {
            if actor.user_id == id {
                return Err(ServiceError::Validation(
                    "You cannot remove your own administrator role".to_string(),
                ));
            }
            if current.is_active() && self.db.count_active_with_role(UserRole::Admin).await? <= 1 {
                return Err(ServiceError::Validation(
                    "Cannot demote the last active administrator".to_string(),
                ));
            }
        }

        let user = self
            .db
            .update_user(id, full_name, email, update.role, Utc::now())
            .await
            .map_err(email_conflict)?;

        info!(user_id = id, role = user.role.as_str(), "User profile updated");
        Ok(user)
    }

    pub async fn delete_user(&self, actor: &AuthUser, id: &str) -> ServiceResult<()> {
        if actor.user_id == id {
            return Err(ServiceError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }

        self.db
            .delete_user(id)
            .await
            .map_err(|e| ServiceError::from_store("User", e))?;
        info!(user_id = id, deleted_by = %actor.user_id, "User deleted");
        Ok(())
    }

    /// Provision an administrator unless an active one already exists.
    ///
    /// An existing account with `email` is promoted and activated, keeping its
    /// password; otherwise a new account is created. Returns whether an
    /// administrator was provisioned.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ServiceResult<bool> {
        if self.db.count_active_with_role(UserRole::Admin).await? > 0 {
            debug!("Active administrator present, skipping bootstrap");
            return Ok(false);
        }

        let email = normalize_email(email)?;
        let full_name = required("full_name", full_name)?;
        if password.trim().is_empty() {
            return Err(ServiceError::Validation("password is required".to_string()));
        }

        if let Some(existing) = self.db.user_by_email(&email).await? {
            let now = Utc::now();
            self.db
                .update_user(&existing.id, existing.full_name, email.clone(), UserRole::Admin, now)
                .await
                .map_err(|e| ServiceError::from_store("User", e))?;
            self.db
                .set_user_status(&existing.id, UserStatus::Active, now)
                .await
                .map_err(|e| ServiceError::from_store("User", e))?;
            warn!(
                user_id = %existing.id,
                email = %email,
                "No active administrator; promoted existing account (password unchanged)"
            );
            return Ok(true);
        }

        match self
            .create(
                full_name,
                email.clone(),
                password.to_string(),
                UserRole::Admin,
                UserStatus::Active,
            )
            .await
        {
            Ok(user) => {
                info!(user_id = %user.id, email = %email, "Bootstrap administrator created");
                Ok(true)
            }
            Err(e) => {
                warn!(email = %email, error = %e, "Bootstrap administrator could not be created");
                Err(e)
            }
        }
    }
}
