//! Password hashing
//! Mission: One-way transform from plaintext to a verifiable secret

use bcrypt::{hash, verify, DEFAULT_COST};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password must not be empty")]
    EmptySecret,
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Salted, cost-parameterised bcrypt hasher.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, secret: &str) -> Result<String, CredentialError> {
        if secret.is_empty() {
            return Err(CredentialError::EmptySecret);
        }
        Ok(hash(secret, self.cost)?)
    }

    /// Check a secret against a stored digest.
    ///
    /// A malformed digest counts as a mismatch so callers can only ever
    /// observe "invalid credentials".
    pub fn verify(&self, secret: &str, digest: &str) -> bool {
        if secret.is_empty() {
            return false;
        }
        match verify(secret, digest) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "Stored password digest could not be parsed");
                false
            }
        }
    }
}
