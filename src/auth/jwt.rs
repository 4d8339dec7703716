//! JWT Token Handler
//! Mission: Issue and verify signed, time-bound identity tokens

use crate::auth::models::{AuthUser, TokenClaims, UserRole};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::debug;

/// Lifetime of an issued token.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;

/// Verification outcome is deliberately opaque: expired, forged and
/// malformed tokens are indistinguishable to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("failed to sign token")]
    Signing,
}

/// JWT Handler for token operations (HS256 with a shared secret)
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for a user id and role.
    pub fn issue(&self, user_id: &str, role: UserRole) -> Result<String, TokenError> {
        let exp = (Utc::now() + self.ttl).timestamp().max(0) as usize;
        let claims = TokenClaims {
            user_id: Some(user_id.to_string()),
            role: Some(role.as_str().to_string()),
            exp,
        };

        debug!(user_id, role = role.as_str(), exp, "Issuing access token");

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| TokenError::Signing)
    }

    /// Check signature and expiry, returning the raw claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let decoded = decode::<TokenClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                TokenError::Invalid
            })?;

        Ok(decoded.claims)
    }

    /// Verify a token and resolve the identity it carries.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, TokenError> {
        self.verify(token)?.identity().ok_or(TokenError::Invalid)
    }
}
