//! Server configuration
//!
//! Every flag can also be supplied through the environment (and therefore a
//! `.env` file). `DATABASE_PATH` and `JWT_SECRET` have no defaults: startup
//! aborts when either is missing.

use clap::Parser;
use std::time::Duration;

use crate::middleware::RateLimitConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "coursify")]
#[command(about = "Course platform API server")]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH")]
    pub database_path: String,

    /// Shared secret used to sign and verify access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Socket address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Access token lifetime in hours
    #[arg(long, env = "TOKEN_TTL_HOURS", default_value = "72")]
    pub token_ttl_hours: i64,

    /// bcrypt cost factor for new password hashes
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Burst size of the per-address registration limiter
    #[arg(long, env = "RATE_LIMIT_CAPACITY", default_value = "5")]
    pub rate_limit_capacity: u32,

    /// Seconds needed to earn back one registration attempt
    #[arg(long, env = "RATE_LIMIT_REFILL_SECS", default_value = "60")]
    pub rate_limit_refill_secs: u64,

    /// Idle seconds after which a client's bucket is dropped (defaults to a full refill)
    #[arg(long, env = "RATE_LIMIT_IDLE_SECS")]
    pub rate_limit_idle_secs: Option<u64>,

    /// Email of the administrator created on first start
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Password of the administrator created on first start
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Display name of the bootstrap administrator
    #[arg(long, env = "ADMIN_NAME", default_value = "Administrator")]
    pub admin_name: String,
}

impl Config {
    pub fn rate_limit(&self) -> RateLimitConfig {
        let refill_interval = Duration::from_secs(self.rate_limit_refill_secs.max(1));
        let capacity = self.rate_limit_capacity.max(1);
        let idle_ttl = match self.rate_limit_idle_secs {
            Some(secs) => Duration::from_secs(secs),
            None => refill_interval * capacity,
        };

        RateLimitConfig {
            capacity,
            refill_interval,
            idle_ttl,
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }

    /// Bootstrap credentials, present only when both halves are configured.
    pub fn admin_bootstrap(&self) -> Option<(&str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}
