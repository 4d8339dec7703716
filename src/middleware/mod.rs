//! Middleware for observability and abuse protection.
//!
//! This module provides:
//! - Request logging with latency tracking
//! - Token-bucket rate limiting per client IP address

pub mod logging;
pub mod rate_limit;

pub use logging::request_logging;
pub use rate_limit::{
    rate_limit_middleware, Clock, RateLimitConfig, RateLimitDecision, RateLimiter, SystemClock,
};
