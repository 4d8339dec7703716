//! Rate limiting middleware.
//!
//! In-memory token bucket per client IP address. All bucket bookkeeping
//! (lookup, creation, refill, consume) happens under one lock so two
//! concurrent first requests from the same address share a single bucket.
//! The lock is never held while the downstream handler runs.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Source of monotonic time, injectable for deterministic tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Configuration for rate limiting.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Bucket size; also the burst a new client may spend at once.
    pub capacity: u32,
    /// Time needed to earn back one token.
    pub refill_interval: Duration,
    /// Buckets untouched for this long are evicted.
    pub idle_ttl: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            refill_interval: Duration::from_secs(60),
            idle_ttl: Duration::from_secs(5 * 60),
        }
    }
}

struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn full(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, now: Instant, config: &RateLimitConfig) {
        if self.tokens >= config.capacity {
            self.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_refill);
        let interval = config.refill_interval.as_nanos().max(1);
        let earned = (elapsed.as_nanos() / interval).min(u128::from(config.capacity)) as u32;
        if earned == 0 {
            return;
        }

        self.tokens = (self.tokens + earned).min(config.capacity);
        if self.tokens == config.capacity {
            self.last_refill = now;
        } else {
            self.last_refill += config.refill_interval * earned;
        }
    }

    fn retry_after(&self, now: Instant, config: &RateLimitConfig) -> Duration {
        let elapsed = now.saturating_duration_since(self.last_refill);
        config.refill_interval.saturating_sub(elapsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Rate limiter state tracking one bucket per client key.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Spend one token for `key`, creating a full bucket on first sight.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let mut buckets = self.buckets.lock();

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::full(self.config.capacity, now));

        bucket.refill(now, &self.config);
        bucket.last_seen = now;

        if bucket.tokens == 0 {
            return RateLimitDecision::Limited {
                retry_after: bucket.retry_after(now, &self.config),
            };
        }

        bucket.tokens -= 1;
        RateLimitDecision::Allowed {
            remaining: bucket.tokens,
        }
    }

    /// Drop buckets idle for at least `idle_ttl`.
    ///
    /// With the default horizon an idle bucket has refilled completely, so
    /// dropping it never changes a later decision.
    pub fn evict_idle(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.idle_ttl;
        let mut buckets = self.buckets.lock();

        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) < ttl);
        before - buckets.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().len()
    }

    /// Periodic eviction, once per refill interval.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.config.refill_interval);
            loop {
                ticker.tick().await;
                let evicted = limiter.evict_idle();
                if evicted > 0 {
                    debug!(
                        evicted,
                        remaining = limiter.tracked_clients(),
                        "Evicted idle rate limit buckets"
                    );
                }
            }
        })
    }
}

/// Rate limiting middleware function.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = addr.ip().to_string();

    match limiter.check(&ip) {
        RateLimitDecision::Allowed { .. } => next.run(request).await,
        RateLimitDecision::Limited { retry_after } => {
            // Round up so clients never retry early
            let retry_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            warn!(
                client_ip = %ip,
                path = %request.uri().path(),
                retry_after_secs = retry_secs,
                "Rate limit exceeded"
            );

            let body = serde_json::json!({
                "error": "too_many_requests",
                "message": "You have made too many requests. Please try again later.",
                "retry_after_seconds": retry_secs,
            });

            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(body),
            )
                .into_response()
        }
    }
}
