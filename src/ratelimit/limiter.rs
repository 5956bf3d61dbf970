//! Rate limiting filter.
//!
//! # Responsibilities
//! - Resolve a client key from the remote address (bypass when absent)
//! - Refill and charge the client's bucket as one locked unit
//! - Set standard and legacy rate-limit headers on every response
//! - Short-circuit with 429 + Retry-After when no credit is available
//!
//! # Design Decisions
//! - The bucket lock is held across refill, consume, and header-value
//!   computation so concurrent requests for one key never observe stale
//!   credit counts; it is dropped before the chain advances
//! - Rejection is expected steady-state traffic: logged at warn and counted,
//!   never surfaced as an error

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderName, HeaderValue, StatusCode};

use crate::observability::metrics;
use crate::pipeline::{Filter, FilterChain, RequestContext, ResponseContext};
use crate::ratelimit::storage::{InMemoryTokenStorage, TokenStorage, DEFAULT_IDLE_TIMEOUT};

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
const X_RATELIMIT_POLICY: HeaderName = HeaderName::from_static("x-ratelimit-policy");
const X_RETRY_AFTER: HeaderName = HeaderName::from_static("x-retry-after");

/// Token-bucket rate limiting [`Filter`], one bucket per client IP.
pub struct RateLimiter {
    capacity: u32,
    tokens_per_second: f64,
    storage: Arc<dyn TokenStorage>,
    policy: HeaderValue,
}

impl RateLimiter {
    /// In-memory limiter with the default 10 minute idle eviction.
    ///
    /// Must be constructed within a tokio runtime: the in-memory storage
    /// spawns its reclamation task immediately.
    pub fn new(capacity: u32, tokens_per_second: f64) -> Self {
        Self::with_idle_timeout(capacity, tokens_per_second, DEFAULT_IDLE_TIMEOUT)
    }

    /// In-memory limiter with a custom idle-eviction timeout.
    pub fn with_idle_timeout(
        capacity: u32,
        tokens_per_second: f64,
        idle_timeout: Duration,
    ) -> Self {
        let storage = InMemoryTokenStorage::new(idle_timeout);
        storage.start_reaper();
        Self::with_storage(capacity, tokens_per_second, Arc::new(storage))
    }

    /// Limiter over a caller-provided storage backend. The backend manages
    /// its own background resources.
    pub fn with_storage(
        capacity: u32,
        tokens_per_second: f64,
        storage: Arc<dyn TokenStorage>,
    ) -> Self {
        let policy = format!(
            "token-bucket; capacity={capacity}; refill={tokens_per_second}/s"
        );
        Self {
            capacity,
            tokens_per_second,
            storage,
            policy: HeaderValue::from_str(&policy).expect("policy descriptor is ascii"),
        }
    }

    /// Stop background reclamation in the underlying storage. Idempotent.
    pub fn release(&self) {
        self.storage.release();
    }
}

impl Filter for RateLimiter {
    fn apply(&self, req: &mut RequestContext, res: &mut ResponseContext, chain: &mut FilterChain) {
        // No peer information: rate limiting cannot key this request.
        let Some(addr) = req.remote_addr() else {
            chain.advance(req, res);
            return;
        };
        let key = addr.ip().to_string();

        let now = Instant::now();
        let bucket = self.storage.get_or_create(&key, self.capacity);

        let consumed;
        let reset;
        {
            let mut bucket = bucket.lock().expect("token bucket mutex poisoned");
            bucket.refill(now, self.tokens_per_second, self.capacity);
            bucket.touch(now);
            consumed = bucket.try_consume();
            self.storage.update(&key, &bucket);

            let remaining = bucket.tokens().floor() as u64;
            let missing = (1.0 - bucket.tokens()).max(0.0);
            // Saturates when the refill rate is zero: reset is "never".
            reset = (missing / self.tokens_per_second).ceil() as u64;

            res.header(RATELIMIT_LIMIT, HeaderValue::from(self.capacity))
                .header(X_RATELIMIT_LIMIT, HeaderValue::from(self.capacity))
                .header(RATELIMIT_REMAINING, HeaderValue::from(remaining))
                .header(X_RATELIMIT_REMAINING, HeaderValue::from(remaining))
                .header(RATELIMIT_RESET, HeaderValue::from(reset))
                .header(X_RATELIMIT_RESET, HeaderValue::from(reset))
                .header(RATELIMIT_POLICY, self.policy.clone())
                .header(X_RATELIMIT_POLICY, self.policy.clone());
        }

        if !consumed {
            tracing::warn!(client = %key, "Rate limit exceeded");
            metrics::record_rate_limited();
            res.header(RETRY_AFTER, HeaderValue::from(reset))
                .header(X_RETRY_AFTER, HeaderValue::from(reset))
                .set_status(StatusCode::TOO_MANY_REQUESTS);
            return;
        }

        chain.advance(req, res);
    }
}
