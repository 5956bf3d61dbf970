//! Token bucket state.
//!
//! # Responsibilities
//! - Track available credits with time-based refill
//! - Track last-refill and last-access instants
//!
//! # Design Decisions
//! - Credits are `f64`, capped at an integer capacity; externally exposed
//!   "remaining" is the floor of the current credits
//! - Monotonic `Instant` time; a non-positive elapsed interval is a no-op
//! - No internal locking: storage hands buckets out behind a mutex and
//!   callers serialize refill + consume + touch as one unit

use std::time::Instant;

/// Mutable per-client credit cell.
pub struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    last_access: Instant,
}

impl TokenBucket {
    /// Create a bucket filled to capacity.
    pub fn new(capacity: u32) -> Self {
        let now = Instant::now();
        Self {
            tokens: f64::from(capacity),
            last_refill: now,
            last_access: now,
        }
    }

    /// Current credit count.
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Add credits for the time elapsed since the last refill, capped at
    /// `capacity`, and move the refill timestamp to `now`. No-op when no
    /// time has elapsed.
    pub fn refill(&mut self, now: Instant, tokens_per_second: f64, capacity: u32) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }
        self.tokens = (self.tokens + elapsed * tokens_per_second).min(f64::from(capacity));
        self.last_refill = now;
    }

    /// Consume one credit if at least one is available. Failure leaves the
    /// bucket unchanged: there is no partial consumption.
    pub fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Record an access for idle-eviction accounting.
    pub fn touch(&mut self, now: Instant) {
        self.last_access = now;
    }

    /// Instant of the most recent access.
    pub fn last_access(&self) -> Instant {
        self.last_access
    }
}
