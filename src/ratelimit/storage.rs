//! Token bucket storage and idle reclamation.
//!
//! # Responsibilities
//! - Map client keys to buckets, creating on first request
//! - Reclaim buckets idle for longer than the configured timeout
//! - Release background resources on shutdown
//!
//! # Design Decisions
//! - `get_or_create` returns a live `Arc<Mutex<TokenBucket>>`: at most one
//!   bucket exists per key, and `update` is a no-op for in-memory storage
//! - Reclamation runs on its own tokio task at half the idle timeout and
//!   never blocks the request path; removal is safe against in-flight
//!   operations because those hold their own `Arc` to the bucket
//! - `release` is idempotent and safe if the reaper was never started

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::ratelimit::bucket::TokenBucket;

/// Default idle-eviction timeout: 10 minutes.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Storage abstraction behind the rate limiter.
///
/// Implementations may be in-memory, distributed, or durable. A remote
/// backend that hands out detached snapshots must persist the post-consume
/// state in [`TokenStorage::update`]; in-memory storage returns the shared
/// live bucket and leaves `update` as the default no-op.
pub trait TokenStorage: Send + Sync {
    /// Return the bucket for `key`, creating one at full `capacity` if
    /// absent. Creation is atomic: concurrent first requests for the same
    /// key observe a single bucket.
    fn get_or_create(&self, key: &str, capacity: u32) -> Arc<Mutex<TokenBucket>>;

    /// Persist updated bucket state. No-op for live in-memory buckets.
    fn update(&self, _key: &str, _bucket: &TokenBucket) {}

    /// Release background resources. Must be idempotent and safe to call
    /// even if nothing was ever started.
    fn release(&self) {}
}

/// In-memory storage over a concurrent map with background idle eviction.
pub struct InMemoryTokenStorage {
    buckets: Arc<DashMap<String, Arc<Mutex<TokenBucket>>>>,
    idle_timeout: Duration,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl InMemoryTokenStorage {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            idle_timeout,
            reaper: Mutex::new(None),
        }
    }

    /// Spawn the background reclamation task. Must be called from within a
    /// tokio runtime; calling it again while a reaper is running is a no-op.
    pub fn start_reaper(&self) {
        let mut slot = self.reaper.lock().expect("reaper handle mutex poisoned");
        if slot.is_some() {
            return;
        }

        let buckets = Arc::clone(&self.buckets);
        let idle_timeout = self.idle_timeout;
        let period = reap_period(idle_timeout);

        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                let removed = reap_idle(&buckets, idle_timeout);
                if removed > 0 {
                    tracing::debug!(removed, "Reclaimed idle rate-limit buckets");
                }
            }
        }));
    }

    /// Run one reclamation pass now, removing buckets idle for longer than
    /// the configured timeout. The background task calls this on every tick.
    pub fn reap(&self) -> usize {
        reap_idle(&self.buckets, self.idle_timeout)
    }

    /// Whether a bucket currently exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.buckets.contains_key(key)
    }

    /// Number of live buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Default for InMemoryTokenStorage {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl TokenStorage for InMemoryTokenStorage {
    fn get_or_create(&self, key: &str, capacity: u32) -> Arc<Mutex<TokenBucket>> {
        self.buckets
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TokenBucket::new(capacity))))
            .clone()
    }

    fn release(&self) {
        if let Some(handle) = self
            .reaper
            .lock()
            .expect("reaper handle mutex poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

/// Reclamation period: half the idle timeout, floored to keep a zero or
/// near-zero timeout from busy-looping.
fn reap_period(idle_timeout: Duration) -> Duration {
    (idle_timeout / 2).max(Duration::from_millis(10))
}

fn reap_idle(
    buckets: &DashMap<String, Arc<Mutex<TokenBucket>>>,
    idle_timeout: Duration,
) -> usize {
    let now = Instant::now();
    let before = buckets.len();
    buckets.retain(|_, bucket| {
        let bucket = bucket.lock().expect("token bucket mutex poisoned");
        now.saturating_duration_since(bucket.last_access()) <= idle_timeout
    });
    before - buckets.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_one_bucket_per_key() {
        let storage = InMemoryTokenStorage::new(DEFAULT_IDLE_TIMEOUT);
        let first = storage.get_or_create("10.0.0.1", 5);
        let second = storage.get_or_create("10.0.0.1", 5);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(storage.len(), 1);

        storage.get_or_create("10.0.0.2", 5);
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn reap_removes_only_idle_buckets() {
        let storage = InMemoryTokenStorage::new(Duration::from_millis(40));
        storage.get_or_create("idle", 1);
        tokio::time::sleep(Duration::from_millis(80)).await;

        let fresh = storage.get_or_create("fresh", 1);
        fresh
            .lock()
            .unwrap()
            .touch(Instant::now());

        let removed = storage.reap();
        assert_eq!(removed, 1);
        assert!(!storage.contains("idle"));
        assert!(storage.contains("fresh"));
    }

    #[tokio::test]
    async fn reaped_key_gets_a_fresh_full_bucket() {
        let storage = InMemoryTokenStorage::new(Duration::from_millis(30));
        let bucket = storage.get_or_create("client", 3);
        while bucket.lock().unwrap().try_consume() {}

        tokio::time::sleep(Duration::from_millis(60)).await;
        storage.reap();
        assert!(!storage.contains("client"));

        let fresh = storage.get_or_create("client", 3);
        assert_eq!(fresh.lock().unwrap().tokens(), 3.0);
    }

    #[tokio::test]
    async fn background_reaper_evicts_idle_buckets() {
        let storage = InMemoryTokenStorage::new(Duration::from_millis(40));
        storage.start_reaper();
        storage.get_or_create("client", 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!storage.contains("client"));
        storage.release();
    }

    #[tokio::test]
    async fn release_is_idempotent_and_safe_without_start() {
        let storage = InMemoryTokenStorage::new(DEFAULT_IDLE_TIMEOUT);
        storage.release(); // never started

        storage.start_reaper();
        storage.release();
        storage.release(); // second call is a no-op

        // A released storage still serves buckets; only reclamation stops.
        storage.get_or_create("client", 1);
        assert!(storage.contains("client"));
    }

    #[tokio::test]
    async fn start_reaper_twice_keeps_one_task() {
        let storage = InMemoryTokenStorage::new(Duration::from_millis(40));
        storage.start_reaper();
        storage.start_reaper();
        storage.release();
    }
}
