//! Memory-bounded per-domain request spacing
//!
//! Each domain has a "next free slot" instant. A request reserves the
//! earliest slot at or after now and pushes the domain's next slot one
//! interval further, so concurrent requests to one domain are spread out
//! instead of all waking at the same moment.
//!
//! Key features:
//! - Async-friendly with `tokio::sync` primitives
//! - LRU cache with bounded capacity (max 1000 domains)
//! - Uses `tokio::time::Instant`, so tests can drive it with a paused clock
//! - Immediate Allow/Deny decisions via [`CrawlRateLimiter::check`]

use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::utils::extract_domain;

/// Maximum number of domains to track simultaneously
const MAX_DOMAIN_LIMITERS: usize = 1000;

/// Rate limit decision for a crawl request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is allowed to proceed
    Allow,
    /// Request should be deferred; contains the duration to wait
    Deny { retry_after: Duration },
}

#[derive(Debug)]
pub struct CrawlRateLimiter {
    interval: Duration,
    next_slot: Mutex<LruCache<String, Instant>>,
}

impl CrawlRateLimiter {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let capacity = NonZeroUsize::new(MAX_DOMAIN_LIMITERS).unwrap_or(NonZeroUsize::MIN);
        Self {
            interval,
            next_slot: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[must_use]
    pub fn from_millis(interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms))
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn domain_key(url: &str) -> Option<String> {
        extract_domain(url).filter(|d| !d.is_empty())
    }

    /// Non-reserving check: would a request to `url` go out right now?
    pub async fn check(&self, url: &str) -> RateLimitDecision {
        if self.interval.is_zero() {
            return RateLimitDecision::Allow;
        }
        let Some(domain) = Self::domain_key(url) else {
            return RateLimitDecision::Allow;
        };
        let now = Instant::now();
        let mut slots = self.next_slot.lock().await;
        match slots.get(&domain) {
            Some(&slot) if slot > now => RateLimitDecision::Deny {
                retry_after: slot - now,
            },
            _ => RateLimitDecision::Allow,
        }
    }

    /// Reserve the next slot for `url`'s domain and return how long to wait
    /// for it.
    pub async fn reserve(&self, url: &str) -> Duration {
        if self.interval.is_zero() {
            return Duration::ZERO;
        }
        let Some(domain) = Self::domain_key(url) else {
            return Duration::ZERO;
        };
        let now = Instant::now();
        let mut slots = self.next_slot.lock().await;
        let slot = match slots.get(&domain) {
            Some(&next) if next > now => next,
            _ => now,
        };
        slots.put(domain, slot + self.interval);
        slot - now
    }

    /// Reserve a slot and sleep until it arrives
    pub async fn wait_turn(&self, url: &str) {
        let delay = self.reserve(url).await;
        if !delay.is_zero() {
            log::debug!("Rate limit: waiting {delay:?} before fetching {url}");
            tokio::time::sleep(delay).await;
        }
    }

    /// Number of domains currently tracked
    pub async fn tracked_domains(&self) -> usize {
        self.next_slot.lock().await.len()
    }

    /// Forget all domains
    pub async fn clear(&self) {
        self.next_slot.lock().await.clear();
    }
}
