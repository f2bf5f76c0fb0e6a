//! Per-domain concurrency limiter
//!
//! Caps the number of in-flight fetches against any single domain, on top of
//! the crawl-wide concurrency limit.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::utils::extract_domain;

/// Per-domain concurrency limiter using lock-free `DashMap`
///
/// Each domain gets its own semaphore, created lazily on first use.
#[derive(Debug)]
pub struct DomainLimiter {
    domain_semaphores: DashMap<String, Arc<Semaphore>>,
    max_per_domain: usize,
}

impl DomainLimiter {
    #[must_use]
    pub fn new(max_per_domain: usize) -> Self {
        Self {
            domain_semaphores: DashMap::new(),
            max_per_domain: max_per_domain.max(1),
        }
    }

    #[must_use]
    pub fn max_per_domain(&self) -> usize {
        self.max_per_domain
    }

    /// Wait for a permit for `url`'s domain. The permit is released on drop.
    ///
    /// Returns `None` for URLs without a domain; those are not limited.
    pub async fn acquire(&self, url: &str) -> Option<OwnedSemaphorePermit> {
        let domain = extract_domain(url)?;
        let semaphore = self
            .domain_semaphores
            .entry(domain.clone())
            .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_domain)))
            .clone();

        // semaphores are never closed, so this only fails on a broken invariant
        match semaphore.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                log::error!("Semaphore for domain '{domain}' was closed unexpectedly: {e}");
                None
            }
        }
    }

    /// Permits currently available for a domain (the full limit if unseen)
    #[must_use]
    pub fn available(&self, domain: &str) -> usize {
        self.domain_semaphores
            .get(domain)
            .map_or(self.max_per_domain, |s| s.available_permits())
    }
}
