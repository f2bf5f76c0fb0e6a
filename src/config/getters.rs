//! Getter methods for `DiscoveryConfig`

use std::time::Duration;

use super::types::{CrawlPolicy, DiscoveryConfig, ResolutionOptions, SynthesisOptions};

impl DiscoveryConfig {
    #[must_use]
    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    #[must_use]
    pub fn crawl_policy(&self) -> &CrawlPolicy {
        &self.crawl
    }

    #[must_use]
    pub fn synthesis(&self) -> &SynthesisOptions {
        &self.synthesis
    }

    #[must_use]
    pub fn resolution(&self) -> &ResolutionOptions {
        &self.resolution
    }

    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.crawl.max_concurrency
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawl.request_timeout_secs)
    }

    #[must_use]
    pub fn per_domain_interval(&self) -> Duration {
        Duration::from_millis(self.crawl.per_domain_interval_ms)
    }
}
