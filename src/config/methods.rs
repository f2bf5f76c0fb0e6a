//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use super::builder::DiscoveryConfigBuilder;
use super::types::{CrawlPolicy, ResolutionOptions, SynthesisOptions};
use crate::resolver::MergePolicy;

impl<State> DiscoveryConfigBuilder<State> {
    /// Replace the whole crawl policy
    #[must_use]
    pub fn crawl_policy(mut self, policy: CrawlPolicy) -> Self {
        self.crawl = policy;
        self
    }

    #[must_use]
    pub fn synthesis_options(mut self, options: SynthesisOptions) -> Self {
        self.synthesis = options;
        self
    }

    #[must_use]
    pub fn resolution_options(mut self, options: ResolutionOptions) -> Self {
        self.resolution = options;
        self
    }

    /// Set the deepest link level to fetch (seed = 0)
    ///
    /// # Example
    /// ```rust
    /// # use schemascrape::config::DiscoveryConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = DiscoveryConfig::builder()
    ///     .seed_url("https://example.com")
    ///     .max_depth(1)
    ///     .build()?;
    /// assert_eq!(config.crawl_policy().max_depth, 1);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn max_depth(mut self, depth: u8) -> Self {
        self.crawl.max_depth = depth;
        self
    }

    #[must_use]
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.crawl.max_pages = pages;
        self
    }

    #[must_use]
    pub fn same_domain_only(mut self, same_domain_only: bool) -> Self {
        self.crawl.same_domain_only = same_domain_only;
        self
    }

    /// Set the number of concurrently in-flight fetch and synthesis operations
    #[must_use]
    pub fn max_concurrency(mut self, concurrency: usize) -> Self {
        self.crawl.max_concurrency = concurrency;
        self
    }

    /// Set the minimum spacing between requests to one domain; 0 disables it
    #[must_use]
    pub fn per_domain_interval_ms(mut self, interval_ms: u64) -> Self {
        self.crawl.per_domain_interval_ms = interval_ms;
        self
    }

    #[must_use]
    pub fn max_concurrent_per_domain(mut self, limit: usize) -> Self {
        self.crawl.max_concurrent_per_domain = Some(limit);
        self
    }

    /// Set fetch retries for network errors, 429 and 5xx responses
    ///
    /// Set to 0 to record the first failure as final.
    #[must_use]
    pub fn max_fetch_retries(mut self, retries: u8) -> Self {
        self.crawl.max_fetch_retries = retries;
        self
    }

    #[must_use]
    pub fn retry_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.crawl.retry_backoff_ms = backoff_ms;
        self
    }

    /// Replace the excluded path patterns
    #[must_use]
    pub fn excluded_paths<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.crawl.excluded_paths = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.crawl.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.crawl.request_timeout_secs = secs;
        self
    }

    /// Allow `retries` extra synthesis attempts with exponential backoff
    #[must_use]
    pub fn synthesis_retries(mut self, retries: u8, backoff_ms: u64) -> Self {
        self.synthesis.max_retries = retries;
        self.synthesis.retry_backoff_ms = backoff_ms;
        self
    }

    #[must_use]
    pub fn max_signal_chars(mut self, chars: usize) -> Self {
        self.synthesis.max_signal_chars = chars;
        self
    }

    #[must_use]
    pub fn synthesis_model(mut self, model: impl Into<String>) -> Self {
        self.synthesis.model = model.into();
        self
    }

    #[must_use]
    pub fn synthesis_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.synthesis.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn max_traversal_depth(mut self, depth: usize) -> Self {
        self.resolution.max_traversal_depth = depth;
        self
    }

    #[must_use]
    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.resolution.merge_policy = policy;
        self
    }
}
