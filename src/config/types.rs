//! Core configuration types for discovery sessions
//!
//! This module contains the `DiscoveryConfig` struct and the option groups
//! it is made of. Every option group deserializes with defaults for missing
//! fields, so partial JSON config files are valid.

use serde::{Deserialize, Serialize};

use crate::crawl_engine::CrawlError;
use crate::resolver::MergePolicy;
use crate::utils::{
    DEFAULT_EXCLUDED_PATHS, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FETCH_RETRIES,
    DEFAULT_MAX_PAGES, DEFAULT_MAX_SIGNAL_CHARS, DEFAULT_MAX_TRAVERSAL_DEPTH,
    DEFAULT_PER_DOMAIN_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BACKOFF_MS,
    DEFAULT_SYNTHESIS_API_BASE, DEFAULT_SYNTHESIS_BACKOFF_MS, DEFAULT_SYNTHESIS_MODEL,
    DEFAULT_SYNTHESIS_RETRIES, DEFAULT_USER_AGENT,
};

/// Limits and rules for page enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlPolicy {
    /// Deepest link level fetched; the seed is depth 0
    pub max_depth: u8,
    /// Upper bound on pages enqueued (and so fetched) per session
    pub max_pages: usize,
    /// Only follow links whose domain matches the seed's (ignoring `www.`)
    pub same_domain_only: bool,
    /// Concurrently in-flight fetch and synthesis operations
    pub max_concurrency: usize,
    /// Minimum spacing between two requests to one domain
    pub per_domain_interval_ms: u64,
    /// Optional cap on in-flight fetches per domain
    pub max_concurrent_per_domain: Option<usize>,
    pub max_fetch_retries: u8,
    pub retry_backoff_ms: u64,
    /// Path substrings, or `*` globs over the full URL, never crawled
    pub excluded_paths: Vec<String>,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for CrawlPolicy {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            same_domain_only: true,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            per_domain_interval_ms: DEFAULT_PER_DOMAIN_INTERVAL_MS,
            max_concurrent_per_domain: None,
            max_fetch_retries: DEFAULT_MAX_FETCH_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| (*p).to_string()).collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl CrawlPolicy {
    /// Reject values that cannot produce a crawl.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::InvalidPolicy`] for a zero page budget, zero
    /// concurrency, a zero per-domain cap or an empty user agent.
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.max_pages == 0 {
            return Err(CrawlError::InvalidPolicy("max_pages must be at least 1".into()));
        }
        if self.max_concurrency == 0 {
            return Err(CrawlError::InvalidPolicy(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.max_concurrent_per_domain == Some(0) {
            return Err(CrawlError::InvalidPolicy(
                "max_concurrent_per_domain must be at least 1".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(CrawlError::InvalidPolicy("user_agent must not be empty".into()));
        }
        Ok(())
    }
}

/// Options for the synthesis fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    /// Retries after the first attempt; 0 calls the backend once
    pub max_retries: u8,
    pub retry_backoff_ms: u64,
    /// Cap on the visible-text excerpt sent to the backend
    pub max_signal_chars: usize,
    pub model: String,
    pub api_base: String,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_SYNTHESIS_RETRIES,
            retry_backoff_ms: DEFAULT_SYNTHESIS_BACKOFF_MS,
            max_signal_chars: DEFAULT_MAX_SIGNAL_CHARS,
            model: DEFAULT_SYNTHESIS_MODEL.to_string(),
            api_base: DEFAULT_SYNTHESIS_API_BASE.to_string(),
        }
    }
}

/// Options for entity resolution and graph traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionOptions {
    /// Depth bound for every entity graph traversal
    pub max_traversal_depth: usize,
    pub merge_policy: MergePolicy,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
            merge_policy: MergePolicy::default(),
        }
    }
}

/// Main configuration struct for a discovery session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Normalized seed URL (normalized in builder)
    pub(crate) seed_url: String,
    pub(crate) crawl: CrawlPolicy,
    pub(crate) synthesis: SynthesisOptions,
    pub(crate) resolution: ResolutionOptions,
}
