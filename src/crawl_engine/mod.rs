//! Crawl Engine Module
//!
//! This module contains the crawl frontier, the fetch capability and the
//! session orchestrator that drives extraction, synthesis, resolution,
//! validation and assembly for every crawled page.

// Sub-modules
pub mod crawl_types;
pub mod crawler;
pub mod domain_limiter;
pub mod fetch;
pub mod link_processor;
pub mod orchestrator;
pub mod progress;
pub mod rate_limiter;
pub mod report;

// Re-export crawler types and functions
pub use crawl_types::{CrawlError, CrawlResult, FailureKind, PageTask};
pub use crawler::{Crawler, crawl};

// Re-export fetch capability
pub use fetch::{FetchError, FetchResponse, Fetcher, HttpFetcher, RetryPolicy, fetch_page};

// Re-export link handling
pub use link_processor::{LinkFilter, extract_links};

// Re-export rate and concurrency limiters
pub use domain_limiter::DomainLimiter;
pub use rate_limiter::{CrawlRateLimiter, RateLimitDecision};

// Re-export orchestration and progress types
pub use orchestrator::{EngineError, SchemaDiscoveryEngine};
pub use progress::{NoOpProgress, ProgressReporter};
pub use report::{PageSummary, SessionReport};
