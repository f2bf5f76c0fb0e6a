//! Core types for the crawl frontier.
//!
//! This module contains the crawl error type, the frontier task type, and
//! the failure classification used to decide fetch retries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fetch::FetchError;

/// Errors that prevent a crawl from starting or continuing
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrawlError {
    /// Seed URL is not an absolute http(s) URL
    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    /// Policy values that cannot produce a crawl
    #[error("Invalid crawl policy: {0}")]
    InvalidPolicy(String),

    /// Operation cancelled
    #[error("Crawl operation was cancelled")]
    Cancelled,
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// A page waiting in the frontier. Identity is the normalized URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTask {
    /// Normalized absolute URL
    pub url: String,
    pub depth: u8,
    /// Domain of the page that linked here (the seed's domain for the seed)
    pub origin_domain: String,
    /// Position in enqueue order, 0 for the seed
    pub sequence: u64,
}

/// Categorizes fetch failures for retry decisions
///
/// - Network errors are usually transient and worth retrying
/// - Rate limiting is retried with a longer backoff
/// - Server errors (5xx) may recover
/// - Everything else (4xx, bad URLs) is permanent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, DNS, connection refused or reset
    Network,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError,
    /// Not worth retrying
    Permanent,
}

impl FailureKind {
    /// Classify an HTTP status that is not a success
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::Permanent,
        }
    }

    #[must_use]
    pub const fn from_error(error: &FetchError) -> Self {
        match error {
            FetchError::Network(_) | FetchError::Timeout => Self::Network,
            FetchError::InvalidUrl(_) => Self::Permanent,
        }
    }

    /// Whether this failure kind should be retried by default
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Permanent)
    }

    /// Base delay multiplier for this failure kind
    #[must_use]
    pub const fn delay_multiplier(&self) -> u64 {
        match self {
            Self::RateLimited => 3,
            Self::Network | Self::ServerError | Self::Permanent => 1,
        }
    }
}
