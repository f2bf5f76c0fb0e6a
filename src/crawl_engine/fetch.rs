//! Page fetching with retry at the transport boundary.
//!
//! The [`Fetcher`] trait is the raw HTTP capability; [`HttpFetcher`] is the
//! `reqwest` implementation. [`fetch_page`] applies the crawl's retry policy
//! and turns the outcome into a [`PageRecord`], so a failed fetch is data,
//! never a crawl-halting error.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::crawl_types::{FailureKind, PageTask};
use super::rate_limiter::CrawlRateLimiter;
use crate::page_extractor::{FetchStatus, PageRecord};
use crate::utils::MAX_BACKOFF_MS;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Raw response of one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    /// `Content-Type` header value, if the server sent one
    pub content_type: Option<String>,
}

impl FetchResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Missing content types are assumed to be HTML
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().is_none_or(|ct| {
            let media = ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase();
            media == "text/html" || media == "application/xhtml+xml"
        })
    }
}

/// HTTP transport capability
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// `reqwest`-backed fetcher following redirects
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend fails to initialize.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else if e.is_builder() {
                    FetchError::InvalidUrl(e.to_string())
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        Ok(FetchResponse {
            status,
            body,
            content_type,
        })
    }
}

/// Retry settings at the fetch boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u8,
    pub backoff_ms: u64,
}

impl RetryPolicy {
    fn delay(&self, attempt: u8, kind: FailureKind) -> Duration {
        let exp = self.backoff_ms.saturating_mul(1u64 << attempt.min(16));
        Duration::from_millis(exp.saturating_mul(kind.delay_multiplier()).min(MAX_BACKOFF_MS))
    }
}

/// Fetch a page, retrying transient failures, and record the outcome.
///
/// Every attempt, retries included, first takes its turn with the per-domain
/// rate limiter.
pub async fn fetch_page(
    fetcher: &dyn Fetcher,
    rate_limiter: &CrawlRateLimiter,
    task: &PageTask,
    retry: RetryPolicy,
) -> PageRecord {
    let mut attempt: u8 = 0;

    let (status, markup) = loop {
        rate_limiter.wait_turn(&task.url).await;
        let (kind, failed) = match fetcher.fetch(&task.url).await {
            Ok(response) if response.is_success() => {
                if !response.is_html() {
                    let content_type = response.content_type.unwrap_or_default();
                    log::debug!("Skipping non-HTML content ({content_type}) at {}", task.url);
                    break (FetchStatus::UnsupportedContent { content_type }, String::new());
                }
                break (
                    FetchStatus::Success {
                        status: response.status,
                    },
                    response.body,
                );
            }
            Ok(response) => (
                FailureKind::from_status(response.status),
                FetchStatus::HttpError {
                    status: response.status,
                },
            ),
            Err(e) => (
                FailureKind::from_error(&e),
                FetchStatus::NetworkError {
                    message: e.to_string(),
                },
            ),
        };

        if kind.is_retryable() && attempt < retry.max_retries {
            let delay = retry.delay(attempt, kind);
            log::debug!(
                "Fetch attempt {} for {} failed ({failed:?}), retrying in {delay:?}",
                attempt + 1,
                task.url
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
            continue;
        }

        log::warn!("Failed to fetch {}: {failed:?}", task.url);
        break (failed, String::new());
    };

    PageRecord {
        url: task.url.clone(),
        depth: task.depth,
        sequence: task.sequence,
        markup,
        fetched_at: chrono::Utc::now(),
        status,
    }
}
