//! Breadth-first crawl frontier
//!
//! The [`Crawler`] owns the frontier queue and the visited set. A URL is
//! marked visited when it is enqueued, so it is fetched at most once per
//! session no matter how many pages link to it. Fetches run concurrently,
//! but links are expanded strictly in enqueue order, which keeps the set of
//! visited URLs (and their sequence numbers) independent of completion order.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use log::{debug, info};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::crawl_types::{CrawlError, CrawlResult, PageTask};
use super::domain_limiter::DomainLimiter;
use super::fetch::{Fetcher, RetryPolicy, fetch_page};
use super::link_processor::{LinkFilter, extract_links};
use super::rate_limiter::CrawlRateLimiter;
use crate::config::CrawlPolicy;
use crate::page_extractor::PageRecord;
use crate::utils::{extract_domain, normalize_url};

/// A finished fetch plus the raw links found on the page
struct FetchOutcome {
    task: PageTask,
    record: PageRecord,
    links: Vec<String>,
}

/// Shared handles every fetch future needs
#[derive(Clone)]
struct FetchContext {
    fetcher: Arc<dyn Fetcher>,
    rate_limiter: Arc<CrawlRateLimiter>,
    domain_limiter: Option<Arc<DomainLimiter>>,
    retry: RetryPolicy,
    max_depth: u8,
}

impl FetchContext {
    fn spawn(&self, task: PageTask) -> BoxFuture<'static, FetchOutcome> {
        let ctx = self.clone();
        Box::pin(async move {
            let _domain_permit = match &ctx.domain_limiter {
                Some(limiter) => limiter.acquire(&task.url).await,
                None => None,
            };
            info!("Crawling [depth {}]: {}", task.depth, task.url);
            let record =
                fetch_page(ctx.fetcher.as_ref(), &ctx.rate_limiter, &task, ctx.retry).await;
            let links = if record.is_success() && task.depth < ctx.max_depth {
                extract_links(&record.markup, &record.url)
            } else {
                Vec::new()
            };

            FetchOutcome {
                task,
                record,
                links,
            }
        })
    }
}

/// Deterministic breadth-first page enumerator
pub struct Crawler {
    seed_url: String,
    policy: CrawlPolicy,
    filter: LinkFilter,
    ctx: FetchContext,
    frontier: VecDeque<PageTask>,
    visited: HashSet<String>,
    next_sequence: u64,
    in_flight: FuturesUnordered<BoxFuture<'static, FetchOutcome>>,
    /// Completed pages whose links wait for every earlier page to expand
    pending_links: BTreeMap<u64, (PageTask, Vec<String>)>,
    next_expand: u64,
    cancel: CancellationToken,
    cancelled: bool,
}

impl Crawler {
    /// Create a crawler with the seed enqueued at depth 0.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::InvalidSeed`] if the seed is not an absolute
    /// http(s) URL, [`CrawlError::InvalidPolicy`] for unusable policy values
    /// and [`CrawlError::Cancelled`] if the token is already cancelled.
    pub fn new(
        seed_url: &str,
        policy: CrawlPolicy,
        fetcher: Arc<dyn Fetcher>,
        cancel: CancellationToken,
    ) -> CrawlResult<Self> {
        policy.validate()?;
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        let seed = normalize_url(seed_url).map_err(|e| CrawlError::InvalidSeed {
            url: seed_url.to_string(),
            reason: format!("{e:#}"),
        })?;
        let filter = LinkFilter::new(&seed, policy.same_domain_only, &policy.excluded_paths)?;
        let seed_domain = extract_domain(&seed).unwrap_or_default();

        let ctx = FetchContext {
            fetcher,
            rate_limiter: Arc::new(CrawlRateLimiter::from_millis(policy.per_domain_interval_ms)),
            domain_limiter: policy
                .max_concurrent_per_domain
                .map(|limit| Arc::new(DomainLimiter::new(limit))),
            retry: RetryPolicy {
                max_retries: policy.max_fetch_retries,
                backoff_ms: policy.retry_backoff_ms,
            },
            max_depth: policy.max_depth,
        };

        let mut crawler = Self {
            seed_url: seed.clone(),
            policy,
            filter,
            ctx,
            frontier: VecDeque::new(),
            visited: HashSet::new(),
            next_sequence: 0,
            in_flight: FuturesUnordered::new(),
            pending_links: BTreeMap::new(),
            next_expand: 0,
            cancel,
            cancelled: false,
        };
        crawler.enqueue(seed, 0, seed_domain);
        Ok(crawler)
    }

    #[must_use]
    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    #[must_use]
    pub fn policy(&self) -> &CrawlPolicy {
        &self.policy
    }

    /// URLs enqueued so far, fetched or not
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    #[must_use]
    pub fn has_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Whether the session stopped because of cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn enqueue(&mut self, url: String, depth: u8, origin_domain: String) -> bool {
        if self.visited.len() >= self.policy.max_pages || self.visited.contains(&url) {
            return false;
        }
        self.visited.insert(url.clone());
        let task = PageTask {
            url,
            depth,
            origin_domain,
            sequence: self.next_sequence,
        };
        debug!("Enqueued #{} at depth {}: {}", task.sequence, task.depth, task.url);
        self.next_sequence += 1;
        self.frontier.push_back(task);
        true
    }

    fn dispatch(&mut self) {
        while self.in_flight.len() < self.policy.max_concurrency {
            let Some(task) = self.frontier.pop_front() else {
                break;
            };
            let future = self.ctx.spawn(task);
            self.in_flight.push(future);
        }
    }

    /// Expand every completed page whose predecessors have all expanded
    fn expand_ready(&mut self) {
        while let Some((task, links)) = self.pending_links.remove(&self.next_expand) {
            self.next_expand += 1;
            if links.is_empty() || task.depth >= self.policy.max_depth {
                continue;
            }
            let origin = extract_domain(&task.url).unwrap_or_default();
            let mut added = 0usize;
            for link in self.filter.filter(&task.url, links) {
                if self.enqueue(link, task.depth + 1, origin.clone()) {
                    added += 1;
                }
            }
            if added > 0 {
                debug!("Expanded {} with {added} new pages", task.url);
            }
        }
    }

    fn stop(&mut self) {
        if !self.cancelled {
            info!(
                "Crawl cancelled with {} queued and {} in-flight pages",
                self.frontier.len(),
                self.in_flight.len()
            );
        }
        self.cancelled = true;
        self.frontier.clear();
        self.in_flight = FuturesUnordered::new();
        self.pending_links.clear();
    }

    /// Fetch and return the next completed page.
    ///
    /// Pages come back in completion order. Returns `None` when the frontier
    /// is exhausted or the session was cancelled.
    pub async fn next_page(&mut self) -> Option<PageRecord> {
        if self.cancelled {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.stop();
            return None;
        }

        self.dispatch();
        if self.in_flight.is_empty() {
            return None;
        }

        let outcome = tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            outcome = self.in_flight.next() => outcome,
        };

        let Some(FetchOutcome {
            task,
            record,
            links,
        }) = outcome
        else {
            if self.cancel.is_cancelled() {
                self.stop();
            }
            return None;
        };

        self.pending_links.insert(task.sequence, (task, links));
        self.expand_ready();
        self.dispatch();
        Some(record)
    }

    /// Turn the crawler into a stream of completed pages
    pub fn into_stream(self) -> impl Stream<Item = PageRecord> + Send {
        futures::stream::unfold(self, |mut crawler| async move {
            crawler.next_page().await.map(|record| (record, crawler))
        })
    }
}

/// Crawl from `seed_url` and collect every page record.
///
/// On cancellation the pages completed so far are returned.
///
/// # Errors
///
/// See [`Crawler::new`].
pub async fn crawl(
    seed_url: &str,
    policy: CrawlPolicy,
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationToken,
) -> CrawlResult<Vec<PageRecord>> {
    let crawler = Crawler::new(seed_url, policy, fetcher, cancel)?;
    let seed = crawler.seed_url().to_string();
    let pages: Vec<PageRecord> = crawler.into_stream().collect().await;
    info!("Crawl of {seed} finished with {} pages", pages.len());
    Ok(pages)
}
