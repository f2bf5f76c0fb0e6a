//! Discovery session orchestration
//!
//! Coordinates one session end to end:
//! - Crawl frontier and concurrent fetching
//! - Per-page extract-or-synthesize pipelines
//! - Entity resolution on the orchestrator's own loop
//! - Validation and per-page document assembly

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::crawl_types::CrawlError;
use super::crawler::Crawler;
use super::fetch::{FetchError, Fetcher, HttpFetcher};
use super::progress::{NoOpProgress, ProgressReporter};
use super::report::{PageSummary, SessionReport};
use crate::assembler::Assembler;
use crate::config::DiscoveryConfig;
use crate::page_extractor::{
    FetchStatus, PageRecord, ParseIssue, SchemaCandidate, extract_with_issues,
};
use crate::resolver::Resolver;
use crate::synthesis::{SynthesisAdapter, SynthesisError, Synthesizer};
use crate::taxonomy::{Taxonomy, TaxonomyError};
use crate::validator::{IssueCode, ValidationIssue, Validator, sort_issues};

/// Fatal session errors. Everything else ends up in the report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Failed to create fetcher: {0}")]
    Fetcher(#[from] FetchError),
}

/// Everything one page pipeline produced
struct PageOutcome {
    summary: PageSummary,
    candidates: Vec<SchemaCandidate>,
    parse_issues: Vec<ParseIssue>,
    synthesis_error: Option<SynthesisError>,
}

/// Crawl, extract, resolve, validate and assemble for one seed URL
pub struct SchemaDiscoveryEngine {
    config: DiscoveryConfig,
    taxonomy: Arc<Taxonomy>,
    fetcher: Arc<dyn Fetcher>,
    synthesis: SynthesisAdapter,
    progress: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for SchemaDiscoveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaDiscoveryEngine")
            .field("seed_url", &self.config.seed_url())
            .field("taxonomy_types", &self.taxonomy.len())
            .field("synthesis", &self.synthesis)
            .finish_non_exhaustive()
    }
}

impl SchemaDiscoveryEngine {
    #[must_use]
    pub fn new(
        config: DiscoveryConfig,
        taxonomy: Arc<Taxonomy>,
        fetcher: Arc<dyn Fetcher>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        let options = config.synthesis();
        let synthesis = SynthesisAdapter::new(synthesizer)
            .with_retries(options.max_retries, options.retry_backoff_ms)
            .with_max_signal_chars(options.max_signal_chars);
        Self {
            config,
            taxonomy,
            fetcher,
            synthesis,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Build an engine that fetches pages over HTTP.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be created.
    pub fn with_http(
        config: DiscoveryConfig,
        taxonomy: Arc<Taxonomy>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Result<Self, EngineError> {
        let policy = config.crawl_policy();
        let fetcher = HttpFetcher::new(&policy.user_agent, config.request_timeout())?;
        Ok(Self::new(config, taxonomy, Arc::new(fetcher), synthesizer))
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    #[must_use]
    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    /// Run one session to completion or cancellation.
    ///
    /// Per-page failures never abort the session; they are reported as
    /// issues. On cancellation the pages processed so far are still
    /// resolved, validated and assembled.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions: an empty taxonomy or an
    /// unusable seed or crawl policy.
    pub async fn run(&self, cancel: CancellationToken) -> Result<SessionReport, EngineError> {
        if self.taxonomy.is_empty() {
            return Err(TaxonomyError::Empty.into());
        }

        let start_time = Instant::now();
        let policy = self.config.crawl_policy().clone();
        let concurrency = policy.max_concurrency;
        info!(
            "Starting schema discovery at {} (depth {}, up to {} pages)",
            self.config.seed_url(),
            policy.max_depth,
            policy.max_pages
        );

        let mut crawler = Crawler::new(
            self.config.seed_url(),
            policy,
            Arc::clone(&self.fetcher),
            cancel.clone(),
        )?;
        let mut resolver = Resolver::new(self.config.resolution().merge_policy);
        let mut pipelines: FuturesUnordered<BoxFuture<'static, PageOutcome>> =
            FuturesUnordered::new();
        let mut pages: BTreeMap<u64, PageSummary> = BTreeMap::new();
        let mut issues: Vec<ValidationIssue> = Vec::new();
        let mut crawl_done = false;
        let mut cancelled = false;

        // Main loop: pull pages while pipeline slots are free
        loop {
            if crawl_done && pipelines.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                Some(outcome) = pipelines.next(), if !pipelines.is_empty() => {
                    self.absorb(outcome, &mut resolver, &mut pages, &mut issues);
                }
                page = crawler.next_page(), if !crawl_done && pipelines.len() < concurrency => {
                    match page {
                        Some(record) => {
                            self.progress.report_page_fetched(&record.url, &record.status);
                            pipelines.push(self.pipeline(record));
                        }
                        None => {
                            crawl_done = true;
                            cancelled = crawler.is_cancelled();
                        }
                    }
                }
            }
        }

        if cancelled {
            info!(
                "Session cancelled; dropping {} unfinished page pipelines",
                pipelines.len()
            );
        }
        drop(pipelines);

        let resolution = resolver.finalize();
        debug!(
            "Resolved {} entities across {} pages",
            resolution.graph.len(),
            pages.len()
        );
        issues.extend(resolution.issues);
        issues.extend(Validator::new(Arc::clone(&self.taxonomy)).validate(&resolution.graph));

        let max_traversal_depth = self.config.resolution().max_traversal_depth;
        for page in pages.values_mut() {
            page.entities = resolution
                .graph
                .roots_for(&page.url)
                .iter()
                .flat_map(|root| resolution.graph.reachable_from(root, max_traversal_depth))
                .collect::<BTreeSet<_>>()
                .len();
        }

        let assembler = Assembler::new(max_traversal_depth);
        let documents = pages
            .values()
            .filter(|page| page.status.is_success())
            .map(|page| assembler.assemble(&page.url, &resolution.graph))
            .collect();

        sort_issues(&mut issues);
        let pages: Vec<PageSummary> = pages.into_values().collect();
        self.progress.report_completed(pages.len(), cancelled);
        info!(
            "Schema discovery finished: {} pages, {} issues in {:?}",
            pages.len(),
            issues.len(),
            start_time.elapsed()
        );

        Ok(SessionReport {
            pages,
            documents,
            issues,
            cancelled,
        })
    }

    /// Extract embedded candidates, falling back to synthesis when there are none
    fn pipeline(&self, record: PageRecord) -> BoxFuture<'static, PageOutcome> {
        let synthesis = self.synthesis.clone();
        Box::pin(async move {
            let mut summary = PageSummary {
                url: record.url.clone(),
                depth: record.depth,
                sequence: record.sequence,
                status: record.status.clone(),
                origin: None,
                candidates: 0,
                entities: 0,
            };
            if !record.is_success() {
                return PageOutcome {
                    summary,
                    candidates: Vec::new(),
                    parse_issues: Vec::new(),
                    synthesis_error: None,
                };
            }

            let extracted = extract_with_issues(&record);
            let parse_issues = extracted.issues;
            let (candidates, synthesis_error) = if extracted.candidates.is_empty() {
                match synthesis.synthesize(&record).await {
                    Ok(candidate) => (vec![candidate], None),
                    Err(e) => (Vec::new(), Some(e)),
                }
            } else {
                (extracted.candidates, None)
            };

            summary.origin = candidates.first().map(|c| c.origin);
            summary.candidates = candidates.len();
            PageOutcome {
                summary,
                candidates,
                parse_issues,
                synthesis_error,
            }
        })
    }

    /// Fold one finished pipeline into the session state
    fn absorb(
        &self,
        outcome: PageOutcome,
        resolver: &mut Resolver,
        pages: &mut BTreeMap<u64, PageSummary>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let PageOutcome {
            summary,
            candidates,
            parse_issues,
            synthesis_error,
        } = outcome;
        let url = summary.url.as_str();

        match &summary.status {
            FetchStatus::Success { .. } => {}
            FetchStatus::HttpError { status } => issues.push(ValidationIssue::new(
                url,
                IssueCode::FetchFailed,
                format!("Fetch failed with HTTP {status}"),
            )),
            FetchStatus::NetworkError { message } => issues.push(ValidationIssue::new(
                url,
                IssueCode::FetchFailed,
                format!("Fetch failed: {message}"),
            )),
            FetchStatus::UnsupportedContent { content_type } => {
                debug!("Skipped {url}: unsupported content type '{content_type}'");
            }
        }

        for issue in parse_issues {
            issues.push(ValidationIssue::new(
                url,
                IssueCode::ParseError,
                format!("Structured-data block {}: {}", issue.block_index, issue.message),
            ));
        }

        if let Some(e) = synthesis_error {
            warn!("Page {url} left unschematized: {e}");
            self.progress.report_page_unschematized(url, &e.to_string());
            issues.push(ValidationIssue::new(
                url,
                IssueCode::SynthesisFailed,
                format!("No embedded structured data and synthesis failed: {e}"),
            ));
        }

        if let Some(origin) = summary.origin {
            if !origin.is_embedded() {
                debug!("Using synthesized schema for {url}");
            }
            self.progress
                .report_page_extracted(url, origin, candidates.len());
            resolver.add_candidates(&candidates);
        }

        pages.insert(summary.sequence, summary);
    }
}
