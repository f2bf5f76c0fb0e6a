//! Test utilities and helper functions for the schemascrape test suite

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use schemascrape::{
    CrawlPolicy, FetchError, FetchResponse, Fetcher, PageSignals, SynthesisError, Synthesizer,
    Taxonomy,
};

/// Creates a test HTML document with extra head markup and a body
#[allow(dead_code)]
pub fn html_page(title: &str, head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    {head}
</head>
<body>
    {body}
</body>
</html>"#
    )
}

/// A JSON-LD script block for `json`
#[allow(dead_code)]
pub fn json_ld(json: &Value) -> String {
    format!(r#"<script type="application/ld+json">{json}</script>"#)
}

/// Anchor tags for each href
#[allow(dead_code)]
pub fn links(hrefs: &[&str]) -> String {
    hrefs
        .iter()
        .map(|href| format!(r#"<a href="{href}">{href}</a>"#))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Crawl policy without rate limiting or retries, for fast tests
#[allow(dead_code)]
pub fn fast_policy(max_depth: u8, max_pages: usize, max_concurrency: usize) -> CrawlPolicy {
    CrawlPolicy {
        max_depth,
        max_pages,
        max_concurrency,
        per_domain_interval_ms: 0,
        max_fetch_retries: 0,
        retry_backoff_ms: 1,
        excluded_paths: Vec::new(),
        ..CrawlPolicy::default()
    }
}

#[allow(dead_code)]
pub fn core_taxonomy() -> Arc<Taxonomy> {
    Arc::new(Taxonomy::core().expect("built-in taxonomy loads"))
}

#[derive(Debug, Clone)]
struct StaticPage {
    status: u16,
    body: String,
    content_type: Option<String>,
}

/// In-memory site: a fixed map of URL to response, with optional per-URL
/// delays so tests can force arbitrary completion orders.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, StaticPage>,
    delays: HashMap<String, Duration>,
    fetches: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

#[allow(dead_code)]
impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` as HTML at `url`
    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(
            url.to_string(),
            StaticPage {
                status: 200,
                body: body.into(),
                content_type: Some("text/html; charset=utf-8".into()),
            },
        );
        self
    }

    /// Serve an HTML page containing only links to `hrefs`
    pub fn link_page(self, url: &str, hrefs: &[&str]) -> Self {
        let body = html_page(url, "", &links(hrefs));
        self.page(url, body)
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(
            url.to_string(),
            StaticPage {
                status,
                body: String::new(),
                content_type: Some("text/html".into()),
            },
        );
        self
    }

    pub fn content(mut self, url: &str, content_type: &str, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            StaticPage {
                status: 200,
                body: body.to_string(),
                content_type: Some(content_type.to_string()),
            },
        );
        self
    }

    pub fn delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// Number of fetches issued for one URL
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches
            .lock()
            .expect("fetch log lock")
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Every URL fetched at least once
    pub fn fetched_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .fetches
            .lock()
            .expect("fetch log lock")
            .keys()
            .cloned()
            .collect();
        urls.sort();
        urls
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        {
            let mut log = self.fetches.lock().expect("fetch log lock");
            *log.entry(url.to_string()).or_insert(0) += 1;
        }
        self.total.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        match self.pages.get(url) {
            Some(page) => Ok(FetchResponse {
                status: page.status,
                body: page.body.clone(),
                content_type: page.content_type.clone(),
            }),
            None => Ok(FetchResponse {
                status: 404,
                body: String::new(),
                content_type: Some("text/html".into()),
            }),
        }
    }
}

/// Synthesis backend with a fixed answer that records every call
#[derive(Debug)]
pub struct ScriptedSynthesizer {
    answer: Result<Value, SynthesisError>,
    calls: AtomicUsize,
    seen: Mutex<Vec<PageSignals>>,
}

#[allow(dead_code)]
impl ScriptedSynthesizer {
    pub fn succeeding(tree: Value) -> Self {
        Self {
            answer: Ok(tree),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: SynthesisError) -> Self {
        Self {
            answer: Err(error),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_signals(&self) -> Vec<PageSignals> {
        self.seen.lock().expect("signal log lock").clone()
    }
}

#[async_trait]
impl Synthesizer for ScriptedSynthesizer {
    async fn generate(&self, signals: &PageSignals) -> Result<Value, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .expect("signal log lock")
            .push(signals.clone());
        self.answer.clone()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
