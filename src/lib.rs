pub mod assembler;
pub mod config;
pub mod content_saver;
pub mod crawl_engine;
pub mod page_extractor;
pub mod resolver;
pub mod synthesis;
pub mod taxonomy;
pub mod utils;
pub mod validator;

pub use assembler::{Assembler, CanonicalDocument, assemble};
pub use config::{CrawlPolicy, DiscoveryConfig, ResolutionOptions, SynthesisOptions};
pub use content_saver::{save_document, save_report};
pub use crawl_engine::{
    CrawlError, CrawlResult, Crawler, EngineError, FetchError, FetchResponse, Fetcher,
    HttpFetcher, NoOpProgress, PageSummary, ProgressReporter, SchemaDiscoveryEngine,
    SessionReport,
};
pub use page_extractor::schema::*;
pub use page_extractor::{extract, extract_with_issues, page_signals};
pub use resolver::{
    EntityGraph, EntityId, MergePolicy, PropertyValue, Resolution, Resolver, SchemaEntity,
    resolve,
};
pub use synthesis::{
    DisabledSynthesizer, OpenAiSynthesizer, SynthesisAdapter, SynthesisError, Synthesizer,
    synthesizer_from_env,
};
pub use taxonomy::{SCHEMA_ORG_VOCABULARY_URL, Taxonomy, TaxonomyError, default_cache_path};
pub use validator::{IssueCode, Severity, ValidationIssue, Validator, validate};

// Test-accessible modules
pub use crawl_engine::rate_limiter as crawl_rate_limiter;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run a discovery session over HTTP with the built-in taxonomy and the
/// synthesis backend configured in the environment.
///
/// # Errors
///
/// See [`SchemaDiscoveryEngine::run`].
pub async fn discover(config: DiscoveryConfig) -> Result<SessionReport, EngineError> {
    let synthesizer = synthesizer_from_env(config.synthesis());
    let taxonomy = Arc::new(Taxonomy::core()?);
    let engine = SchemaDiscoveryEngine::with_http(config, taxonomy, synthesizer)?;
    engine.run(CancellationToken::new()).await
}
