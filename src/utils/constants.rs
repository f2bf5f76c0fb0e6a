//! Shared configuration constants for schemascrape
//!
//! Default values used throughout the codebase to ensure consistency and
//! avoid magic numbers.

/// Default maximum crawl depth: 3 levels below the seed page
pub const DEFAULT_MAX_DEPTH: u8 = 3;

/// Default page budget for one crawl session
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Default number of concurrently in-flight fetch and synthesis operations
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Default spacing between two requests to the same domain (1 request per second)
pub const DEFAULT_PER_DOMAIN_INTERVAL_MS: u64 = 1_000;

/// Retries for network errors, HTTP 429 and 5xx responses
pub const DEFAULT_MAX_FETCH_RETRIES: u8 = 2;

/// Base delay for exponential fetch backoff
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

/// Upper bound on any single backoff sleep
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Per-request timeout for page fetches
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_USER_AGENT: &str = "SchemaScrape/1.0";

/// Paths that are almost never worth crawling for structured data
pub const DEFAULT_EXCLUDED_PATHS: &[&str] =
    &["/admin", "/login", "/logout", "/api/", "/static/", "/assets/"];

/// Synthesis retries after the first attempt (0 = call the backend exactly once)
pub const DEFAULT_SYNTHESIS_RETRIES: u8 = 0;

pub const DEFAULT_SYNTHESIS_BACKOFF_MS: u64 = 500;

/// Cap on the visible-text excerpt handed to the synthesis backend
pub const DEFAULT_MAX_SIGNAL_CHARS: usize = 4_000;

pub const MAX_TITLE_CHARS: usize = 300;

pub const MAX_DESCRIPTION_CHARS: usize = 1_000;

pub const DEFAULT_SYNTHESIS_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_SYNTHESIS_API_BASE: &str = "https://api.openai.com/v1";

/// Depth bound shared by every entity graph traversal
pub const DEFAULT_MAX_TRAVERSAL_DEPTH: usize = 8;

/// Maximum DOM nesting the structured-data walkers will descend into
pub const MAX_DOM_DEPTH: usize = 100;

/// Context emitted at the top of every canonical document
pub const SCHEMA_ORG_CONTEXT: &str = "https://schema.org";
