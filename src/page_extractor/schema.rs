use serde::{Deserialize, Serialize};

/// Outcome of fetching one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchStatus {
    /// 2xx response with HTML markup
    Success { status: u16 },
    /// Non-success HTTP status after retries were exhausted
    HttpError { status: u16 },
    /// Transport failure after retries were exhausted
    NetworkError { message: String },
    /// Successful response that is not HTML (PDF, image, feed, ...)
    UnsupportedContent { content_type: String },
}

impl FetchStatus {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One fetched page. Immutable once the crawler has produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Normalized absolute URL, the page identity
    pub url: String,
    pub depth: u8,
    /// Dispatch order within the session (0 = seed). Deterministic for a
    /// fixed seed and link graph, used to rank writers during merges.
    pub sequence: u64,
    pub markup: String,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
    pub status: FetchStatus,
}

impl PageRecord {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    /// `application/ld+json` script block
    JsonLd,
    /// Microdata or RDFa attributes inline in the markup
    InlineAttributes,
    /// Generated by the synthesis backend
    Synthesized,
}

impl CandidateOrigin {
    #[must_use]
    pub fn is_embedded(self) -> bool {
        !matches!(self, Self::Synthesized)
    }
}

/// A raw, untyped structured-data tree recovered from one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaCandidate {
    pub source_url: String,
    pub origin: CandidateOrigin,
    /// Position of this candidate among the page's candidates
    pub index: usize,
    /// Crawl sequence of the source page
    pub page_sequence: u64,
    pub tree: serde_json::Value,
}

impl SchemaCandidate {
    #[must_use]
    pub fn new(
        source_url: impl Into<String>,
        origin: CandidateOrigin,
        index: usize,
        page_sequence: u64,
        tree: serde_json::Value,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            origin,
            index,
            page_sequence,
            tree,
        }
    }
}

/// A structured-data block that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub page_url: String,
    /// Index of the offending block among blocks of the same kind
    pub block_index: usize,
    pub message: String,
}

/// Bounded excerpt of a page handed to the synthesis backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSignals {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub text_excerpt: String,
}

impl PageSignals {
    /// Total characters carried by the signals
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.url.chars().count()
            + self.title.chars().count()
            + self.description.as_deref().map_or(0, |d| d.chars().count())
            + self.text_excerpt.chars().count()
    }
}
