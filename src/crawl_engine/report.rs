//! Session report types

use serde::{Deserialize, Serialize};

use crate::assembler::CanonicalDocument;
use crate::page_extractor::{CandidateOrigin, FetchStatus};
use crate::validator::ValidationIssue;

/// What happened to one crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub depth: u8,
    pub sequence: u64,
    pub status: FetchStatus,
    /// Where the page's candidates came from; `None` when it has none
    pub origin: Option<CandidateOrigin>,
    pub candidates: usize,
    /// Resolved entities reachable from the page's roots
    #[serde(default)]
    pub entities: usize,
}

impl PageSummary {
    /// Fetched successfully but left without any candidate
    #[must_use]
    pub fn is_unschematized(&self) -> bool {
        self.status.is_success() && self.candidates == 0
    }
}

/// Result of one discovery session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Processed pages in crawl sequence order
    pub pages: Vec<PageSummary>,
    /// One document per successfully fetched page, in crawl sequence order
    pub documents: Vec<CanonicalDocument>,
    /// Every non-fatal condition, sorted by subject, code and message
    pub issues: Vec<ValidationIssue>,
    /// The session stopped early because it was cancelled
    pub cancelled: bool,
}

impl SessionReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    /// Documents with at least one root entity
    pub fn non_empty_documents(&self) -> impl Iterator<Item = &CanonicalDocument> {
        self.documents.iter().filter(|d| !d.is_empty())
    }

    #[must_use]
    pub fn document_for(&self, page_url: &str) -> Option<&CanonicalDocument> {
        self.documents.iter().find(|d| d.page_url == page_url)
    }
}
