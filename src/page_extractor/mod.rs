//! Structured-data extraction from fetched pages.
//!
//! This module recovers raw schema candidates from a page's markup: JSON-LD
//! script blocks first, then microdata and RDFa Lite items. It also builds the
//! bounded signals handed to the synthesis backend when nothing is embedded.

// Sub-modules
mod inline_attributes;
mod json_ld;
pub mod schema;
pub mod signals;

use scraper::Html;

pub use schema::{
    CandidateOrigin, FetchStatus, PageRecord, PageSignals, ParseIssue, SchemaCandidate,
};
pub use signals::page_signals;

/// Candidates and non-fatal parse issues recovered from one page
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub candidates: Vec<SchemaCandidate>,
    pub issues: Vec<ParseIssue>,
}

impl ExtractionOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Extract every embedded structured-data candidate of a page.
///
/// An empty result means the page carries no structured data; it is the
/// trigger for synthesis, not an error. Failed fetches always yield nothing.
#[must_use]
pub fn extract(record: &PageRecord) -> Vec<SchemaCandidate> {
    extract_with_issues(record).candidates
}

/// Like [`extract`], also returning the blocks that failed to parse.
#[must_use]
pub fn extract_with_issues(record: &PageRecord) -> ExtractionOutcome {
    if !record.is_success() || record.markup.trim().is_empty() {
        return ExtractionOutcome::default();
    }

    let document = Html::parse_document(&record.markup);
    let (json_ld_trees, issues) = json_ld::extract_json_ld(&document, &record.url);
    let inline_trees = inline_attributes::extract_inline_items(&document, &record.url);

    let candidates = json_ld_trees
        .into_iter()
        .map(|tree| (CandidateOrigin::JsonLd, tree))
        .chain(
            inline_trees
                .into_iter()
                .map(|tree| (CandidateOrigin::InlineAttributes, tree)),
        )
        .enumerate()
        .map(|(index, (origin, tree))| {
            SchemaCandidate::new(record.url.clone(), origin, index, record.sequence, tree)
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Extracted {} candidates ({} parse issues) from {}",
        candidates.len(),
        issues.len(),
        record.url
    );

    ExtractionOutcome { candidates, issues }
}
