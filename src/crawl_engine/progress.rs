//! Progress reporting abstraction for discovery sessions
//!
//! Defines the `ProgressReporter` trait for lifecycle event reporting
//! and provides a no-op implementation for simple use cases.

use crate::page_extractor::{CandidateOrigin, FetchStatus};

/// Trait for reporting session progress at key lifecycle events
///
/// Implementations can send updates to channels, log to console, update UI, etc.
pub trait ProgressReporter: Send + Sync {
    /// A page was fetched (successfully or not)
    fn report_page_fetched(&self, url: &str, status: &FetchStatus);

    /// Candidates were obtained for a page, embedded or synthesized
    fn report_page_extracted(&self, url: &str, origin: CandidateOrigin, candidates: usize);

    /// Nothing was embedded and synthesis failed
    fn report_page_unschematized(&self, url: &str, reason: &str);

    /// The session finished (completed or cancelled)
    fn report_completed(&self, pages: usize, cancelled: bool);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_page_fetched(&self, _url: &str, _status: &FetchStatus) {}

    #[inline(always)]
    fn report_page_extracted(&self, _url: &str, _origin: CandidateOrigin, _candidates: usize) {}

    #[inline(always)]
    fn report_page_unschematized(&self, _url: &str, _reason: &str) {}

    #[inline(always)]
    fn report_completed(&self, _pages: usize, _cancelled: bool) {}
}
