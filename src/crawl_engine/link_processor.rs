//! Link discovery and filtering
//!
//! This module extracts links from fetched markup and decides which of them
//! may enter the crawl frontier.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::crawl_types::CrawlError;
use crate::config::compile_glob_pattern;
use crate::utils::{extract_domain, resolve_link};

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

static BASE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("base[href]").expect("BUG: hardcoded CSS selector 'base[href]' is invalid")
});

/// Extract normalized absolute links from a page, in document order.
///
/// Relative links resolve against `<base href>` when present, else the page
/// URL. Duplicates are kept; the frontier dedups.
#[must_use]
pub fn extract_links(markup: &str, page_url: &str) -> Vec<String> {
    let Ok(page) = Url::parse(page_url) else {
        return Vec::new();
    };
    let document = Html::parse_document(markup);

    let base = document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| page.join(href.trim()).ok())
        .unwrap_or(page);

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve_link(&base, href))
        .collect()
}

/// One excluded-path rule
#[derive(Debug, Clone)]
enum ExclusionRule {
    /// Substring of the URL path
    PathContains(String),
    /// Anchored glob over the full URL
    Glob(Regex),
}

/// Frontier admission rules derived from the crawl policy
#[derive(Debug, Clone)]
pub struct LinkFilter {
    seed_domain: String,
    same_domain_only: bool,
    exclusions: Vec<ExclusionRule>,
}

impl LinkFilter {
    /// # Errors
    ///
    /// Returns [`CrawlError::InvalidPolicy`] if a glob pattern does not compile,
    /// and [`CrawlError::InvalidSeed`] if the seed has no domain.
    pub fn new(
        seed_url: &str,
        same_domain_only: bool,
        excluded_paths: &[String],
    ) -> Result<Self, CrawlError> {
        let seed_domain = extract_domain(seed_url).ok_or_else(|| CrawlError::InvalidSeed {
            url: seed_url.to_string(),
            reason: "no host".into(),
        })?;

        let exclusions = excluded_paths
            .iter()
            .map(|pattern| {
                if pattern.contains('*') {
                    compile_glob_pattern(pattern)
                        .map(ExclusionRule::Glob)
                        .map_err(|e| CrawlError::InvalidPolicy(format!("{e:#}")))
                } else {
                    Ok(ExclusionRule::PathContains(pattern.clone()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            seed_domain,
            same_domain_only,
            exclusions,
        })
    }

    /// Whether a normalized link may be enqueued
    #[must_use]
    pub fn allows(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        if self.same_domain_only
            && extract_domain(url).is_none_or(|domain| domain != self.seed_domain)
        {
            log::debug!(target: "schemascrape::links", "Off-site link skipped: {url}");
            return false;
        }

        let path = parsed.path();
        let excluded = self.exclusions.iter().any(|rule| match rule {
            ExclusionRule::PathContains(fragment) => path.contains(fragment.as_str()),
            ExclusionRule::Glob(regex) => regex.is_match(url),
        });
        if excluded {
            log::debug!(target: "schemascrape::links", "Excluded link skipped: {url}");
        }
        !excluded
    }

    /// Filter and log the links of one page
    #[must_use]
    pub fn filter(&self, page_url: &str, links: Vec<String>) -> Vec<String> {
        let found = links.len();
        let kept: Vec<String> = links.into_iter().filter(|link| self.allows(link)).collect();
        log::debug!(
            target: "schemascrape::links",
            "Found {found} links on {page_url}, {} after filtering",
            kept.len()
        );
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_resolve_against_base_href() {
        let markup = r#"<html><head><base href="https://example.com/docs/"></head>
            <body><a href="intro">Intro</a><a href="/about#team">About</a>
            <a href="mailto:x@example.com">Mail</a></body></html>"#;
        let links = extract_links(markup, "https://example.com/docs/index.html");
        assert_eq!(
            links,
            vec!["https://example.com/docs/intro", "https://example.com/about"]
        );
    }

    #[test]
    fn filter_applies_domain_and_exclusions() {
        let filter = LinkFilter::new(
            "https://www.example.com/",
            true,
            &["/admin".to_string(), "https://example.com/private/*".to_string()],
        )
        .unwrap();
        assert!(filter.allows("https://example.com/blog"));
        assert!(!filter.allows("https://other.org/blog"));
        assert!(!filter.allows("https://example.com/admin/users"));
        assert!(!filter.allows("https://example.com/private/x"));
    }

    #[test]
    fn cross_domain_allowed_when_not_restricted() {
        let filter = LinkFilter::new("https://example.com/", false, &[]).unwrap();
        assert!(filter.allows("https://other.org/blog"));
    }
}
