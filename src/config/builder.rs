//! Type-safe builder for `DiscoveryConfig` using the typestate pattern
//!
//! The seed URL is the only required field; `build()` exists only once it
//! has been set.

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use std::marker::PhantomData;

use super::types::{CrawlPolicy, DiscoveryConfig, ResolutionOptions, SynthesisOptions};
use crate::utils::normalize_url;

/// Compile a glob pattern into an anchored regex
///
/// `*` matches any sequence; every other character matches literally.
///
/// # Errors
///
/// Returns an error if the resulting regex pattern is invalid.
pub fn compile_glob_pattern(pattern: &str) -> Result<Regex> {
    let regex_pattern = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    let anchored = format!("^{regex_pattern}$");
    Regex::new(&anchored).map_err(|e| anyhow!("Invalid glob pattern '{pattern}': {e}"))
}

// Type states for the builder
pub struct WithSeedUrl;

pub struct DiscoveryConfigBuilder<State = ()> {
    pub(crate) seed_url: Option<String>,
    pub(crate) crawl: CrawlPolicy,
    pub(crate) synthesis: SynthesisOptions,
    pub(crate) resolution: ResolutionOptions,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for DiscoveryConfigBuilder<()> {
    fn default() -> Self {
        Self {
            seed_url: None,
            crawl: CrawlPolicy::default(),
            synthesis: SynthesisOptions::default(),
            resolution: ResolutionOptions::default(),
            _phantom: PhantomData,
        }
    }
}

impl DiscoveryConfig {
    /// Create a builder for configuring a `DiscoveryConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> DiscoveryConfigBuilder<()> {
        DiscoveryConfigBuilder::default()
    }
}

impl DiscoveryConfigBuilder<()> {
    pub fn seed_url(self, url: impl Into<String>) -> DiscoveryConfigBuilder<WithSeedUrl> {
        let url_string = url.into().trim().to_string();

        // add https:// if no scheme is present
        let with_scheme = if url_string.contains("://") {
            url_string
        } else {
            format!("https://{url_string}")
        };

        DiscoveryConfigBuilder {
            seed_url: Some(with_scheme),
            crawl: self.crawl,
            synthesis: self.synthesis,
            resolution: self.resolution,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when the seed is set
impl DiscoveryConfigBuilder<WithSeedUrl> {
    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Fails if the seed is not an absolute http(s) URL, the crawl policy is
    /// invalid, or an excluded path glob does not compile.
    pub fn build(self) -> Result<DiscoveryConfig> {
        let raw_seed = self
            .seed_url
            .ok_or_else(|| anyhow!("seed_url is required"))?;
        let seed_url = normalize_url(&raw_seed).context("Invalid seed URL")?;

        self.crawl.validate()?;

        // compile once here so bad patterns fail before the session starts
        for pattern in self.crawl.excluded_paths.iter().filter(|p| p.contains('*')) {
            compile_glob_pattern(pattern)?;
        }

        if self.resolution.max_traversal_depth == 0 {
            return Err(anyhow!("max_traversal_depth must be at least 1"));
        }

        Ok(DiscoveryConfig {
            seed_url,
            crawl: self.crawl,
            synthesis: self.synthesis,
            resolution: self.resolution,
        })
    }
}
