//! Loading configuration from a JSON file and the environment
//!
//! File values override defaults and environment values override both.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use super::types::{CrawlPolicy, DiscoveryConfig, ResolutionOptions, SynthesisOptions};

/// On-disk layout; every section and field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    crawl: CrawlPolicy,
    synthesis: SynthesisOptions,
    resolution: ResolutionOptions,
}

impl DiscoveryConfig {
    /// Load a config from an optional JSON file plus process environment.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, an environment override is
    /// not a valid value, or the resulting config does not validate.
    pub fn load(path: Option<&Path>, seed_url: &str) -> Result<Self> {
        Self::load_with_env(path, seed_url, |key| std::env::var(key).ok())
    }

    /// Same as [`DiscoveryConfig::load`] with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryConfig::load`].
    pub fn load_with_env<F>(path: Option<&Path>, seed_url: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut file = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str::<ConfigFile>(&raw)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => ConfigFile::default(),
        };

        apply_env(&mut file, &env)?;

        DiscoveryConfig::builder()
            .seed_url(seed_url)
            .crawl_policy(file.crawl)
            .synthesis_options(file.synthesis)
            .resolution_options(file.resolution)
            .build()
    }
}

fn apply_env<F>(file: &mut ConfigFile, env: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(pages) = parse_env::<usize, _>(env, "MAX_PAGES")? {
        file.crawl.max_pages = pages;
    }
    if let Some(depth) = parse_env::<u8, _>(env, "MAX_DEPTH")? {
        file.crawl.max_depth = depth;
    }
    if let Some(concurrency) = parse_env::<usize, _>(env, "MAX_CONCURRENCY")? {
        file.crawl.max_concurrency = concurrency;
    }
    if let Some(interval) = parse_env::<u64, _>(env, "PER_DOMAIN_INTERVAL_MS")? {
        file.crawl.per_domain_interval_ms = interval;
    }
    if let Some(agent) = env("USER_AGENT").filter(|v| !v.trim().is_empty()) {
        file.crawl.user_agent = agent;
    }
    if let Some(model) = env("AI_MODEL").filter(|v| !v.trim().is_empty()) {
        file.synthesis.model = model;
    }
    Ok(())
}

fn parse_env<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match env(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid value for {key} ('{raw}'): {e}")),
    }
}
