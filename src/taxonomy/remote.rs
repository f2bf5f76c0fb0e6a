//! Remote schema.org vocabulary with an on-disk cache.
//!
//! The published vocabulary is large and changes rarely, so it is fetched
//! once and read from the cache file afterwards. A cache that cannot be read
//! or parsed is refetched. A response is written to the cache only after it
//! parses into a valid taxonomy.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Taxonomy, TaxonomyError};

/// Latest published schema.org vocabulary (JSON-LD, https IRIs)
pub const SCHEMA_ORG_VOCABULARY_URL: &str =
    "https://schema.org/version/latest/schemaorg-current-https.jsonld";

const CACHE_FILE_NAME: &str = "schema_org.jsonld";

/// Where the vocabulary is cached when no path is given:
/// `<user cache dir>/schemascrape/schema_org.jsonld`
#[must_use]
pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("schemascrape").join(CACHE_FILE_NAME))
}

impl Taxonomy {
    /// Load the vocabulary at `url`, preferring a cached copy.
    ///
    /// With `cache_path` set, a readable and valid cache is used without any
    /// request, and a freshly fetched vocabulary is written there. Failing to
    /// write the cache only logs a warning.
    ///
    /// # Errors
    ///
    /// [`TaxonomyError::Fetch`] when the request fails or returns a
    /// non-success status; the usual snapshot errors when the body is not a
    /// valid vocabulary.
    pub async fn fetch_cached(
        url: &str,
        cache_path: Option<&Path>,
        timeout: Duration,
    ) -> Result<Self, TaxonomyError> {
        if let Some(path) = cache_path {
            match tokio::fs::read_to_string(path).await {
                Ok(text) => match Self::from_json_str(&text) {
                    Ok(taxonomy) => {
                        log::info!(
                            "Loaded {} schema.org types from cache {}",
                            taxonomy.len(),
                            path.display()
                        );
                        return Ok(taxonomy);
                    }
                    Err(e) => log::warn!("Ignoring invalid taxonomy cache {}: {e}", path.display()),
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to read taxonomy cache {}: {e}", path.display()),
            }
        }

        let text = fetch_vocabulary(url, timeout).await?;
        let taxonomy = Self::from_json_str(&text)?;
        log::info!("Fetched {} schema.org types from {url}", taxonomy.len());

        if let Some(path) = cache_path {
            if let Err(e) = write_cache(path, &text).await {
                log::warn!("Failed to cache taxonomy at {}: {e}", path.display());
            }
        }
        Ok(taxonomy)
    }
}

async fn fetch_vocabulary(url: &str, timeout: Duration) -> Result<String, TaxonomyError> {
    let fetch_error = |message: String| TaxonomyError::Fetch {
        url: url.to_string(),
        message,
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| fetch_error(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {}", status.as_u16())));
    }
    response.text().await.map_err(|e| fetch_error(e.to_string()))
}

async fn write_cache(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await
}
