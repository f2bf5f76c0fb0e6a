//! URL and path manipulation utilities.
//!
//! Normalization here defines page identity for the whole crawl session: two
//! links that normalize to the same string are the same page.

use anyhow::{Result, anyhow};
use std::path::PathBuf;
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

/// Query parameters that only carry tracking information
fn is_tracking_param(name: &str) -> bool {
    name.starts_with("utm_") || name == "fbclid" || name == "gclid"
}

/// Normalize an absolute http(s) URL into its crawl identity.
///
/// - fragment removed
/// - tracking query params (`utm_*`, `fbclid`, `gclid`) removed, empty query dropped
/// - default ports removed (handled by the `url` parser)
/// - trailing slash removed from every path except the root
///
/// # Errors
///
/// Returns an error when the input does not parse or is not http(s).
pub fn normalize_url(input: &str) -> Result<String> {
    let mut parsed = Url::parse(input.trim()).map_err(|e| anyhow!("Failed to parse URL '{input}': {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!("Unsupported URL scheme '{}' in {input}", parsed.scheme()));
    }
    if parsed.host_str().is_none() {
        return Err(anyhow!("URL has no host: {input}"));
    }

    parsed.set_fragment(None);

    if parsed.query().is_some() {
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let kept: Vec<&(String, String)> =
            pairs.iter().filter(|(k, _)| !is_tracking_param(k)).collect();
        if kept.is_empty() {
            parsed.set_query(None);
        } else if kept.len() != pairs.len() {
            parsed
                .query_pairs_mut()
                .clear()
                .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    Ok(parsed.to_string())
}

/// Resolve an `href` found on a page against its base and normalize it.
///
/// Returns `None` for non-navigational links (`javascript:`, `mailto:`, `tel:`,
/// `data:`), pure fragments and anything that fails normalization.
#[must_use]
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }
    let joined = base.join(href).ok()?;
    normalize_url(joined.as_str()).ok()
}

/// Extract the registrable-ish domain of a URL: lowercase host without a
/// leading `www.` and without port.
#[inline]
#[must_use]
pub fn extract_domain(url: &str) -> Option<String> {
    let after_scheme = match url.find("://") {
        Some(scheme_end) => &url[scheme_end + 3..],
        None => url,
    };
    let host_end = after_scheme
        .find(['/', '?', '#', ':'])
        .unwrap_or(after_scheme.len());
    let host = &after_scheme[..host_end];
    // userinfo is never part of the domain
    let host = host.rsplit('@').next().unwrap_or(host);
    let normalized = host.strip_prefix("www.").filter(|h| !h.is_empty()).unwrap_or(host);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_lowercase())
    }
}


/// Relative storage path hint for a page's canonical document.
///
/// Mirrors the site layout: `<host>/<segments...>/<last segment without
/// extension>/schema.json`, with the root page stored as
/// `<host>/index/schema.json`. A query string adds a short hash to the last
/// component (`list-1a2b3c4d`) so pages that differ only by query do not
/// share a file.
///
/// # Errors
///
/// Returns an error if the URL does not parse or has no host.
pub fn storage_path_for(url: &str) -> Result<PathBuf> {
    let parsed = Url::parse(url).map_err(|e| anyhow!("Failed to parse URL: {e}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Invalid URL: no host"))?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty() && *s != "." && *s != "..").collect())
        .unwrap_or_default();

    let mut path = PathBuf::from(host);
    let stem = match segments.split_last() {
        None => "index",
        Some((last, parents)) => {
            for segment in parents {
                path.push(segment);
            }
            last.split('.').next().filter(|s| !s.is_empty()).unwrap_or(last)
        }
    };
    match parsed.query().filter(|q| !q.is_empty()) {
        Some(query) => path.push(format!("{stem}-{:08x}", xxh3_64(query.as_bytes()) as u32)),
        None => path.push(stem),
    }
    path.push("schema.json");
    Ok(path)
}
