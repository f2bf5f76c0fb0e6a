//! `application/ld+json` script block extraction

use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::schema::ParseIssue;

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type]").expect("BUG: hardcoded CSS selector 'script[type]' is invalid")
});

fn is_json_ld_type(type_attr: &str) -> bool {
    type_attr
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/ld+json"))
}

/// Strip the wrappers CMSes like to put around inline JSON
fn unwrap_block(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(inner) = text.strip_prefix("<!--") {
        text = inner.strip_suffix("-->").unwrap_or(inner).trim();
    }
    if let Some(inner) = text.strip_prefix("//<![CDATA[").or_else(|| text.strip_prefix("<![CDATA[")) {
        let inner = inner.trim_end();
        text = inner
            .strip_suffix("//]]>")
            .or_else(|| inner.strip_suffix("]]>"))
            .unwrap_or(inner)
            .trim();
    }
    text.strip_suffix(';').map_or(text, str::trim_end)
}

/// Parse every JSON-LD block of a document independently.
///
/// A malformed block becomes a [`ParseIssue`] and is skipped; the remaining
/// blocks are still returned. Empty blocks are ignored.
pub(crate) fn extract_json_ld(
    document: &Html,
    page_url: &str,
) -> (Vec<serde_json::Value>, Vec<ParseIssue>) {
    let mut trees = Vec::new();
    let mut issues = Vec::new();

    let blocks = document
        .select(&SCRIPT_SELECTOR)
        .filter(|el| el.value().attr("type").is_some_and(is_json_ld_type));

    for (block_index, script) in blocks.enumerate() {
        let raw: String = script.text().collect();
        let body = unwrap_block(&raw);
        if body.is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) if value.is_object() || value.is_array() => trees.push(value),
            Ok(other) => issues.push(ParseIssue {
                page_url: page_url.to_string(),
                block_index,
                message: format!("JSON-LD block is not an object or array: {other}"),
            }),
            Err(e) => {
                log::warn!("Malformed JSON-LD block {block_index} on {page_url}: {e}");
                issues.push(ParseIssue {
                    page_url: page_url.to_string(),
                    block_index,
                    message: format!("Malformed JSON-LD: {e}"),
                });
            }
        }
    }

    (trees, issues)
}
