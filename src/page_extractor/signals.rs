//! Bounded page excerpt for the synthesis backend.
//!
//! Only the title, the meta description and a capped slice of visible text
//! ever leave the engine; the full markup never does.

use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

use super::schema::{PageRecord, PageSignals};
use crate::utils::string_utils::bounded_text;
use crate::utils::{MAX_DESCRIPTION_CHARS, MAX_DOM_DEPTH, MAX_TITLE_CHARS};

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector 'title' is invalid")
});

static META_DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"], meta[name="Description"]"#)
        .expect("BUG: hardcoded CSS selector for meta description is invalid")
});

static OG_DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:description"]"#)
        .expect("BUG: hardcoded CSS selector for og:description is invalid")
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("BUG: hardcoded CSS selector 'body' is invalid")
});

const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(|content| bounded_text(content, MAX_DESCRIPTION_CHARS))
        .find(|content| !content.is_empty())
}

/// Append visible text under `el` to `out` until roughly `budget` bytes are
/// collected.
fn collect_visible_text(el: ElementRef<'_>, out: &mut String, budget: usize, depth: usize) {
    if depth > MAX_DOM_DEPTH || out.len() >= budget {
        return;
    }
    for child in el.children() {
        if out.len() >= budget {
            return;
        }
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(element) if INVISIBLE_TAGS.contains(&element.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_visible_text(child_el, out, budget, depth + 1);
                }
            }
            _ => {}
        }
    }
}

/// Build the bounded synthesis input for a page.
///
/// `max_signal_chars` caps the visible-text excerpt; title and description
/// have their own fixed caps.
#[must_use]
pub fn page_signals(record: &PageRecord, max_signal_chars: usize) -> PageSignals {
    let document = Html::parse_document(&record.markup);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| bounded_text(&el.text().collect::<String>(), MAX_TITLE_CHARS))
        .unwrap_or_default();

    let description = meta_content(&document, &META_DESCRIPTION_SELECTOR)
        .or_else(|| meta_content(&document, &OG_DESCRIPTION_SELECTOR));

    // 4 bytes per char upper bound, plus slack for the collapsed separators
    let byte_budget = max_signal_chars.saturating_mul(4).saturating_add(64);
    let mut raw_text = String::new();
    match document.select(&BODY_SELECTOR).next() {
        Some(body) => collect_visible_text(body, &mut raw_text, byte_budget, 0),
        None => collect_visible_text(document.root_element(), &mut raw_text, byte_budget, 0),
    }

    PageSignals {
        url: record.url.clone(),
        title,
        description,
        text_excerpt: bounded_text(&raw_text, max_signal_chars),
    }
}
