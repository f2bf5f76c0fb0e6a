//! Microdata and RDFa Lite extraction
//!
//! Both syntaxes describe items with attributes on ordinary elements, so one
//! depth-bounded walker handles both, parameterized by attribute names.

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use url::Url;

use crate::utils::MAX_DOM_DEPTH;
use crate::utils::string_utils::{collapse_whitespace, local_type_name};

/// Attribute vocabulary of one inline syntax
struct Syntax {
    name: &'static str,
    /// Attribute marking an element as an item
    scope: &'static str,
    types: &'static str,
    id: &'static str,
    prop: &'static str,
}

const MICRODATA: Syntax = Syntax {
    name: "microdata",
    scope: "itemscope",
    types: "itemtype",
    id: "itemid",
    prop: "itemprop",
};

const RDFA_LITE: Syntax = Syntax {
    name: "rdfa",
    scope: "typeof",
    types: "typeof",
    id: "resource",
    prop: "property",
};

static MICRODATA_ROOTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemscope]:not([itemprop])")
        .expect("BUG: hardcoded CSS selector '[itemscope]:not([itemprop])' is invalid")
});

static RDFA_ROOTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[typeof]:not([property])")
        .expect("BUG: hardcoded CSS selector '[typeof]:not([property])' is invalid")
});

fn insert_property(obj: &mut Map<String, Value>, name: &str, value: Value) {
    match obj.get_mut(name) {
        None => {
            obj.insert(name.to_string(), value);
        }
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

fn resolve_attr_url(base: Option<&Url>, raw: &str) -> String {
    match base.and_then(|b| b.join(raw.trim()).ok()) {
        Some(url) => url.to_string(),
        None => raw.trim().to_string(),
    }
}

/// Literal value of a property-carrying element
fn property_value(el: ElementRef<'_>, base: Option<&Url>) -> Value {
    let element = el.value();
    let url_attr = match element.name() {
        "a" | "area" | "link" => Some("href"),
        "audio" | "embed" | "iframe" | "img" | "source" | "track" | "video" => Some("src"),
        "object" => Some("data"),
        _ => None,
    };
    if let Some(raw) = element.attr("content") {
        return Value::String(raw.trim().to_string());
    }
    if let Some(raw) = url_attr.and_then(|attr| element.attr(attr)) {
        return Value::String(resolve_attr_url(base, raw));
    }
    let explicit = match element.name() {
        "time" => element.attr("datetime"),
        "data" | "meter" => element.attr("value"),
        _ => None,
    };
    match explicit {
        Some(raw) => Value::String(raw.trim().to_string()),
        None => Value::String(collapse_whitespace(&el.text().collect::<String>())),
    }
}

struct Walker<'a> {
    syntax: &'a Syntax,
    base: Option<&'a Url>,
}

impl Walker<'_> {
    fn is_item(&self, el: ElementRef<'_>) -> bool {
        el.value().attr(self.syntax.scope).is_some()
    }

    fn property_names<'e>(&self, el: ElementRef<'e>) -> Vec<&'e str> {
        el.value()
            .attr(self.syntax.prop)
            .map(|props| props.split_whitespace().map(local_type_name).collect())
            .unwrap_or_default()
    }

    fn build_item(&self, el: ElementRef<'_>, depth: usize) -> Value {
        let mut obj = Map::new();

        let types: Vec<Value> = el
            .value()
            .attr(self.syntax.types)
            .map(|t| {
                t.split_whitespace()
                    .map(|name| Value::String(local_type_name(name).to_string()))
                    .collect()
            })
            .unwrap_or_default();
        match types.len() {
            0 => {}
            1 => {
                obj.insert("@type".into(), types.into_iter().next().unwrap_or(Value::Null));
            }
            _ => {
                obj.insert("@type".into(), Value::Array(types));
            }
        }
        if let Some(id) = el.value().attr(self.syntax.id) {
            obj.insert("@id".into(), Value::String(resolve_attr_url(self.base, id)));
        }

        self.collect_properties(el, &mut obj, depth + 1);
        Value::Object(obj)
    }

    fn collect_properties(&self, parent: ElementRef<'_>, obj: &mut Map<String, Value>, depth: usize) {
        if depth > MAX_DOM_DEPTH {
            log::warn!("{} walker hit depth limit {MAX_DOM_DEPTH}, truncating item", self.syntax.name);
            return;
        }
        for child in parent.children().filter_map(ElementRef::wrap) {
            let names = self.property_names(child);
            if self.is_item(child) {
                // unnamed nested items are top-level items of their own
                if !names.is_empty() {
                    let nested = self.build_item(child, depth);
                    for name in names {
                        insert_property(obj, name, nested.clone());
                    }
                }
                continue;
            }
            if !names.is_empty() {
                let value = property_value(child, self.base);
                for name in &names {
                    insert_property(obj, name, value.clone());
                }
            }
            self.collect_properties(child, obj, depth + 1);
        }
    }
}

fn extract_with(document: &Html, page_url: &str, syntax: &Syntax, roots: &Selector) -> Vec<Value> {
    let base = Url::parse(page_url).ok();
    let walker = Walker {
        syntax,
        base: base.as_ref(),
    };
    document
        .select(roots)
        .map(|el| walker.build_item(el, 0))
        .filter(|item| item.as_object().is_some_and(|o| !o.is_empty()))
        .collect()
}

/// Top-level microdata and RDFa Lite items of a document, in document order
pub(crate) fn extract_inline_items(document: &Html, page_url: &str) -> Vec<Value> {
    let mut items = extract_with(document, page_url, &MICRODATA, &MICRODATA_ROOTS);
    items.extend(extract_with(document, page_url, &RDFA_LITE, &RDFA_ROOTS));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn microdata_nested_items_and_repeated_props() {
        let html = Html::parse_document(
            r#"<div itemscope itemtype="https://schema.org/Person" itemid="https://example.com/#jane">
                 <span itemprop="name">Jane  Doe</span>
                 <a itemprop="sameAs" href="/jane">profile</a>
                 <a itemprop="sameAs" href="https://social.example/jane">social</a>
                 <div itemprop="worksFor" itemscope itemtype="https://schema.org/Organization">
                   <meta itemprop="name" content="Acme">
                 </div>
               </div>"#,
        );
        let items = extract_inline_items(&html, "https://example.com/team");
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0],
            json!({
                "@type": "Person",
                "@id": "https://example.com/#jane",
                "name": "Jane Doe",
                "sameAs": ["https://example.com/jane", "https://social.example/jane"],
                "worksFor": {"@type": "Organization", "name": "Acme"}
            })
        );
    }

    #[test]
    fn rdfa_lite_items_are_found() {
        let html = Html::parse_document(
            r#"<div vocab="https://schema.org/" typeof="Product">
                 <span property="name">Widget</span>
                 <time property="releaseDate" datetime="2024-01-01">Jan 1</time>
               </div>"#,
        );
        let items = extract_inline_items(&html, "https://example.com/p");
        assert_eq!(
            items,
            vec![json!({"@type": "Product", "name": "Widget", "releaseDate": "2024-01-01"})]
        );
    }
}
