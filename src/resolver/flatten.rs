//! Flattening of raw candidate trees into per-entity claims.
//!
//! Every node object in a tree becomes one [`EntityClaim`]; nested objects
//! are replaced by references to their own claim. Identifiers come from
//! `@id` when present, otherwise from a hash of the page URL, candidate index
//! and the node's structural path, so unidentified nodes never collapse into
//! each other even when structurally identical.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use xxhash_rust::xxh3::xxh3_64;

use super::entity::{EntityId, PropertyValue};
use crate::page_extractor::SchemaCandidate;

/// Total order of writers used to resolve merge conflicts independently of
/// the order in which pages finish.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WriterKey {
    pub page_sequence: u64,
    pub page_url: String,
    pub candidate_index: usize,
    /// Pre-order position of the node within its candidate tree
    pub position: usize,
}

/// What one node of one candidate asserts about an entity
#[derive(Debug, Clone)]
pub(crate) struct EntityClaim {
    pub id: EntityId,
    pub types: Vec<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub writer: WriterKey,
}

#[derive(Debug, Default)]
pub(crate) struct FlattenedCandidate {
    pub claims: Vec<EntityClaim>,
    pub roots: Vec<EntityId>,
}

/// Strip schema.org namespaces from a type or property name
pub(crate) fn strip_vocab_prefix(name: &str) -> &str {
    ["https://schema.org/", "http://schema.org/", "schema:"]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
}

fn hex_id(parts: &[&str]) -> EntityId {
    let joined = parts.join("\u{0}");
    EntityId::new(format!("_:{:016x}", xxh3_64(joined.as_bytes())))
}

struct Flattener<'a> {
    candidate: &'a SchemaCandidate,
    position: usize,
    out: FlattenedCandidate,
}

impl Flattener<'_> {
    fn explicit_id(&self, raw: &str) -> EntityId {
        if raw.starts_with("_:") {
            // blank node labels only mean something within their page
            hex_id(&["blank", &self.candidate.source_url, raw])
        } else {
            EntityId::new(raw)
        }
    }

    fn generated_id(&self, path: &str) -> EntityId {
        let index = self.candidate.index.to_string();
        hex_id(&[&self.candidate.source_url, &index, path])
    }

    fn next_writer(&mut self) -> WriterKey {
        let writer = WriterKey {
            page_sequence: self.candidate.page_sequence,
            page_url: self.candidate.source_url.clone(),
            candidate_index: self.candidate.index,
            position: self.position,
        };
        self.position += 1;
        writer
    }

    /// Flatten a node object and return its identifier
    fn node(&mut self, obj: &Map<String, Value>, path: &str) -> EntityId {
        let writer = self.next_writer();
        let id = match obj.get("@id").and_then(Value::as_str) {
            Some(raw) if !raw.trim().is_empty() => self.explicit_id(raw.trim()),
            _ => self.generated_id(path),
        };

        let types = match obj.get("@type") {
            Some(Value::String(t)) => vec![strip_vocab_prefix(t.trim()).to_string()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|t| strip_vocab_prefix(t.trim()).to_string())
                .collect(),
            _ => Vec::new(),
        };

        let mut properties = BTreeMap::new();
        for (key, value) in obj {
            if key.starts_with('@') {
                continue;
            }
            let name = strip_vocab_prefix(key);
            let child_path = format!("{path}/{name}");
            properties.insert(name.to_string(), self.value(value, &child_path));
        }

        self.out.claims.push(EntityClaim {
            id: id.clone(),
            types,
            properties,
            writer,
        });
        id
    }

    fn value(&mut self, value: &Value, path: &str) -> PropertyValue {
        match value {
            Value::Object(obj) if obj.contains_key("@value") => PropertyValue::Literal(value.clone()),
            Value::Object(obj) => {
                if let Some(items) = obj.get("@list").or_else(|| obj.get("@set")) {
                    return self.value(items, path);
                }
                let is_reference = obj.keys().all(|k| k == "@id" || k == "@context")
                    && obj.get("@id").and_then(Value::as_str).is_some();
                match obj.get("@id").and_then(Value::as_str) {
                    Some(raw) if is_reference => PropertyValue::Ref(self.explicit_id(raw.trim())),
                    _ => PropertyValue::Ref(self.node(obj, path)),
                }
            }
            Value::Array(items) => PropertyValue::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.value(item, &format!("{path}[{i}]")))
                    .collect(),
            ),
            scalar => PropertyValue::Literal(scalar.clone()),
        }
    }

    fn root(&mut self, value: &Value, path: &str) {
        if let Value::Object(obj) = value {
            let id = self.node(obj, path);
            if !self.out.roots.contains(&id) {
                self.out.roots.push(id);
            }
        }
    }
}

/// Flatten one candidate tree.
///
/// A lone root object gets the path `$`, whether it stands alone, inside a
/// top-level array or inside `@graph`. Several roots get `$[i]`, counting
/// object elements only. Non-object roots are ignored.
pub(crate) fn flatten_candidate(candidate: &SchemaCandidate) -> FlattenedCandidate {
    let mut flattener = Flattener {
        candidate,
        position: 0,
        out: FlattenedCandidate::default(),
    };

    let roots: Vec<&Value> = match &candidate.tree {
        Value::Object(obj) => match obj.get("@graph") {
            Some(Value::Array(items)) => items.iter().filter(|v| v.is_object()).collect(),
            Some(single @ Value::Object(_)) => vec![single],
            _ => vec![&candidate.tree],
        },
        Value::Array(items) => items.iter().filter(|v| v.is_object()).collect(),
        _ => Vec::new(),
    };

    match roots.as_slice() {
        [single] => flattener.root(single, "$"),
        many => {
            for (i, item) in many.iter().enumerate() {
                flattener.root(item, &format!("$[{i}]"));
            }
        }
    }

    flattener.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_extractor::CandidateOrigin;
    use serde_json::json;

    fn candidate(url: &str, tree: Value) -> SchemaCandidate {
        SchemaCandidate::new(url, CandidateOrigin::JsonLd, 0, 0, tree)
    }

    #[test]
    fn nested_objects_become_references() {
        let flat = flatten_candidate(&candidate(
            "https://example.com/",
            json!({
                "@context": "https://schema.org",
                "@type": "Person",
                "@id": "https://example.com/#me",
                "name": "Ada",
                "worksFor": {"@id": "https://example.com/#org"},
                "address": {"@type": "PostalAddress", "streetAddress": "1 Main St"}
            }),
        ));
        assert_eq!(flat.claims.len(), 2);
        assert_eq!(flat.roots, vec![EntityId::new("https://example.com/#me")]);

        let person = flat.claims.iter().find(|c| c.types == ["Person"]).unwrap();
        assert_eq!(
            person.properties["worksFor"],
            PropertyValue::Ref(EntityId::new("https://example.com/#org"))
        );
        assert!(matches!(&person.properties["address"], PropertyValue::Ref(id) if id.is_generated()));
        assert!(!person.properties.contains_key("@context"));
    }

    #[test]
    fn identical_unidentified_siblings_stay_distinct() {
        let flat = flatten_candidate(&candidate(
            "https://example.com/",
            json!({
                "@type": "Event",
                "performer": [{"@type": "Person", "name": "X"}, {"@type": "Person", "name": "X"}]
            }),
        ));
        let PropertyValue::List(items) = &flat.claims.iter().find(|c| c.types == ["Event"]).unwrap().properties["performer"]
        else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 2);
        assert_ne!(items[0], items[1]);
    }

    #[test]
    fn generated_ids_are_stable_and_page_scoped() {
        let tree = json!({"@type": "Thing", "name": "same"});
        let a = flatten_candidate(&candidate("https://example.com/a", tree.clone()));
        let a_again = flatten_candidate(&candidate("https://example.com/a", tree.clone()));
        let b = flatten_candidate(&candidate("https://example.com/b", tree));
        assert_eq!(a.roots, a_again.roots);
        assert_ne!(a.roots, b.roots);
    }

    #[test]
    fn graph_and_array_roots_share_paths() {
        let from_graph = flatten_candidate(&candidate(
            "https://example.com/",
            json!({"@context": "https://schema.org", "@graph": [{"@type": "Thing"}, {"@type": "Place"}]}),
        ));
        let from_array = flatten_candidate(&candidate(
            "https://example.com/",
            json!([{"@type": "Thing"}, {"@type": "Place"}]),
        ));
        assert_eq!(from_graph.roots, from_array.roots);
        assert_eq!(from_graph.roots.len(), 2);
    }

    #[test]
    fn lone_root_has_the_same_path_in_any_wrapper() {
        let bare = flatten_candidate(&candidate("https://example.com/", json!({"@type": "Thing", "name": "x"})));
        let in_graph = flatten_candidate(&candidate(
            "https://example.com/",
            json!({"@graph": [{"@type": "Thing", "name": "x"}]}),
        ));
        let in_array = flatten_candidate(&candidate(
            "https://example.com/",
            json!(["ignored", {"@type": "Thing", "name": "x"}]),
        ));
        assert_eq!(bare.roots, in_graph.roots);
        assert_eq!(bare.roots, in_array.roots);
    }

    #[test]
    fn schema_prefixes_are_stripped() {
        let flat = flatten_candidate(&candidate(
            "https://example.com/",
            json!({"@type": ["https://schema.org/Person", "schema:Patient"], "schema:name": "A"}),
        ));
        assert_eq!(flat.claims[0].types, vec!["Person", "Patient"]);
        assert!(flat.claims[0].properties.contains_key("name"));
    }
}
