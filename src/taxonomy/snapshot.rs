//! Taxonomy snapshot parsing.
//!
//! Two formats are accepted: the native snapshot
//! (`{"types": {...}, "property_ranges": {...}}` or a bare type map) and the
//! schema.org vocabulary JSON-LD export (`{"@graph": [...]}`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::TaxonomyError;
use crate::utils::string_utils::local_type_name;

/// Declaration of one type in a native snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub properties: Vec<String>,
}

/// Raw taxonomy data before ancestry is computed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomySnapshot {
    pub types: BTreeMap<String, TypeSpec>,
    #[serde(default)]
    pub property_ranges: BTreeMap<String, Vec<String>>,
}

impl TaxonomySnapshot {
    /// Parse any supported snapshot format.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::Malformed`] if the text is not JSON or does not
    /// match a known format.
    pub fn parse(text: &str) -> Result<Self, TaxonomyError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| TaxonomyError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Interpret an already-parsed JSON value as a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonomyError::Malformed`] if the value matches no format.
    pub fn from_value(value: Value) -> Result<Self, TaxonomyError> {
        let Value::Object(map) = value else {
            return Err(TaxonomyError::Malformed(
                "snapshot root must be a JSON object".into(),
            ));
        };

        if let Some(graph) = map.get("@graph") {
            return Self::from_schema_org_graph(graph);
        }

        if map.get("types").is_some_and(Value::is_object) {
            return serde_json::from_value(Value::Object(map))
                .map_err(|e| TaxonomyError::Malformed(e.to_string()));
        }

        let types: BTreeMap<String, TypeSpec> = serde_json::from_value(Value::Object(map))
            .map_err(|e| TaxonomyError::Malformed(e.to_string()))?;
        Ok(Self {
            types,
            property_ranges: BTreeMap::new(),
        })
    }

    fn from_schema_org_graph(graph: &Value) -> Result<Self, TaxonomyError> {
        let nodes = graph
            .as_array()
            .ok_or_else(|| TaxonomyError::Malformed("@graph must be an array".into()))?;

        let mut types: BTreeMap<String, TypeSpec> = BTreeMap::new();
        let mut raw_parents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut domains: Vec<(String, Vec<String>)> = Vec::new();
        let mut property_ranges = BTreeMap::new();

        for node in nodes {
            let Some(id) = node.get("@id").and_then(Value::as_str) else {
                continue;
            };
            let name = local_type_name(id).to_string();
            let node_types = id_list(node.get("@type"));

            if node_types.iter().any(|t| t == "Class") {
                types.entry(name.clone()).or_default();
                raw_parents.insert(name, id_list(node.get("rdfs:subClassOf")));
            } else if node_types.iter().any(|t| t == "Property") {
                domains.push((name.clone(), id_list(node.get("schema:domainIncludes"))));
                let ranges = id_list(node.get("schema:rangeIncludes"));
                if !ranges.is_empty() {
                    property_ranges.insert(name, ranges);
                }
            }
        }

        // subClassOf may point outside the vocabulary (rdfs:Class, external terms)
        for (name, parents) in raw_parents {
            let known: Vec<String> = parents
                .into_iter()
                .filter(|p| types.contains_key(p))
                .collect();
            if let Some(spec) = types.get_mut(&name) {
                spec.parents = known;
            }
        }

        for (property, domain_types) in domains {
            for domain in domain_types {
                if let Some(spec) = types.get_mut(&domain) {
                    spec.properties.push(property.clone());
                }
            }
        }

        Ok(Self {
            types,
            property_ranges,
        })
    }

    /// Every type name mentioned anywhere in the snapshot, declared or not
    pub(crate) fn referenced_parents(&self) -> BTreeSet<&str> {
        self.types
            .values()
            .flat_map(|spec| spec.parents.iter().map(String::as_str))
            .collect()
    }
}

/// Local names from a JSON-LD value that is a string, an `{"@id": ..}` node or
/// an array of either.
fn id_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![local_type_name(s).to_string()],
        Some(Value::Object(obj)) => obj
            .get("@id")
            .and_then(Value::as_str)
            .map(|s| vec![local_type_name(s).to_string()])
            .unwrap_or_default(),
        Some(Value::Array(items)) => items.iter().flat_map(|v| id_list(Some(v))).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_map_form_is_accepted() {
        let snapshot =
            TaxonomySnapshot::parse(r#"{"Thing": {"properties": ["name"]}, "Person": {"parents": ["Thing"]}}"#)
                .unwrap();
        assert_eq!(snapshot.types.len(), 2);
        assert_eq!(snapshot.types["Person"].parents, vec!["Thing"]);
        assert!(snapshot.property_ranges.is_empty());
    }

    #[test]
    fn schema_org_graph_form_is_accepted() {
        let text = r#"{
            "@context": {"schema": "https://schema.org/"},
            "@graph": [
                {"@id": "schema:Thing", "@type": "rdfs:Class"},
                {"@id": "schema:Person", "@type": "rdfs:Class", "rdfs:subClassOf": {"@id": "schema:Thing"}},
                {"@id": "schema:Text", "@type": ["schema:DataType", "rdfs:Class"]},
                {"@id": "schema:DataType", "@type": "rdfs:Class", "rdfs:subClassOf": {"@id": "rdfs:Class"}},
                {"@id": "schema:name", "@type": "rdf:Property",
                 "schema:domainIncludes": {"@id": "schema:Thing"},
                 "schema:rangeIncludes": {"@id": "schema:Text"}},
                {"@id": "schema:knows", "@type": "rdf:Property",
                 "schema:domainIncludes": [{"@id": "schema:Person"}],
                 "schema:rangeIncludes": [{"@id": "schema:Person"}]},
                {"@id": "schema:Monday", "@type": "schema:DayOfWeek"}
            ]
        }"#;
        let snapshot = TaxonomySnapshot::parse(text).unwrap();
        assert_eq!(snapshot.types.len(), 4);
        assert_eq!(snapshot.types["Person"].parents, vec!["Thing"]);
        assert!(snapshot.types["DataType"].parents.is_empty());
        assert_eq!(snapshot.types["Thing"].properties, vec!["name"]);
        assert_eq!(snapshot.property_ranges["knows"], vec!["Person"]);
    }

    #[test]
    fn non_object_root_is_malformed() {
        assert!(matches!(
            TaxonomySnapshot::parse("[1, 2]"),
            Err(TaxonomyError::Malformed(_))
        ));
        assert!(matches!(
            TaxonomySnapshot::parse("{not json"),
            Err(TaxonomyError::Malformed(_))
        ));
    }
}
