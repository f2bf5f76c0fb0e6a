//! Order-independent merging of entity claims.
//!
//! All claims about an entity are kept until finalization, keyed by their
//! [`WriterKey`]. The winning value of each property is then picked by the
//! configured [`MergePolicy`], so the outcome never depends on which page
//! finished first.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::entity::PropertyValue;
use super::flatten::{EntityClaim, WriterKey};

/// How conflicting property values on a shared entity are settled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Earliest writer (crawl order, then page URL, then position) wins
    #[default]
    FirstWriterWins,
    /// Latest writer wins
    LastWriterWins,
}

/// Everything asserted about one entity so far
#[derive(Debug, Default)]
pub(crate) struct EntityAccumulator {
    types: HashMap<String, WriterKey>,
    properties: BTreeMap<String, BTreeMap<WriterKey, PropertyValue>>,
    pub provenance: BTreeSet<String>,
}

/// Outcome of settling one property
pub(crate) struct Settled<'a> {
    pub value: &'a PropertyValue,
    pub writer: &'a WriterKey,
    /// Values from other writers that differ from the kept one
    pub rivals: Vec<(&'a WriterKey, &'a PropertyValue)>,
}

impl EntityAccumulator {
    pub fn absorb(&mut self, claim: EntityClaim) {
        self.provenance.insert(claim.writer.page_url.clone());
        for type_name in claim.types {
            match self.types.get_mut(&type_name) {
                Some(existing) if *existing <= claim.writer => {}
                Some(existing) => *existing = claim.writer.clone(),
                None => {
                    self.types.insert(type_name, claim.writer.clone());
                }
            }
        }
        for (name, value) in claim.properties {
            self.properties
                .entry(name)
                .or_default()
                .insert(claim.writer.clone(), value);
        }
    }

    /// Types as an ordered union by earliest claim
    pub fn types(&self) -> Vec<String> {
        let mut ordered: Vec<(&WriterKey, &String)> =
            self.types.iter().map(|(name, writer)| (writer, name)).collect();
        ordered.sort();
        ordered.into_iter().map(|(_, name)| name.clone()).collect()
    }

    pub fn settle(&self, policy: MergePolicy) -> impl Iterator<Item = (&String, Settled<'_>)> {
        self.properties.iter().filter_map(move |(name, claims)| {
            let (writer, value) = match policy {
                MergePolicy::FirstWriterWins => claims.iter().next()?,
                MergePolicy::LastWriterWins => claims.iter().next_back()?,
            };
            let rivals = claims
                .iter()
                .filter(|(_, other)| *other != value)
                .collect();
            Some((
                name,
                Settled {
                    value,
                    writer,
                    rivals,
                },
            ))
        })
    }
}

/// Short human-readable rendering of a property value for issue messages
pub(crate) fn describe(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Literal(v) => {
            let rendered = v.to_string();
            if rendered.chars().count() > 80 {
                format!("{}...", crate::utils::string_utils::safe_truncate_chars(&rendered, 80))
            } else {
                rendered
            }
        }
        PropertyValue::Ref(id) | PropertyValue::Unresolved(id) => format!("<{id}>"),
        PropertyValue::List(items) => format!("[{} items]", items.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::EntityId;
    use serde_json::json;

    fn claim(seq: u64, url: &str, name: &str) -> EntityClaim {
        EntityClaim {
            id: EntityId::new("x"),
            types: vec!["Thing".into()],
            properties: BTreeMap::from([("name".to_string(), PropertyValue::Literal(json!(name)))]),
            writer: WriterKey {
                page_sequence: seq,
                page_url: url.into(),
                candidate_index: 0,
                position: 0,
            },
        }
    }

    #[test]
    fn policy_picks_by_writer_not_arrival() {
        let mut acc = EntityAccumulator::default();
        acc.absorb(claim(5, "https://b.example/", "late"));
        acc.absorb(claim(1, "https://a.example/", "early"));

        let (_, first) = acc.settle(MergePolicy::FirstWriterWins).next().unwrap();
        assert_eq!(first.value, &PropertyValue::Literal(json!("early")));
        assert_eq!(first.rivals.len(), 1);

        let (_, last) = acc.settle(MergePolicy::LastWriterWins).next().unwrap();
        assert_eq!(last.value, &PropertyValue::Literal(json!("late")));
        assert_eq!(acc.provenance.len(), 2);
    }

    #[test]
    fn identical_values_are_not_rivals() {
        let mut acc = EntityAccumulator::default();
        acc.absorb(claim(1, "https://a.example/", "same"));
        acc.absorb(claim(2, "https://b.example/", "same"));
        let (_, settled) = acc.settle(MergePolicy::FirstWriterWins).next().unwrap();
        assert!(settled.rivals.is_empty());
    }
}
