use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of an entity in the session-wide table.
///
/// Explicit `@id`s are kept verbatim. Identifiers starting with `_:` are
/// generated (or page-scoped blank nodes) and are never emitted in output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.0.starts_with("_:")
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Value of one entity property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Plain JSON value, including `@value` objects
    Literal(Value),
    /// Reference to another entity in the table
    Ref(EntityId),
    List(Vec<PropertyValue>),
    /// Reference whose target never appeared in the session
    Unresolved(EntityId),
}

impl PropertyValue {
    /// Every entity referenced by this value, resolved or not
    pub fn references(&self) -> Vec<&EntityId> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a EntityId>) {
        match self {
            Self::Ref(id) | Self::Unresolved(id) => out.push(id),
            Self::List(items) => items.iter().for_each(|item| item.collect_references(out)),
            Self::Literal(_) => {}
        }
    }
}

/// A resolved, typed entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntity {
    pub id: EntityId,
    /// Declared types, ordered by earliest claim
    pub types: Vec<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    /// URLs of every page that contributed to this entity
    pub provenance: BTreeSet<String>,
}

impl SchemaEntity {
    #[must_use]
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.id.is_generated()
    }
}
