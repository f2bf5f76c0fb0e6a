//! In-memory schema.org type taxonomy.
//!
//! Types form a directed acyclic graph: a type may have several direct
//! parents. Ancestor sets and inherited property unions are computed once at
//! load time, so every query afterwards is a lookup. A [`Taxonomy`] is never
//! mutated after construction and is shared across the session behind an
//! `Arc`.

mod remote;
mod snapshot;

pub use remote::{SCHEMA_ORG_VOCABULARY_URL, default_cache_path};
pub use snapshot::{TaxonomySnapshot, TypeSpec};

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

/// Fatal taxonomy loading errors. Any of these aborts a session before
/// crawling starts.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("Failed to read taxonomy snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch taxonomy from {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Malformed taxonomy snapshot: {0}")]
    Malformed(String),

    #[error("Taxonomy snapshot declares no types")]
    Empty,

    #[error("Type '{child}' declares unknown parent '{parent}'")]
    UnknownParent { child: String, parent: String },

    #[error("Inheritance cycle through type '{0}'")]
    Cycle(String),
}

/// One type with its resolved ancestry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyNode {
    pub name: String,
    /// Direct parents, as declared
    pub parents: Vec<String>,
    /// Properties declared on this type only
    pub own_properties: BTreeSet<String>,
    /// Own properties plus those of every ancestor
    pub expected_properties: BTreeSet<String>,
    /// Every type reachable through the parent relation, excluding self
    pub ancestors: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    nodes: HashMap<String, TaxonomyNode>,
    property_ranges: HashMap<String, BTreeSet<String>>,
}

const CORE_SNAPSHOT: &str = include_str!("core_snapshot.json");

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl Taxonomy {
    /// Build a taxonomy, validating the parent relation.
    ///
    /// # Errors
    ///
    /// Fails on an empty snapshot, a parent that is not a declared type, or an
    /// inheritance cycle.
    pub fn from_snapshot(snapshot: TaxonomySnapshot) -> Result<Self, TaxonomyError> {
        if snapshot.types.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        for parent in snapshot.referenced_parents() {
            if !snapshot.types.contains_key(parent) {
                let child = snapshot
                    .types
                    .iter()
                    .find(|(_, spec)| spec.parents.iter().any(|p| p == parent))
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default();
                return Err(TaxonomyError::UnknownParent {
                    child,
                    parent: parent.to_string(),
                });
            }
        }

        let mut ancestors: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut state: HashMap<String, Visit> = HashMap::new();
        for name in snapshot.types.keys() {
            compute_ancestors(name, &snapshot, &mut state, &mut ancestors)?;
        }

        let mut nodes = HashMap::with_capacity(snapshot.types.len());
        for (name, spec) in &snapshot.types {
            let own_properties: BTreeSet<String> = spec.properties.iter().cloned().collect();
            let type_ancestors = ancestors.remove(name).unwrap_or_default();
            let mut expected_properties = own_properties.clone();
            for ancestor in &type_ancestors {
                if let Some(ancestor_spec) = snapshot.types.get(ancestor) {
                    expected_properties.extend(ancestor_spec.properties.iter().cloned());
                }
            }
            nodes.insert(
                name.clone(),
                TaxonomyNode {
                    name: name.clone(),
                    parents: spec.parents.clone(),
                    own_properties,
                    expected_properties,
                    ancestors: type_ancestors,
                },
            );
        }

        let property_ranges = snapshot
            .property_ranges
            .into_iter()
            .map(|(property, ranges)| (property, ranges.into_iter().collect()))
            .collect();

        log::info!("Loaded taxonomy with {} types", nodes.len());
        Ok(Self {
            nodes,
            property_ranges,
        })
    }

    /// Parse and build a taxonomy from snapshot text in any supported format.
    ///
    /// # Errors
    ///
    /// See [`TaxonomySnapshot::parse`] and [`Taxonomy::from_snapshot`].
    pub fn from_json_str(text: &str) -> Result<Self, TaxonomyError> {
        Self::from_snapshot(TaxonomySnapshot::parse(text)?)
    }

    /// Load a snapshot file.
    ///
    /// # Errors
    ///
    /// A missing or unreadable file is [`TaxonomyError::Io`]; see
    /// [`Taxonomy::from_json_str`] for the rest.
    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        let text = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Small built-in vocabulary covering the most common schema.org types.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled snapshot itself is broken.
    pub fn core() -> Result<Self, TaxonomyError> {
        Self::from_json_str(CORE_SNAPSHOT)
    }

    #[must_use]
    pub fn contains_type(&self, type_name: &str) -> bool {
        self.nodes.contains_key(type_name)
    }

    #[must_use]
    pub fn node(&self, type_name: &str) -> Option<&TaxonomyNode> {
        self.nodes.get(type_name)
    }

    /// Whether `ancestor` is reachable from `type_name` through the parent
    /// relation. Reflexive: every known type is a subtype of itself.
    #[must_use]
    pub fn is_subtype_of(&self, type_name: &str, ancestor: &str) -> bool {
        match self.nodes.get(type_name) {
            Some(node) => type_name == ancestor || node.ancestors.contains(ancestor),
            None => false,
        }
    }

    /// Own and inherited properties of a type; `None` for unknown types.
    #[must_use]
    pub fn expected_properties(&self, type_name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(type_name).map(|node| &node.expected_properties)
    }

    #[must_use]
    pub fn ancestors(&self, type_name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(type_name).map(|node| &node.ancestors)
    }

    /// Types allowed as values of `property`, when the snapshot knows them
    #[must_use]
    pub fn property_range(&self, property: &str) -> Option<&BTreeSet<String>> {
        self.property_ranges.get(property)
    }

    /// Whether an entity typed `value_type` is an acceptable value of
    /// `property`. Properties without a known range accept anything.
    #[must_use]
    pub fn accepts_value_type(&self, property: &str, value_type: &str) -> bool {
        match self.property_ranges.get(property) {
            Some(ranges) => ranges.iter().any(|range| self.is_subtype_of(value_type, range)),
            None => true,
        }
    }

    /// All type names, sorted
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Depth-first ancestor computation with cycle detection
fn compute_ancestors(
    name: &str,
    snapshot: &TaxonomySnapshot,
    state: &mut HashMap<String, Visit>,
    ancestors: &mut HashMap<String, BTreeSet<String>>,
) -> Result<(), TaxonomyError> {
    match state.get(name) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => return Err(TaxonomyError::Cycle(name.to_string())),
        None => {}
    }
    state.insert(name.to_string(), Visit::InProgress);

    let mut collected = BTreeSet::new();
    if let Some(spec) = snapshot.types.get(name) {
        for parent in &spec.parents {
            compute_ancestors(parent, snapshot, state, ancestors)?;
            collected.insert(parent.clone());
            if let Some(parent_ancestors) = ancestors.get(parent) {
                collected.extend(parent_ancestors.iter().cloned());
            }
        }
    }

    ancestors.insert(name.to_string(), collected);
    state.insert(name.to_string(), Visit::Done);
    Ok(())
}
