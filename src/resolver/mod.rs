//! Nested schema resolution.
//!
//! Candidates from every page are flattened into identifier-keyed claims and
//! merged into one session-wide entity table. Linking happens once, in
//! [`Resolver::finalize`], so a reference may point at an entity declared on
//! any page regardless of which page finished first.

pub mod entity;
pub mod flatten;
pub mod graph;
pub mod merge;

pub use entity::{EntityId, PropertyValue, SchemaEntity};
pub use flatten::WriterKey;
pub use graph::EntityGraph;
pub use merge::MergePolicy;

use std::collections::{BTreeMap, BTreeSet};

use crate::page_extractor::SchemaCandidate;
use crate::validator::{IssueCode, ValidationIssue, sort_issues};
use flatten::flatten_candidate;
use merge::{EntityAccumulator, describe};

/// Resolved graph plus the issues found while resolving it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub graph: EntityGraph,
    /// `unresolved_reference` errors and `merge_conflict` warnings, sorted
    pub issues: Vec<ValidationIssue>,
}

/// Owner of the canonical entity table during a session.
///
/// Mutation goes through `&mut self`, so concurrent page pipelines must hand
/// their candidates to a single owner; the engine does this on its event loop.
#[derive(Debug, Default)]
pub struct Resolver {
    policy: MergePolicy,
    entities: BTreeMap<EntityId, EntityAccumulator>,
    /// page URL -> (candidate index, root ordinal) -> root
    page_roots: BTreeMap<String, BTreeMap<(usize, usize), EntityId>>,
}

impl Resolver {
    #[must_use]
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Merge one candidate into the table
    pub fn add_candidate(&mut self, candidate: &SchemaCandidate) {
        let flattened = flatten_candidate(candidate);
        log::debug!(
            "Candidate {} of {} flattened into {} claims",
            candidate.index,
            candidate.source_url,
            flattened.claims.len()
        );

        for claim in flattened.claims {
            self.entities.entry(claim.id.clone()).or_default().absorb(claim);
        }

        let roots = self.page_roots.entry(candidate.source_url.clone()).or_default();
        for (ordinal, root) in flattened.roots.into_iter().enumerate() {
            roots.insert((candidate.index, ordinal), root);
        }
    }

    pub fn add_candidates(&mut self, candidates: &[SchemaCandidate]) {
        for candidate in candidates {
            self.add_candidate(candidate);
        }
    }

    /// Settle conflicts, link references and produce the final graph.
    ///
    /// References to identifiers that never appeared become
    /// [`PropertyValue::Unresolved`] with an `unresolved_reference` error, so
    /// the returned graph has no dangling references.
    #[must_use]
    pub fn finalize(&self) -> Resolution {
        let mut graph = EntityGraph::new();
        let mut issues = Vec::new();

        for (id, acc) in &self.entities {
            let mut properties = BTreeMap::new();
            for (name, settled) in acc.settle(self.policy) {
                if !settled.rivals.is_empty() {
                    let ignored: Vec<String> = settled
                        .rivals
                        .iter()
                        .map(|(writer, value)| format!("{} from {}", describe(value), writer.page_url))
                        .collect();
                    issues.push(ValidationIssue::new(
                        id.as_str(),
                        IssueCode::MergeConflict,
                        format!(
                            "Conflicting values for '{name}': kept {} from {}, ignored {}",
                            describe(settled.value),
                            settled.writer.page_url,
                            ignored.join(", ")
                        ),
                    ));
                }

                let mut dangling = BTreeSet::new();
                let linked = self.link(settled.value, &mut dangling);
                for target in dangling {
                    issues.push(ValidationIssue::new(
                        id.as_str(),
                        IssueCode::UnresolvedReference,
                        format!("Property '{name}' references unknown entity '{target}'"),
                    ));
                }
                properties.insert(name.clone(), linked);
            }

            graph.insert(SchemaEntity {
                id: id.clone(),
                types: acc.types(),
                properties,
                provenance: acc.provenance.clone(),
            });
        }

        for (page_url, roots) in &self.page_roots {
            let mut ordered: Vec<EntityId> = Vec::with_capacity(roots.len());
            for root in roots.values() {
                if !ordered.contains(root) {
                    ordered.push(root.clone());
                }
            }
            graph.set_page_roots(page_url.clone(), ordered);
        }

        sort_issues(&mut issues);
        Resolution { graph, issues }
    }

    fn link(&self, value: &PropertyValue, dangling: &mut BTreeSet<EntityId>) -> PropertyValue {
        match value {
            PropertyValue::Ref(target) | PropertyValue::Unresolved(target) => {
                if self.entities.contains_key(target) {
                    PropertyValue::Ref(target.clone())
                } else {
                    dangling.insert(target.clone());
                    PropertyValue::Unresolved(target.clone())
                }
            }
            PropertyValue::List(items) => {
                PropertyValue::List(items.iter().map(|item| self.link(item, dangling)).collect())
            }
            PropertyValue::Literal(_) => value.clone(),
        }
    }
}

/// Resolve a batch of candidates with the default merge policy
#[must_use]
pub fn resolve(candidates: &[SchemaCandidate]) -> Resolution {
    let mut resolver = Resolver::default();
    resolver.add_candidates(candidates);
    resolver.finalize()
}
