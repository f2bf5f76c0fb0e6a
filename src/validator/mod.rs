//! Taxonomy-driven validation of a resolved entity graph.
//!
//! Validation is purely observational: it reads the graph and the taxonomy
//! and returns issues, it never changes either.

pub mod issues;

pub use issues::{IssueCode, Severity, ValidationIssue, sort_issues};

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::resolver::{EntityGraph, PropertyValue, SchemaEntity};
use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone)]
pub struct Validator {
    taxonomy: Arc<Taxonomy>,
}

impl Validator {
    #[must_use]
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// Check every entity of the graph. The result is sorted.
    #[must_use]
    pub fn validate(&self, graph: &EntityGraph) -> Vec<ValidationIssue> {
        let roots: BTreeSet<_> = graph
            .page_urls()
            .flat_map(|url| graph.roots_for(url).iter())
            .collect();

        let mut issues = Vec::new();
        for entity in graph.entities() {
            self.check_entity(graph, entity, roots.contains(&entity.id), &mut issues);
        }
        sort_issues(&mut issues);

        log::debug!(
            "Validated {} entities: {} issues",
            graph.len(),
            issues.len()
        );
        issues
    }

    fn check_entity(
        &self,
        graph: &EntityGraph,
        entity: &SchemaEntity,
        is_root: bool,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let subject = entity.id.as_str();

        if entity.types.is_empty() {
            if is_root {
                issues.push(ValidationIssue::new(
                    subject,
                    IssueCode::MissingType,
                    "Root entity declares no @type",
                ));
            }
            return;
        }

        let unknown: Vec<&String> = entity
            .types
            .iter()
            .filter(|t| !self.taxonomy.contains_type(t))
            .collect();
        if !unknown.is_empty() {
            // further checks against an unknown type would only add noise
            for type_name in unknown {
                issues.push(ValidationIssue::new(
                    subject,
                    IssueCode::UnknownType,
                    format!("Type '{type_name}' is not in the taxonomy"),
                ));
            }
            return;
        }

        let mut expected = BTreeSet::new();
        for type_name in &entity.types {
            if let Some(props) = self.taxonomy.expected_properties(type_name) {
                expected.extend(props.iter());
            }
        }
        for property in expected {
            if !entity.properties.contains_key(property) {
                issues.push(ValidationIssue::new(
                    subject,
                    IssueCode::MissingExpectedProperty,
                    format!(
                        "Expected property '{property}' of {} is missing",
                        entity.types.join("/")
                    ),
                ));
            }
        }

        for (property, value) in &entity.properties {
            self.check_range(graph, subject, property, value, issues);
        }
    }

    /// Nested entity values must fall inside the property's known range
    fn check_range(
        &self,
        graph: &EntityGraph,
        subject: &str,
        property: &str,
        value: &PropertyValue,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let Some(range) = self.taxonomy.property_range(property) else {
            return;
        };
        let targets: Vec<_> = match value {
            PropertyValue::Ref(id) => vec![id],
            PropertyValue::List(items) => items
                .iter()
                .filter_map(|item| match item {
                    PropertyValue::Ref(id) => Some(id),
                    _ => None,
                })
                .collect(),
            PropertyValue::Literal(_) | PropertyValue::Unresolved(_) => return,
        };

        for target_id in targets {
            let Some(target) = graph.get(target_id) else {
                continue;
            };
            // untyped or unknown-typed targets are reported on their own
            if target.types.is_empty()
                || target.types.iter().any(|t| !self.taxonomy.contains_type(t))
            {
                continue;
            }
            let accepted = target
                .types
                .iter()
                .any(|t| self.taxonomy.accepts_value_type(property, t));
            if !accepted {
                let allowed: Vec<&str> = range.iter().map(String::as_str).collect();
                issues.push(ValidationIssue::new(
                    subject,
                    IssueCode::PropertyRangeMismatch,
                    format!(
                        "Property '{property}' holds {} ({}), expected one of {}",
                        target.types.join("/"),
                        target.id,
                        allowed.join(", ")
                    ),
                ));
            }
        }
    }
}

/// Validate a graph against a taxonomy
#[must_use]
pub fn validate(graph: &EntityGraph, taxonomy: Arc<Taxonomy>) -> Vec<ValidationIssue> {
    Validator::new(taxonomy).validate(graph)
}
