//! Canonical per-page document assembly.
//!
//! A page's root entities are dereferenced into one inlined JSON-LD tree.
//! One visited set spans the whole document: every entity is inlined at
//! most once, and any later occurrence, or one below the depth limit, is
//! written as an `{"@id": ..}` stub. Page roots are reserved for their own
//! top-level position, so a root referenced from elsewhere is always a stub.
//! The document therefore holds at most one inlined object per entity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::resolver::{EntityGraph, EntityId, PropertyValue, SchemaEntity};
use crate::utils::{DEFAULT_MAX_TRAVERSAL_DEPTH, SCHEMA_ORG_CONTEXT, storage_path_for};

/// Output artifact for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    pub page_url: String,
    pub root_ids: Vec<EntityId>,
    /// Inlined JSON-LD tree; an empty object when the page has no entities
    pub document: Value,
}

impl CanonicalDocument {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root_ids.is_empty()
    }

    /// Relative storage path hint derived from the page URL
    ///
    /// # Errors
    ///
    /// Returns an error if the page URL has no host.
    pub fn relative_path(&self) -> anyhow::Result<PathBuf> {
        storage_path_for(&self.page_url)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Assembler {
    max_depth: usize,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRAVERSAL_DEPTH)
    }
}

impl Assembler {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    #[must_use]
    pub fn assemble(&self, page_url: &str, graph: &EntityGraph) -> CanonicalDocument {
        let root_ids = graph.roots_for(page_url).to_vec();
        // roots are claimed up front so nested references never inline them
        let mut visited: HashSet<EntityId> = root_ids.iter().cloned().collect();

        let document = match root_ids.as_slice() {
            [] => Value::Object(Map::new()),
            [root] => {
                let mut rendered = self.render_root(root, graph, &mut visited);
                if let Value::Object(obj) = &mut rendered {
                    obj.insert("@context".into(), json!(SCHEMA_ORG_CONTEXT));
                }
                rendered
            }
            roots => {
                let nodes: Vec<Value> = roots
                    .iter()
                    .map(|root| self.render_root(root, graph, &mut visited))
                    .collect();
                json!({"@context": SCHEMA_ORG_CONTEXT, "@graph": nodes})
            }
        };

        CanonicalDocument {
            page_url: page_url.to_string(),
            root_ids,
            document,
        }
    }

    fn render_root(
        &self,
        id: &EntityId,
        graph: &EntityGraph,
        visited: &mut HashSet<EntityId>,
    ) -> Value {
        match graph.get(id) {
            Some(entity) if self.max_depth > 0 => {
                Value::Object(self.render_fields(entity, graph, visited, 0))
            }
            _ => stub(id),
        }
    }

    fn render_entity(
        &self,
        id: &EntityId,
        graph: &EntityGraph,
        visited: &mut HashSet<EntityId>,
        depth: usize,
    ) -> Value {
        if visited.contains(id) {
            log::debug!("{id} already rendered, writing reference stub");
            return stub(id);
        }
        if depth >= self.max_depth {
            log::debug!("Depth limit {} reached at {id}, writing reference stub", self.max_depth);
            return stub(id);
        }
        let Some(entity) = graph.get(id) else {
            return stub(id);
        };

        visited.insert(id.clone());
        Value::Object(self.render_fields(entity, graph, visited, depth))
    }

    fn render_fields(
        &self,
        entity: &SchemaEntity,
        graph: &EntityGraph,
        visited: &mut HashSet<EntityId>,
        depth: usize,
    ) -> Map<String, Value> {
        let mut obj = Map::new();
        if !entity.is_generated() {
            obj.insert("@id".into(), json!(entity.id.as_str()));
        }
        match entity.types.as_slice() {
            [] => {}
            [single] => {
                obj.insert("@type".into(), json!(single));
            }
            many => {
                obj.insert("@type".into(), json!(many));
            }
        }
        for (name, value) in &entity.properties {
            obj.insert(name.clone(), self.render_value(value, graph, visited, depth));
        }
        obj
    }

    fn render_value(
        &self,
        value: &PropertyValue,
        graph: &EntityGraph,
        visited: &mut HashSet<EntityId>,
        depth: usize,
    ) -> Value {
        match value {
            PropertyValue::Literal(v) => v.clone(),
            PropertyValue::Ref(id) => self.render_entity(id, graph, visited, depth + 1),
            PropertyValue::Unresolved(id) => stub(id),
            PropertyValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.render_value(item, graph, visited, depth))
                    .collect(),
            ),
        }
    }
}

fn stub(id: &EntityId) -> Value {
    json!({"@id": id.as_str()})
}

/// Assemble with the default traversal depth
#[must_use]
pub fn assemble(page_url: &str, graph: &EntityGraph) -> CanonicalDocument {
    Assembler::default().assemble(page_url, graph)
}
