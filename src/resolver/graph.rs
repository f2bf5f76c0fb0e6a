use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::entity::{EntityId, SchemaEntity};

/// Arena of resolved entities for one session.
///
/// Relationships between entities are identifier references only; nothing
/// here owns another entity, so cycles are representable without special
/// casing. Consumers that walk references must guard against revisits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityGraph {
    entities: BTreeMap<EntityId, SchemaEntity>,
    /// Root entities of each page, in candidate order
    page_roots: BTreeMap<String, Vec<EntityId>>,
}

impl EntityGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity
    pub fn insert(&mut self, entity: SchemaEntity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    pub fn set_page_roots(&mut self, page_url: impl Into<String>, roots: Vec<EntityId>) {
        self.page_roots.insert(page_url.into(), roots);
    }

    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&SchemaEntity> {
        self.entities.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Entities in identifier order
    pub fn entities(&self) -> impl Iterator<Item = &SchemaEntity> {
        self.entities.values()
    }

    #[must_use]
    pub fn roots_for(&self, page_url: &str) -> &[EntityId] {
        self.page_roots.get(page_url).map_or(&[], Vec::as_slice)
    }

    pub fn page_urls(&self) -> impl Iterator<Item = &str> {
        self.page_roots.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Identifiers reachable from `root` within `max_depth` reference hops,
    /// including `root` itself. Each entity is visited once.
    #[must_use]
    pub fn reachable_from(&self, root: &EntityId, max_depth: usize) -> BTreeSet<EntityId> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([(root, 0usize)]);
        while let Some((id, depth)) = queue.pop_front() {
            let Some(entity) = self.entities.get(id) else {
                continue;
            };
            if !visited.insert(id.clone()) {
                continue;
            }
            if depth >= max_depth {
                continue;
            }
            for value in entity.properties.values() {
                for target in value.references() {
                    if !visited.contains(target) {
                        queue.push_back((target, depth + 1));
                    }
                }
            }
        }
        visited
    }
}
