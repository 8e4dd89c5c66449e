//! In-memory graph store: entities and relationships keyed by their
//! deterministic ids, with a petgraph overlay for traversal.

use std::collections::{HashSet, VecDeque};

use dashmap::DashMap;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;

use crate::ids::{EntityId, RelationshipId};
use crate::model::{Entity, EntityKind, Relationship, RelationshipKind};

/// The code knowledge graph. Entities and relationships live in concurrent
/// maps keyed by their stable id; petgraph only tracks topology so
/// traversal (`find_paths`, `traverse`, `ancestors`) stays cheap.
pub struct Graph {
    entities: DashMap<EntityId, Entity>,
    relationships: DashMap<RelationshipId, Relationship>,
    topology: StableDiGraph<EntityId, RelationshipId>,
    node_index: DashMap<EntityId, NodeIndex>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("entity_count", &self.entities.len())
            .field("relationship_count", &self.relationships.len())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            entities: DashMap::new(),
            relationships: DashMap::new(),
            topology: StableDiGraph::new(),
            node_index: DashMap::new(),
        }
    }

    fn node_index_for(&mut self, id: &EntityId) -> NodeIndex {
        if let Some(idx) = self.node_index.get(id) {
            return *idx;
        }
        let idx = self.topology.add_node(id.clone());
        self.node_index.insert(id.clone(), idx);
        idx
    }

    /// Insert or replace an entity. Returns the previous value, if any.
    pub fn upsert_entity(&mut self, entity: Entity) -> Option<Entity> {
        self.node_index_for(&entity.id);
        self.entities.insert(entity.id.clone(), entity)
    }

    pub fn entity(&self, id: &str) -> Option<Entity> {
        self.entities.get(id).map(|e| e.clone())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Deterministically fold `rel` into any existing relationship sharing
    /// its id (same from/to/kind triple): sum occurrences, keep earliest
    /// location primary, append evidence. See `Relationship::fold`.
    pub fn upsert_relationship(&mut self, rel: Relationship) -> RelationshipId {
        let from_idx = self.node_index_for(&rel.from_entity_id);
        let to_idx = self.node_index_for(&rel.to_entity_id);
        let id = rel.id.clone();

        match self.relationships.get_mut(&id) {
            Some(mut existing) => existing.fold(rel),
            None => {
                self.topology.add_edge(from_idx, to_idx, id.clone());
                self.relationships.insert(id.clone(), rel);
            }
        }
        id
    }

    pub fn relationship(&self, id: &str) -> Option<Relationship> {
        self.relationships.get(id).map(|r| r.clone())
    }

    pub fn remove_entity(&mut self, id: &str) -> Option<Entity> {
        if let Some((_, idx)) = self.node_index.remove(id) {
            self.topology.remove_node(idx);
        }
        self.entities.remove(id).map(|(_, e)| e)
    }

    pub fn remove_relationship(&mut self, id: &str) -> Option<Relationship> {
        self.relationships.remove(id).map(|(_, r)| r)
    }

    pub fn all_entities(&self) -> Vec<Entity> {
        self.entities.iter().map(|e| e.value().clone()).collect()
    }

    pub fn all_relationships(&self) -> Vec<Relationship> {
        self.relationships.iter().map(|r| r.value().clone()).collect()
    }

    pub fn entities_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| e.value().kind == kind)
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn relationships_from(&self, from_id: &str) -> Vec<Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.value().from_entity_id == from_id)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn relationships_to(&self, to_id: &str) -> Vec<Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.value().to_entity_id == to_id)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn has_relationship(&self, from_id: &str, to_id: &str, kind: RelationshipKind) -> bool {
        self.relationships
            .iter()
            .any(|r| r.value().from_entity_id == from_id && r.value().to_entity_id == to_id && r.value().kind == kind)
    }

    /// Ancestors of an entity following `Contains` edges upward.
    pub fn ancestors(&self, id: &str) -> HashSet<EntityId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id.to_string()]);
        while let Some(current) = queue.pop_front() {
            for rel in self.relationships_to(&current) {
                if rel.kind == RelationshipKind::Contains && seen.insert(rel.from_entity_id.clone()) {
                    queue.push_back(rel.from_entity_id);
                }
            }
        }
        seen
    }

    /// Bounded BFS over relationships matching `kinds` (all kinds if empty),
    /// capped at `max_depth` hops, returning distinct reached entity ids.
    pub fn traverse(&self, start: &str, kinds: &[RelationshipKind], max_depth: usize, limit: usize) -> Vec<EntityId> {
        let mut seen = HashSet::from([start.to_string()]);
        let mut frontier = vec![start.to_string()];
        let mut result = Vec::new();

        for _ in 0..max_depth {
            if result.len() >= limit {
                break;
            }
            let mut next = Vec::new();
            for node in &frontier {
                for rel in self.relationships_from(node) {
                    if !kinds.is_empty() && !kinds.contains(&rel.kind) {
                        continue;
                    }
                    if seen.insert(rel.to_entity_id.clone()) {
                        result.push(rel.to_entity_id.clone());
                        next.push(rel.to_entity_id);
                        if result.len() >= limit {
                            break;
                        }
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        result
    }

    /// Bounded BFS shortest paths from `start` to `end` (or all reachable
    /// entities if `end` is `None`), each path at most `max_depth` hops,
    /// capped at 10 returned paths.
    pub fn find_paths(&self, start: &str, end: Option<&str>, max_depth: usize) -> Vec<Vec<EntityId>> {
        const MAX_RESULTS: usize = 10;
        let mut results = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(vec![start.to_string()]);

        while let Some(path) = queue.pop_front() {
            if results.len() >= MAX_RESULTS {
                break;
            }
            let current = path.last().unwrap().clone();
            if let Some(target) = end {
                if current == target && path.len() > 1 {
                    results.push(path);
                    continue;
                }
            }
            if path.len() - 1 >= max_depth {
                if end.is_none() && path.len() > 1 {
                    results.push(path);
                }
                continue;
            }
            for rel in self.relationships_from(&current) {
                if path.contains(&rel.to_entity_id) {
                    continue;
                }
                let mut next_path = path.clone();
                next_path.push(rel.to_entity_id);
                queue.push_back(next_path);
            }
        }
        results
    }

    /// Outgoing neighbor count via petgraph topology — cheap degree check.
    pub fn out_degree(&self, id: &str) -> usize {
        self.node_index
            .get(id)
            .map(|idx| self.topology.neighbors_directed(*idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
