//! The Knowledge Graph Service.

use std::sync::Arc;

use codegraph_core::{Entity, EntityId, Graph, RelationshipId};
use codegraph_storage::{
    DistanceMetric, EmbeddingProvider, PayloadFilter, VectorPoint, VectorQuery, VectorStoreAdapter, CODE_EMBEDDINGS,
    DOCUMENTATION_EMBEDDINGS, INTEGRATION_TEST_EMBEDDINGS, VECTOR_DIMENSIONS,
};
use tokio::sync::RwLock;

use crate::query::{PathQuery, StructuralFilters, TraverseQuery};
use crate::vector_sync::{entity_payload, entity_vector_id};

/// A partial update to an entity's mutable fields — everything but its id
/// and kind, which are fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct EntityPatch {
    pub content_hash: Option<String>,
    pub metadata: Option<std::collections::HashMap<String, String>>,
}

pub struct KnowledgeGraphService {
    graph: Arc<RwLock<Graph>>,
    vector_store: Option<Arc<dyn VectorStoreAdapter>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl KnowledgeGraphService {
    pub fn new() -> Self {
        KnowledgeGraphService { graph: Arc::new(RwLock::new(Graph::new())), vector_store: None, embedder: None }
    }

    pub fn with_storage(vector_store: Arc<dyn VectorStoreAdapter>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        KnowledgeGraphService { graph: Arc::new(RwLock::new(Graph::new())), vector_store: Some(vector_store), embedder: Some(embedder) }
    }

    /// Build a service that shares its graph with another owner (typically
    /// a `SyncCoordinator`) instead of starting from an empty one.
    pub fn with_shared_graph(graph: Arc<RwLock<Graph>>, vector_store: Option<Arc<dyn VectorStoreAdapter>>, embedder: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        KnowledgeGraphService { graph, vector_store, embedder }
    }

    /// The shared handle backing this service's graph, for wiring into a
    /// `SyncCoordinator`/`RollbackManager` that must mutate the same graph.
    pub fn graph_handle(&self) -> Arc<RwLock<Graph>> {
        self.graph.clone()
    }

    /// Ensure the three vector collections the core relies on exist. A
    /// no-op after the first call against a given store.
    pub async fn ensure_collections(&self) -> Result<(), codegraph_core::StorageError> {
        if let Some(store) = &self.vector_store {
            for collection in [CODE_EMBEDDINGS, DOCUMENTATION_EMBEDDINGS, INTEGRATION_TEST_EMBEDDINGS] {
                store.create_collection(collection, VECTOR_DIMENSIONS, DistanceMetric::Cosine).await?;
            }
        }
        Ok(())
    }

    pub async fn create_entity(&self, entity: Entity) -> Result<(), codegraph_core::StorageError> {
        self.upsert_vector_record(&entity).await?;
        self.graph.write().await.upsert_entity(entity);
        Ok(())
    }

    pub async fn get_entity(&self, id: &str) -> Option<Entity> {
        self.graph.read().await.entity(id)
    }

    pub async fn update_entity(&self, id: &str, patch: EntityPatch) -> Option<Entity> {
        let mut graph = self.graph.write().await;
        let mut entity = graph.entity(id)?;
        if let Some(hash) = patch.content_hash {
            entity.content_hash = hash;
        }
        if let Some(metadata) = patch.metadata {
            entity.metadata = metadata;
        }
        entity.last_modified = chrono::Utc::now();
        graph.upsert_entity(entity.clone());
        Some(entity)
    }

    /// Delete an entity: its incident edges first, then the node itself,
    /// then its vector record — in that order, per §4.5.
    pub async fn delete_entity(&self, id: &str) -> Result<(), codegraph_core::StorageError> {
        let mut graph = self.graph.write().await;
        let incident: Vec<RelationshipId> = graph
            .relationships_from(id)
            .into_iter()
            .chain(graph.relationships_to(id))
            .map(|r| r.id)
            .collect();
        for rel_id in incident {
            graph.remove_relationship(&rel_id);
        }
        graph.remove_entity(id);
        drop(graph);

        if let Some(store) = &self.vector_store {
            for collection in [CODE_EMBEDDINGS, DOCUMENTATION_EMBEDDINGS, INTEGRATION_TEST_EMBEDDINGS] {
                store
                    .delete(collection, &PayloadFilter { key: "entityId".into(), value: id.to_string().into() })
                    .await?;
            }
        }
        Ok(())
    }

    /// Fold `rel` into the graph via its deterministic id, per §3.
    pub async fn upsert_relationship(&self, rel: codegraph_core::Relationship) -> RelationshipId {
        self.graph.write().await.upsert_relationship(rel)
    }

    pub async fn find_paths(&self, query: PathQuery) -> Vec<Vec<EntityId>> {
        let graph = self.graph.read().await;
        let mut paths = graph.find_paths(&query.start, query.end.as_deref(), query.max_depth);
        if !query.types.is_empty() {
            paths.retain(|path| path_matches_types(&graph, path, &query.types));
        }
        paths
    }

    pub async fn traverse(&self, query: TraverseQuery) -> Vec<EntityId> {
        self.graph.read().await.traverse(&query.start, &query.types, query.max_depth, query.limit)
    }

    pub async fn structural_search(&self, filters: StructuralFilters) -> Vec<Entity> {
        let graph = self.graph.read().await;
        let mut results: Vec<Entity> = graph
            .all_entities()
            .into_iter()
            .filter(|e| filters.types.as_ref().is_none_or(|types| types.contains(&e.kind)))
            .filter(|e| filters.path_contains.as_ref().is_none_or(|needle| e.path.contains(needle.as_str())))
            .filter(|e| filters.language.is_none_or(|lang| e.language == Some(lang)))
            .filter(|e| filters.modified_since.is_none_or(|since| e.last_modified >= since))
            .filter(|e| filters.modified_until.is_none_or(|until| e.last_modified <= until))
            .collect();
        results.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(limit) = filters.limit {
            results.truncate(limit);
        }
        results
    }

    /// Embed `query`, search the code collection, and hydrate hits back to
    /// full entities by the `entityId` stored in each hit's payload.
    pub async fn semantic_search(&self, query: &str, limit: usize) -> Result<Vec<Entity>, codegraph_core::StorageError> {
        let (Some(store), Some(embedder)) = (&self.vector_store, &self.embedder) else {
            return Ok(Vec::new());
        };
        let vector = embedder
            .embed(query)
            .await
            .unwrap_or_else(|_| codegraph_storage::deterministic_fallback_vector(query));

        let hits = store
            .search(CODE_EMBEDDINGS, VectorQuery { vector, limit, with_payload: true, filter: None })
            .await?;

        let graph = self.graph.read().await;
        let mut hydrated = Vec::new();
        for hit in hits {
            if let Some(codegraph_storage::QueryValue::Text(entity_id)) = hit.payload.get("entityId") {
                if let Some(entity) = graph.entity(entity_id) {
                    hydrated.push(entity);
                }
            }
        }
        Ok(hydrated)
    }

    async fn upsert_vector_record(&self, entity: &Entity) -> Result<(), codegraph_core::StorageError> {
        let (Some(store), Some(embedder)) = (&self.vector_store, &self.embedder) else { return Ok(()) };
        let content = format!("{}\n{}", entity.path, entity.content_hash);
        let vector = embedder.embed(&content).await.unwrap_or_else(|_| codegraph_storage::deterministic_fallback_vector(&content));
        store
            .upsert(
                CODE_EMBEDDINGS,
                VectorPoint { id: entity_vector_id(&entity.id), vector, payload: entity_payload(entity) },
            )
            .await
    }
}

impl Default for KnowledgeGraphService {
    fn default() -> Self {
        Self::new()
    }
}

fn path_matches_types(graph: &Graph, path: &[EntityId], types: &[codegraph_core::RelationshipKind]) -> bool {
    path.windows(2).all(|pair| {
        graph
            .relationships_from(&pair[0])
            .into_iter()
            .any(|r| r.to_entity_id == pair[1] && types.contains(&r.kind))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::{EdgeSource, EntityAttrs, EntityKind, Location, RefKind, RelationshipKind, Resolution, Scope};
    use std::collections::HashMap;

    fn file_entity(path: &str) -> Entity {
        let now = chrono::Utc::now();
        Entity {
            id: codegraph_core::file_id(path),
            kind: EntityKind::File,
            path: path.to_string(),
            content_hash: codegraph_core::sha256_hex(path.as_bytes()),
            language: None,
            created: now,
            last_modified: now,
            metadata: HashMap::new(),
            attrs: EntityAttrs::File {
                extension: "rs".into(),
                size_bytes: 0,
                line_count: 0,
                is_test: false,
                is_config: false,
                dependencies: Vec::new(),
            },
        }
    }

    fn contains_rel(from: &str, to: &str) -> codegraph_core::Relationship {
        codegraph_core::Relationship {
            id: codegraph_core::rel_id(from, to, "CONTAINS"),
            from_entity_id: from.to_string(),
            to_entity_id: to.to_string(),
            kind: RelationshipKind::Contains,
            source: EdgeSource::Ast,
            resolution: Resolution::Direct,
            scope: Scope::Local,
            ref_kind: Some(RefKind::Identifier),
            confidence: 1.0,
            occurrences: 1,
            inferred: false,
            resolved: true,
            used_type_checker: false,
            is_exported: false,
            import_depth: None,
            arity: None,
            awaited: None,
            operator: None,
            access_path: None,
            param_name: None,
            location: Location { path: from.to_string(), line: 1, column: 1 },
            locations: vec![Location { path: from.to_string(), line: 1, column: 1 }],
            evidence: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_get_delete_roundtrip() {
        let svc = KnowledgeGraphService::new();
        let entity = file_entity("a.rs");
        svc.create_entity(entity.clone()).await.unwrap();
        assert!(svc.get_entity(&entity.id).await.is_some());

        svc.delete_entity(&entity.id).await.unwrap();
        assert!(svc.get_entity(&entity.id).await.is_none());
    }

    #[tokio::test]
    async fn delete_entity_removes_incident_edges() {
        let svc = KnowledgeGraphService::new();
        let dir = file_entity("dir:src");
        let file = file_entity("src/a.rs");
        svc.create_entity(dir.clone()).await.unwrap();
        svc.create_entity(file.clone()).await.unwrap();
        svc.upsert_relationship(contains_rel(&dir.id, &file.id)).await;

        svc.delete_entity(&file.id).await.unwrap();
        let paths = svc.find_paths(PathQuery::new(dir.id.clone())).await;
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn structural_search_filters_by_path() {
        let svc = KnowledgeGraphService::new();
        svc.create_entity(file_entity("src/a.rs")).await.unwrap();
        svc.create_entity(file_entity("src/b.rs")).await.unwrap();
        svc.create_entity(file_entity("tests/c.rs")).await.unwrap();

        let filters = StructuralFilters { path_contains: Some("src/".into()), ..Default::default() };
        let results = svc.structural_search(filters).await;
        assert_eq!(results.len(), 2);
    }
}
