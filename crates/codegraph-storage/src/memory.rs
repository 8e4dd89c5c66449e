//! In-memory reference adapters: not the "specific engines" the spec
//! excludes, but enough to drive the coordinator and knowledge-graph
//! service end to end without a real database — used by tests and by the
//! CLI's local-only mode.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use codegraph_core::{Entity, Relationship, StorageError};
use dashmap::DashMap;

use crate::cache::CacheAdapter;
use crate::graph_store::{PropertyGraphAdapter, Row};
use crate::relational::{RelationalAdapter, Statement};
use crate::value::QueryValue;
use crate::vector::{cosine_similarity, DistanceMetric, PayloadFilter, VectorHit, VectorPoint, VectorQuery, VectorStoreAdapter};

/// In-memory property graph: entities/edges keyed by id, mirroring what
/// the real engine would bulk-upsert.
#[derive(Default)]
pub struct InMemoryGraphStore {
    nodes: DashMap<String, Entity>,
    edges: DashMap<String, Relationship>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[async_trait]
impl PropertyGraphAdapter for InMemoryGraphStore {
    async fn query(&self, _query: &str, _params: &HashMap<String, QueryValue>) -> Result<Vec<Row>, StorageError> {
        // No query-language interpreter for the in-memory reference
        // adapter; callers that need structural queries go through
        // `codegraph-kg` directly against the in-process graph.
        Ok(Vec::new())
    }

    async fn command(&self, _args: &[QueryValue]) -> Result<QueryValue, StorageError> {
        Ok(QueryValue::Null)
    }

    async fn bulk_upsert_nodes(&self, nodes: &[Entity]) -> Result<(), StorageError> {
        for node in nodes {
            self.nodes.insert(node.id.clone(), node.clone());
        }
        Ok(())
    }

    async fn bulk_upsert_edges(&self, edges: &[Relationship]) -> Result<(), StorageError> {
        for edge in edges {
            self.edges.insert(edge.id.clone(), edge.clone());
        }
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<(), StorageError> {
        self.nodes.remove(id);
        Ok(())
    }

    async fn delete_edge(&self, id: &str) -> Result<(), StorageError> {
        self.edges.remove(id);
        Ok(())
    }
}

/// In-memory vector store: one `DashMap<collection, Vec<VectorPoint>>`,
/// brute-force cosine search. Fine for the data volumes the test suite and
/// local CLI mode ever touch.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: DashMap<String, Vec<VectorPoint>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStoreAdapter for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, _size: usize, _distance: DistanceMetric) -> Result<(), StorageError> {
        self.collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn upsert(&self, collection: &str, point: VectorPoint) -> Result<(), StorageError> {
        let mut points = self.collections.entry(collection.to_string()).or_default();
        if let Some(existing) = points.iter_mut().find(|p| p.id == point.id) {
            *existing = point;
        } else {
            points.push(point);
        }
        Ok(())
    }

    async fn search(&self, collection: &str, query: VectorQuery) -> Result<Vec<VectorHit>, StorageError> {
        let Some(points) = self.collections.get(collection) else { return Ok(Vec::new()) };

        let mut hits: Vec<VectorHit> = points
            .iter()
            .filter(|p| match &query.filter {
                None => true,
                Some(PayloadFilter { key, value }) => p.payload.get(key) == Some(value),
            })
            .map(|p| VectorHit {
                id: p.id,
                score: cosine_similarity(&query.vector, &p.vector),
                payload: if query.with_payload { p.payload.clone() } else { HashMap::new() },
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn delete(&self, collection: &str, filter: &PayloadFilter) -> Result<(), StorageError> {
        if let Some(mut points) = self.collections.get_mut(collection) {
            points.retain(|p| p.payload.get(&filter.key) != Some(&filter.value));
        }
        Ok(())
    }
}

/// In-memory relational store: tables keyed by name, each a list of rows.
/// `query`/`bulk_query` are intentionally dumb — no SQL parsing — since a
/// real engine is out of scope; this exists to prove the coordinator and
/// rollback paths that depend on the trait shape, not to be a database.
#[derive(Default)]
pub struct InMemoryRelationalStore {
    applied: RwLock<Vec<Statement>>,
}

impl InMemoryRelationalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied_statements(&self) -> Vec<Statement> {
        self.applied.read().unwrap().clone()
    }
}

#[async_trait]
impl RelationalAdapter for InMemoryRelationalStore {
    async fn query(&self, _sql: &str, _params: &[QueryValue], _timeout: Option<Duration>) -> Result<Vec<Row>, StorageError> {
        Ok(Vec::new())
    }

    async fn transaction(&self, statements: &[Statement]) -> Result<(), StorageError> {
        let mut applied = self.applied.write().unwrap();
        applied.extend(statements.iter().cloned());
        Ok(())
    }

    async fn bulk_query(&self, statements: &[Statement], continue_on_error: bool) -> Result<Vec<Result<u64, StorageError>>, StorageError> {
        let mut results = Vec::with_capacity(statements.len());
        let mut applied = self.applied.write().unwrap();
        for stmt in statements {
            applied.push(stmt.clone());
            results.push(Ok(1));
            if !continue_on_error && results.last().unwrap().is_err() {
                break;
            }
        }
        Ok(results)
    }
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

/// In-memory cache with lazy TTL expiry (checked on read, not a
/// background sweep — fine at the scale this reference adapter serves).
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheAdapter for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at.is_some_and(|t| Instant::now() >= t) {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StorageError> {
        self.entries.insert(
            key.to_string(),
            CacheEntry { value, expires_at: ttl.map(|d| Instant::now() + d) },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::{Entity, EntityAttrs, EntityKind};

    fn sample_file_entity(path: &str) -> Entity {
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

    #[tokio::test]
    async fn graph_store_bulk_upserts_and_deletes() {
        let store = InMemoryGraphStore::new();
        let entity = sample_file_entity("a.rs");
        store.bulk_upsert_nodes(&[entity.clone()]).await.unwrap();
        assert_eq!(store.node_count(), 1);
        store.delete_node(&entity.id).await.unwrap();
        assert_eq!(store.node_count(), 0);
    }

    #[tokio::test]
    async fn vector_store_search_ranks_by_similarity() {
        let store = InMemoryVectorStore::new();
        store.create_collection("code", 3, DistanceMetric::Cosine).await.unwrap();
        store
            .upsert("code", VectorPoint { id: 1, vector: vec![1.0, 0.0, 0.0], payload: HashMap::new() })
            .await
            .unwrap();
        store
            .upsert("code", VectorPoint { id: 2, vector: vec![0.0, 1.0, 0.0], payload: HashMap::new() })
            .await
            .unwrap();

        let hits = store
            .search("code", VectorQuery { vector: vec![1.0, 0.0, 0.0], limit: 1, with_payload: false, filter: None })
            .await
            .unwrap();
        assert_eq!(hits[0].id, 1);
    }

    #[tokio::test]
    async fn cache_expires_after_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", b"v".to_vec(), Some(Duration::from_millis(1))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
