//! Ties [`Operation`] lifecycle, [`ConflictResolver`], [`RollbackManager`],
//! and [`Monitor`] together into the single entry point a caller drives a
//! sync through: apply one file's parsed entities/relationships to the
//! shared graph, under a rollback point, with conflicts resolved inline.

use std::sync::Arc;
use std::time::Instant;

use codegraph_core::{Entity, Graph, ParseError, Relationship};
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::conflict::{Conflict, ConflictKind, ConflictResolver};
use crate::monitor::Monitor;
use crate::operation::{Operation, OperationType};
use crate::rollback::{MutationRecord, RollbackManager, RollbackMode, RollbackValue};

/// Outcome of one `run_file_sync`/`run_file_removal` call: the finished
/// operation record plus any conflicts that had no applicable resolution
/// strategy and were left open.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub operation: Operation,
    pub unresolved_conflicts: Vec<Conflict>,
}

/// Coordinates one shared graph across repeated sync operations. Cheap to
/// hold behind an `Arc` and drive from multiple call sites (CLI, future
/// watch-mode callers) since the graph itself is lock-protected.
pub struct SyncCoordinator {
    graph: Arc<RwLock<Graph>>,
    rollback: RollbackManager,
    conflicts: ConflictResolver,
    monitor: Arc<Monitor>,
    operations: DashMap<String, Operation>,
}

impl SyncCoordinator {
    pub fn new(graph: Arc<RwLock<Graph>>) -> Self {
        let rollback = RollbackManager::new(graph.clone());
        SyncCoordinator { graph, rollback, conflicts: ConflictResolver::new(), monitor: Arc::new(Monitor::new()), operations: DashMap::new() }
    }

    pub fn graph_handle(&self) -> Arc<RwLock<Graph>> {
        self.graph.clone()
    }

    pub fn monitor(&self) -> Arc<Monitor> {
        self.monitor.clone()
    }

    pub fn conflicts(&self) -> &ConflictResolver {
        &self.conflicts
    }

    pub fn rollback_manager(&self) -> &RollbackManager {
        &self.rollback
    }

    pub fn operation(&self, id: &str) -> Option<Operation> {
        self.operations.get(id).map(|o| o.clone())
    }

    /// Apply one file's parse result to the graph. Entities/relationships
    /// that already exist go through conflict detection; new ones are
    /// created outright. Every mutation is recorded against a freshly
    /// created change-based rollback point before it's applied.
    pub async fn run_file_sync(
        &self,
        operation_type: OperationType,
        path: &str,
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
        parse_errors: Vec<ParseError>,
    ) -> SyncOutcome {
        let op_id = format!("op_{}", self.monitor.next_operation_id());
        let scope: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        let point_id = self.rollback.create_rollback_point(RollbackMode::ChangeBased, &scope).await;

        let mut operation = Operation::begin(op_id, operation_type, point_id.clone());
        for error in parse_errors {
            operation.record_error(error);
        }

        let started = Instant::now();
        let mut unresolved = Vec::new();

        {
            let mut graph = self.graph.write().await;

            for entity in entities {
                match graph.entity(&entity.id) {
                    Some(existing) => {
                        if let Some(conflict) = self.conflicts.detect(&existing, &entity, ConflictKind::EntityVersion) {
                            match self.conflicts.auto_resolve(&conflict.id) {
                                Ok(resolved) => {
                                    self.rollback
                                        .record_mutation(&point_id, MutationRecord::update(RollbackValue::Entity(existing), RollbackValue::Entity(resolved.clone())))
                                        .await;
                                    graph.upsert_entity(resolved);
                                    operation.counters.entities_updated += 1;
                                }
                                Err(_) => unresolved.push(conflict),
                            }
                        } else {
                            operation.counters.entities_updated += 1;
                            self.rollback
                                .record_mutation(&point_id, MutationRecord::update(RollbackValue::Entity(existing), RollbackValue::Entity(entity.clone())))
                                .await;
                            graph.upsert_entity(entity);
                        }
                    }
                    None => {
                        self.rollback.record_mutation(&point_id, MutationRecord::create(RollbackValue::Entity(entity.clone()))).await;
                        graph.upsert_entity(entity);
                        operation.counters.entities_created += 1;
                    }
                }
            }

            for rel in relationships {
                match graph.relationship(&rel.id) {
                    Some(previous) => {
                        self.rollback
                            .record_mutation(&point_id, MutationRecord::update(RollbackValue::Relationship(previous), RollbackValue::Relationship(rel.clone())))
                            .await;
                        graph.upsert_relationship(rel);
                        operation.counters.relationships_updated += 1;
                    }
                    None => {
                        self.rollback.record_mutation(&point_id, MutationRecord::create(RollbackValue::Relationship(rel.clone()))).await;
                        graph.upsert_relationship(rel);
                        operation.counters.relationships_created += 1;
                    }
                }
            }

            operation.counters.files_processed = 1;
        }

        let duration_ms = started.elapsed().as_millis() as u64;

        if unresolved.is_empty() {
            operation.complete();
            let processed = (operation.counters.entities_created + operation.counters.entities_updated) as u64;
            let rels = (operation.counters.relationships_created + operation.counters.relationships_updated) as u64;
            self.monitor.record_operation_completed(duration_ms, processed, rels);
        } else {
            operation.fail();
            self.monitor.record_operation_failed(duration_ms, &format!("{} unresolved conflict(s) syncing {path}", unresolved.len()));
        }

        self.operations.insert(operation.id.clone(), operation.clone());
        SyncOutcome { operation, unresolved_conflicts: unresolved }
    }

    /// Remove every entity (and incident relationship, via `Graph::remove_entity`)
    /// whose `path` matches a file that disappeared between syncs.
    pub async fn run_file_removal(&self, path: &str) -> SyncOutcome {
        let op_id = format!("op_{}", self.monitor.next_operation_id());

        let to_remove: Vec<Entity> = {
            let graph = self.graph.read().await;
            graph.all_entities().into_iter().filter(|e| e.path == path).collect()
        };
        let scope: Vec<String> = to_remove.iter().map(|e| e.id.clone()).collect();
        let point_id = self.rollback.create_rollback_point(RollbackMode::ChangeBased, &scope).await;
        let mut operation = Operation::begin(op_id, OperationType::SingleFile, point_id.clone());

        let started = Instant::now();
        {
            let mut graph = self.graph.write().await;
            for entity in to_remove {
                self.rollback.record_mutation(&point_id, MutationRecord::delete(RollbackValue::Entity(entity.clone()))).await;
                graph.remove_entity(&entity.id);
                operation.counters.entities_deleted += 1;
            }
            operation.counters.files_processed = 1;
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        operation.complete();
        self.monitor.record_operation_completed(duration_ms, operation.counters.entities_deleted as u64, 0);
        self.operations.insert(operation.id.clone(), operation.clone());
        SyncOutcome { operation, unresolved_conflicts: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::{file_id, sha256_hex, EntityAttrs, EntityKind, Graph};

    fn file_entity(path: &str, hash: &str) -> Entity {
        let now = chrono::Utc::now();
        Entity {
            id: file_id(path),
            kind: EntityKind::File,
            path: path.to_string(),
            content_hash: hash.to_string(),
            language: None,
            created: now,
            last_modified: now,
            metadata: Default::default(),
            attrs: EntityAttrs::File { extension: "rs".into(), size_bytes: 0, line_count: 0, is_test: false, is_config: false, dependencies: Vec::new() },
        }
    }

    #[tokio::test]
    async fn first_sync_creates_new_entities() {
        let coordinator = SyncCoordinator::new(Arc::new(RwLock::new(Graph::new())));
        let entity = file_entity("a.rs", &sha256_hex(b"a"));
        let outcome = coordinator.run_file_sync(OperationType::SingleFile, "a.rs", vec![entity.clone()], vec![], vec![]).await;
        assert_eq!(outcome.operation.counters.entities_created, 1);
        assert!(outcome.unresolved_conflicts.is_empty());

        let graph = coordinator.graph_handle();
        assert!(graph.read().await.entity(&entity.id).is_some());
    }

    #[tokio::test]
    async fn unchanged_resync_is_a_noop_update_with_no_conflict() {
        let coordinator = SyncCoordinator::new(Arc::new(RwLock::new(Graph::new())));
        let entity = file_entity("a.rs", &sha256_hex(b"a"));
        coordinator.run_file_sync(OperationType::SingleFile, "a.rs", vec![entity.clone()], vec![], vec![]).await;

        let outcome = coordinator.run_file_sync(OperationType::SingleFile, "a.rs", vec![entity], vec![], vec![]).await;
        assert!(outcome.unresolved_conflicts.is_empty());
    }

    #[tokio::test]
    async fn removal_deletes_entities_at_path() {
        let coordinator = SyncCoordinator::new(Arc::new(RwLock::new(Graph::new())));
        let entity = file_entity("a.rs", &sha256_hex(b"a"));
        coordinator.run_file_sync(OperationType::SingleFile, "a.rs", vec![entity.clone()], vec![], vec![]).await;

        let outcome = coordinator.run_file_removal("a.rs").await;
        assert_eq!(outcome.operation.counters.entities_deleted, 1);
        assert!(coordinator.graph_handle().read().await.entity(&entity.id).is_none());
    }
}
