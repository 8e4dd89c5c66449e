//! Cross-crate integration tests: parser output flowing through the sync
//! coordinator and into the knowledge graph service, exercising the
//! end-to-end scenarios from the synchronization pipeline's testable
//! properties (single-file definitions, cross-file call resolution,
//! incremental no-ops, rollback, and conflict deduplication).

use std::path::PathBuf;
use std::sync::Arc;

use codegraph_core::{file_id, EntityKind, Graph, RelationshipKind};
use codegraph_parser::ParserCoordinator;
use codegraph_sync::rollback::{MutationRecord, RollbackMode, RollbackValue};
use codegraph_sync::{OperationType, SyncCoordinator};
use tempfile::TempDir;
use tokio::sync::RwLock;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// S1: a single file defining a class with one method calling another
/// ends up with DEFINES/CONTAINS/EXPORTS/CALLS edges in the shared graph
/// once synced through the coordinator.
#[tokio::test]
async fn single_file_class_reaches_the_graph_with_expected_edges() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.ts", "export class Foo { bar() { this.baz(); } baz() {} }");
    let parser = ParserCoordinator::new(dir.path(), Default::default(), 4);
    let coordinator = SyncCoordinator::new(Arc::new(RwLock::new(Graph::new())));

    let parsed = parser.parse_file(&path);
    let outcome = coordinator.run_file_sync(OperationType::SingleFile, "a.ts", parsed.entities, parsed.relationships, parsed.errors).await;
    assert!(outcome.unresolved_conflicts.is_empty());

    let graph = coordinator.graph_handle();
    let graph = graph.read().await;
    let file = file_id("a.ts");
    assert!(graph.entity(&file).is_some());
    assert!(graph.all_relationships().iter().any(|r| r.kind == RelationshipKind::Exports && r.from_entity_id == file));
    assert!(
        graph.all_relationships().iter().any(|r| r.kind == RelationshipKind::Calls && r.occurrences == 1),
        "bar->baz should sync as a single CALLS edge"
    );
}

/// S2: `greet()` called twice from an importing file folds into one CALLS
/// edge with occurrences = 2 once both files are parsed and synced.
#[tokio::test]
async fn cross_file_calls_aggregate_after_both_files_sync() {
    let dir = TempDir::new().unwrap();
    write(&dir, "b.ts", "export function greet() {}");
    let a_path = write(&dir, "a.ts", "import { greet } from './b';\ngreet();\ngreet();\n");
    let parser = ParserCoordinator::new(dir.path(), Default::default(), 4);
    let coordinator = SyncCoordinator::new(Arc::new(RwLock::new(Graph::new())));

    let b_parsed = parser.parse_file(&dir.path().join("b.ts"));
    coordinator.run_file_sync(OperationType::SingleFile, "b.ts", b_parsed.entities, b_parsed.relationships, b_parsed.errors).await;

    let a_parsed = parser.parse_file(&a_path);
    let outcome = coordinator.run_file_sync(OperationType::SingleFile, "a.ts", a_parsed.entities, a_parsed.relationships, a_parsed.errors).await;
    assert!(outcome.unresolved_conflicts.is_empty());

    let graph = coordinator.graph_handle();
    let graph = graph.read().await;
    let greet_call = graph
        .all_relationships()
        .into_iter()
        .find(|r| r.kind == RelationshipKind::Calls && r.to_entity_id.contains("greet"))
        .expect("a CALLS edge targeting greet should exist");
    assert_eq!(greet_call.occurrences, 2);
    assert_eq!(greet_call.locations.len(), 2, "each occurrence, including the primary, is recorded in locations");
}

/// S4: re-parsing the same bytes through the incremental path returns a
/// zero-delta result, and re-syncing that (empty) delta leaves the graph
/// untouched — no duplicate entities, no edge churn.
#[tokio::test]
async fn incremental_reparse_of_unchanged_file_is_a_true_noop() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "a.ts", "export function greet() {}");
    let parser = ParserCoordinator::new(dir.path(), Default::default(), 4);
    let coordinator = SyncCoordinator::new(Arc::new(RwLock::new(Graph::new())));

    let first = parser.parse_file_incremental(&path);
    assert!(!first.is_incremental);
    coordinator.run_file_sync(OperationType::FullSync, "a.ts", first.entities, first.relationships, first.errors).await;
    let entity_count_before = coordinator.graph_handle().read().await.entity_count();

    let second = parser.parse_file_incremental(&path);
    assert!(second.is_incremental);
    assert!(second.added.is_empty() && second.updated.is_empty() && second.removed.is_empty());
    assert!(second.entities.is_empty() && second.relationships.is_empty());

    // An empty delta naturally produces no graph mutation; assert the
    // coordinator's own state is unaffected by re-deriving the count.
    assert_eq!(coordinator.graph_handle().read().await.entity_count(), entity_count_before);
}

/// S6: creating an entity, updating another, and deleting a third under one
/// rollback point, then rolling back, restores all three to their prior
/// state.
#[tokio::test]
async fn rollback_restores_create_update_and_delete() {
    let dir = TempDir::new().unwrap();
    write(&dir, "e2.ts", "export function keep() {}");
    let parser = ParserCoordinator::new(dir.path(), Default::default(), 4);
    let graph = Arc::new(RwLock::new(Graph::new()));
    let coordinator = SyncCoordinator::new(graph.clone());

    // Seed e2 (to be updated) and e3 (to be deleted) before the rollback point.
    let e2_parsed = parser.parse_file(&dir.path().join("e2.ts"));
    coordinator.run_file_sync(OperationType::SingleFile, "e2.ts", e2_parsed.entities.clone(), e2_parsed.relationships, e2_parsed.errors).await;
    let e2_before = e2_parsed.entities[0].clone();

    write(&dir, "e3.ts", "export function gone() {}");
    let e3_parsed = parser.parse_file(&dir.path().join("e3.ts"));
    coordinator.run_file_sync(OperationType::SingleFile, "e3.ts", e3_parsed.entities.clone(), e3_parsed.relationships, e3_parsed.errors).await;
    let e3 = e3_parsed.entities[0].clone();

    let rollback = coordinator.rollback_manager();
    let point = rollback.create_rollback_point(RollbackMode::ChangeBased, &[]).await;

    // Create e1.
    write(&dir, "e1.ts", "export function fresh() {}");
    let e1_parsed = parser.parse_file(&dir.path().join("e1.ts"));
    let e1 = e1_parsed.entities[0].clone();
    rollback.record_mutation(&point, MutationRecord::create(RollbackValue::Entity(e1.clone()))).await;
    graph.write().await.upsert_entity(e1.clone());

    // Update e2: bump its content hash.
    let mut e2_after = e2_before.clone();
    e2_after.content_hash = "changed".to_string();
    rollback
        .record_mutation(&point, MutationRecord::update(RollbackValue::Entity(e2_before.clone()), RollbackValue::Entity(e2_after.clone())))
        .await;
    graph.write().await.upsert_entity(e2_after);

    // Delete e3.
    rollback.record_mutation(&point, MutationRecord::delete(RollbackValue::Entity(e3.clone()))).await;
    graph.write().await.remove_entity(&e3.id);

    let result = rollback.rollback_to_point(&point).await;
    assert!(result.success);
    assert!(result.errors.is_empty());
    assert_eq!(result.rolled_back_entities, 3);

    let graph = graph.read().await;
    assert!(graph.entity(&e1.id).is_none(), "created entity should be gone after rollback");
    assert_eq!(graph.entity(&e2_before.id).unwrap().content_hash, e2_before.content_hash, "updated entity should be restored");
    assert!(graph.entity(&e3.id).is_some(), "deleted entity should be recreated");
}

/// S5: the same metadata divergence detected twice in a row yields one
/// conflict; resolving it manually suppresses future detections with the
/// same signature.
#[tokio::test]
async fn conflict_dedup_and_manual_override_suppress_future_detections() {
    use codegraph_core::{EntityAttrs, EntityKind as EK};
    use codegraph_sync::{ConflictKind, ConflictResolver};
    use std::collections::HashMap;

    fn entity(owner: &str) -> codegraph_core::Entity {
        let now = chrono::Utc::now();
        codegraph_core::Entity {
            id: file_id("shared.ts"),
            kind: EK::File,
            path: "shared.ts".into(),
            content_hash: "h".into(),
            language: None,
            created: now,
            last_modified: now,
            metadata: HashMap::from([("owner".to_string(), owner.to_string())]),
            attrs: EntityAttrs::File { extension: "ts".into(), size_bytes: 0, line_count: 0, is_test: false, is_config: false, dependencies: Vec::new() },
        }
    }

    let resolver = ConflictResolver::new();
    let persisted = entity("A");
    let incoming = entity("B");

    let first = resolver.detect(&persisted, &incoming, ConflictKind::EntityVersion).expect("divergent metadata should conflict");
    let second = resolver.detect(&persisted, &incoming, ConflictKind::EntityVersion).expect("same divergence re-detected");
    assert_eq!(first.id, second.id, "same signature should reuse the open conflict");
    assert_eq!(resolver.get_unresolved().len(), 1);

    resolver.resolve_manually(&first.id, persisted.clone()).unwrap();
    assert_eq!(resolver.get_unresolved().len(), 0);

    // Re-detecting the identical divergence should not create a new open conflict.
    let third = resolver.detect(&persisted, &incoming, ConflictKind::EntityVersion);
    assert!(third.is_none() || resolver.get_unresolved().is_empty());
}

/// The containment forest invariant holds across a small multi-directory
/// tree: every file's ancestor chain is acyclic and rooted.
#[tokio::test]
async fn containment_forms_a_forest_across_nested_directories() {
    let dir = TempDir::new().unwrap();
    write(&dir, "src/lib.rs", "pub fn top() {}");
    write(&dir, "src/util/helpers.rs", "pub fn helper() {}");
    let parser = ParserCoordinator::new(dir.path(), Default::default(), 4);
    let coordinator = SyncCoordinator::new(Arc::new(RwLock::new(Graph::new())));

    for rel in ["src/lib.rs", "src/util/helpers.rs"] {
        let parsed = parser.parse_file(&dir.path().join(rel));
        coordinator.run_file_sync(OperationType::FullSync, rel, parsed.entities, parsed.relationships, parsed.errors).await;
    }

    let graph = coordinator.graph_handle();
    let graph = graph.read().await;
    let mut parent_counts = std::collections::HashMap::new();
    for rel in graph.all_relationships() {
        if rel.kind == RelationshipKind::Contains {
            *parent_counts.entry(rel.to_entity_id.clone()).or_insert(0u32) += 1;
        }
    }
    assert!(parent_counts.values().all(|&count| count <= 1), "no node should have two CONTAINS parents");

    let helper_file = file_id("src/util/helpers.rs");
    let ancestors = graph.ancestors(&helper_file);
    assert!(ancestors.iter().any(|id| id.starts_with("dir:")), "helpers.rs should have at least one directory ancestor");
}

/// `EntityKind` gained dedicated variants for externally-populated kinds
/// (documentation, security findings, vulnerabilities, business domains);
/// the graph stores and filters on them like any other entity kind.
#[test]
fn graph_stores_externally_populated_entity_kinds() {
    use codegraph_core::{Entity, EntityAttrs, IssueSeverity};
    use std::collections::HashMap;

    let now = chrono::Utc::now();
    let vuln = Entity {
        id: "vuln:GHSA-xxxx".into(),
        kind: EntityKind::Vulnerability,
        path: "package.json".into(),
        content_hash: "h".into(),
        language: None,
        created: now,
        last_modified: now,
        metadata: HashMap::new(),
        attrs: EntityAttrs::Vulnerability {
            advisory_id: "GHSA-xxxx".into(),
            severity: IssueSeverity::High,
            package_name: "left-pad".into(),
            affected_range: "<1.3.0".into(),
            fixed_in: Some("1.3.0".into()),
        },
    };

    let mut graph = Graph::new();
    graph.upsert_entity(vuln.clone());
    let ids = graph.entities_of_kind(EntityKind::Vulnerability);
    assert_eq!(ids, vec![vuln.id]);
}
