//! Rollback points: change-based and state-based reversal of graph
//! mutations performed during an operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use codegraph_core::{diff_snapshots, Entity, Graph, Relationship, RollbackStepError};
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackMode {
    ChangeBased,
    StateBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationAction {
    Create,
    Update,
    Delete,
}

/// Either side of a recorded mutation: whichever of entity/relationship the
/// mutation touched.
#[derive(Debug, Clone)]
pub enum RollbackValue {
    Entity(Entity),
    Relationship(Relationship),
}

impl RollbackValue {
    fn id(&self) -> &str {
        match self {
            RollbackValue::Entity(e) => &e.id,
            RollbackValue::Relationship(r) => &r.id,
        }
    }
}

/// One mutation recorded during change-based tracking: `create` carries
/// only `new_state`, `delete` only `previous_state`, `update` both.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub action: MutationAction,
    pub previous_state: Option<RollbackValue>,
    pub new_state: Option<RollbackValue>,
}

impl MutationRecord {
    pub fn create(new_state: RollbackValue) -> Self {
        MutationRecord { action: MutationAction::Create, previous_state: None, new_state: Some(new_state) }
    }

    pub fn update(previous_state: RollbackValue, new_state: RollbackValue) -> Self {
        MutationRecord { action: MutationAction::Update, previous_state: Some(previous_state), new_state: Some(new_state) }
    }

    pub fn delete(previous_state: RollbackValue) -> Self {
        MutationRecord { action: MutationAction::Delete, previous_state: Some(previous_state), new_state: None }
    }
}

/// A captured state-based snapshot: the entities/relationships within
/// scope at the moment the rollback point was created.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
}

struct RollbackPoint {
    mode: RollbackMode,
    scope: Vec<String>,
    snapshot: Snapshot,
    mutations: Mutex<Vec<MutationRecord>>,
}

/// Result of a `rollback_to_point` call. `partial` is set when some
/// reversals succeeded and others failed.
#[derive(Debug, Default)]
pub struct RollbackResult {
    pub success: bool,
    pub partial: bool,
    pub rolled_back_entities: u32,
    pub errors: Vec<RollbackStepError>,
}

/// Owns rollback points and applies reversal against a shared graph.
pub struct RollbackManager {
    graph: Arc<RwLock<Graph>>,
    points: DashMap<String, RollbackPoint>,
    next_id: std::sync::atomic::AtomicU64,
}

impl RollbackManager {
    pub fn new(graph: Arc<RwLock<Graph>>) -> Self {
        RollbackManager { graph, points: DashMap::new(), next_id: std::sync::atomic::AtomicU64::new(1) }
    }

    /// Capture a new rollback point in `mode`, scoped to `scope` entity ids
    /// (an empty scope in state-based mode snapshots the whole graph).
    pub async fn create_rollback_point(&self, mode: RollbackMode, scope: &[String]) -> String {
        let id = format!("rb_{}", self.next_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst));

        let snapshot = if mode == RollbackMode::StateBased {
            let graph = self.graph.read().await;
            self.capture_snapshot(&graph, scope)
        } else {
            Snapshot::default()
        };

        self.points.insert(
            id.clone(),
            RollbackPoint { mode, scope: scope.to_vec(), snapshot, mutations: Mutex::new(Vec::new()) },
        );
        id
    }

    fn capture_snapshot(&self, graph: &Graph, scope: &[String]) -> Snapshot {
        if scope.is_empty() {
            Snapshot { entities: graph.all_entities(), relationships: graph.all_relationships() }
        } else {
            let entities: Vec<Entity> = scope.iter().filter_map(|id| graph.entity(id)).collect();
            let relationships: Vec<Relationship> = graph
                .all_relationships()
                .into_iter()
                .filter(|r| scope.contains(&r.from_entity_id) || scope.contains(&r.to_entity_id))
                .collect();
            Snapshot { entities, relationships }
        }
    }

    /// Append a mutation to a change-based rollback point. A no-op for
    /// state-based points, which reconcile from the snapshot instead.
    pub async fn record_mutation(&self, point_id: &str, record: MutationRecord) {
        if let Some(point) = self.points.get(point_id) {
            if point.mode == RollbackMode::ChangeBased {
                point.mutations.lock().await.push(record);
            }
        }
    }

    pub async fn rollback_to_point(&self, point_id: &str) -> RollbackResult {
        let Some(point) = self.points.get(point_id) else {
            return RollbackResult {
                success: false,
                errors: vec![RollbackStepError {
                    entity_id: point_id.to_string(),
                    reason: "unknown rollback point".to_string(),
                    recoverable: false,
                }],
                ..Default::default()
            };
        };

        match point.mode {
            RollbackMode::ChangeBased => self.rollback_change_based(&point).await,
            RollbackMode::StateBased => self.rollback_state_based(&point).await,
        }
    }

    async fn rollback_change_based(&self, point: &RollbackPoint) -> RollbackResult {
        let mutations = point.mutations.lock().await;
        let mut graph = self.graph.write().await;
        let mut result = RollbackResult { success: true, ..Default::default() };

        for record in mutations.iter().rev() {
            let outcome = match record.action {
                MutationAction::Create => {
                    let id = record.new_state.as_ref().map(|v| v.id().to_string());
                    self.apply_delete(&mut graph, id.as_deref())
                }
                MutationAction::Update => self.apply_restore(&mut graph, record.previous_state.as_ref()),
                MutationAction::Delete => self.apply_restore(&mut graph, record.previous_state.as_ref()),
            };
            match outcome {
                Ok(()) => result.rolled_back_entities += 1,
                Err(e) => {
                    result.partial = true;
                    result.errors.push(e);
                }
            }
        }
        result.success = result.errors.is_empty();
        result
    }

    async fn rollback_state_based(&self, point: &RollbackPoint) -> RollbackResult {
        let mut graph = self.graph.write().await;
        let current = self.capture_snapshot(&graph, &point.scope);

        let diff = diff_snapshots(
            &current.entities,
            &point.snapshot.entities,
            &current.relationships,
            &point.snapshot.relationships,
        );

        let mut result = RollbackResult { success: true, ..Default::default() };

        for entity in diff.added_entities.iter().chain(diff.modified_entities.iter()) {
            graph.upsert_entity(entity.clone());
            result.rolled_back_entities += 1;
        }
        for id in &diff.removed_entities {
            graph.remove_entity(id);
            result.rolled_back_entities += 1;
        }
        for rel in &diff.added_relationships {
            graph.upsert_relationship(rel.clone());
        }
        for id in &diff.removed_relationships {
            graph.remove_relationship(id);
        }
        result
    }

    fn apply_delete(&self, graph: &mut Graph, id: Option<&str>) -> Result<(), RollbackStepError> {
        let Some(id) = id else {
            return Err(RollbackStepError { entity_id: "unknown".into(), reason: "missing id on create record".into(), recoverable: false });
        };
        if graph.entity(id).is_some() {
            graph.remove_entity(id);
        } else {
            graph.remove_relationship(id);
        }
        Ok(())
    }

    fn apply_restore(&self, graph: &mut Graph, value: Option<&RollbackValue>) -> Result<(), RollbackStepError> {
        match value {
            Some(RollbackValue::Entity(e)) => {
                graph.upsert_entity(e.clone());
                Ok(())
            }
            Some(RollbackValue::Relationship(r)) => {
                graph.upsert_relationship(r.clone());
                Ok(())
            }
            None => Err(RollbackStepError { entity_id: "unknown".into(), reason: "missing previous state".into(), recoverable: false }),
        }
    }
}
