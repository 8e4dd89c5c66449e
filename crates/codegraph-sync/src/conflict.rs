//! Conflict detection and resolution: divergence between an incoming
//! entity and the persisted graph is diffed, signed, deduplicated, and
//! resolved by a priority-ordered list of strategies.

use chrono::{DateTime, Utc};
use codegraph_core::{sha256_hex, ConflictUnresolved, Entity};
use dashmap::DashMap;

/// Fields dropped before diffing/signing because they change on every
/// ingest regardless of whether anything meaningful changed.
const IGNORED_FIELDS: &[&str] = &["created", "last_modified"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    EntityVersion,
    EntityDeletion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictStatus {
    Open,
    Resolved,
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub id: String,
    pub entity_id: String,
    pub kind: ConflictKind,
    pub signature: String,
    pub persisted: Entity,
    pub incoming: Entity,
    pub status: ConflictStatus,
    pub detected_at: DateTime<Utc>,
    pub resolved_value: Option<Entity>,
}

/// A strategy that may resolve a conflict. Higher priority applies first;
/// the first whose `can_handle` returns true wins.
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn priority(&self) -> u32;
    fn can_handle(&self, conflict: &Conflict) -> bool;
    fn resolve(&self, conflict: &Conflict) -> Entity;
}

/// Priority 100, always applicable: overwrite persisted with incoming.
pub struct LastWriteWins;

impl ResolutionStrategy for LastWriteWins {
    fn name(&self) -> &str {
        "last-write-wins"
    }
    fn priority(&self) -> u32 {
        100
    }
    fn can_handle(&self, _conflict: &Conflict) -> bool {
        true
    }
    fn resolve(&self, conflict: &Conflict) -> Entity {
        conflict.incoming.clone()
    }
}

/// Priority 50, entity-version conflicts only: merge metadata maps, adopt
/// the later `last_modified`, prefer the incoming content hash.
pub struct PropertyMerge;

impl ResolutionStrategy for PropertyMerge {
    fn name(&self) -> &str {
        "property-merge"
    }
    fn priority(&self) -> u32 {
        50
    }
    fn can_handle(&self, conflict: &Conflict) -> bool {
        conflict.kind == ConflictKind::EntityVersion
    }
    fn resolve(&self, conflict: &Conflict) -> Entity {
        let mut merged = conflict.persisted.clone();
        merged.metadata.extend(conflict.incoming.metadata.clone());
        merged.last_modified = conflict.persisted.last_modified.max(conflict.incoming.last_modified);
        merged.content_hash = conflict.incoming.content_hash.clone();
        merged
    }
}

/// Priority 25, entity-deletion conflicts only: keep the persisted entity.
pub struct SkipDeletions;

impl ResolutionStrategy for SkipDeletions {
    fn name(&self) -> &str {
        "skip-deletions"
    }
    fn priority(&self) -> u32 {
        25
    }
    fn can_handle(&self, conflict: &Conflict) -> bool {
        conflict.kind == ConflictKind::EntityDeletion
    }
    fn resolve(&self, conflict: &Conflict) -> Entity {
        conflict.persisted.clone()
    }
}

/// A normalized, deterministically-ordered view of an entity's fields used
/// only to compute the diff signature — not the entity itself.
fn normalize(entity: &Entity) -> serde_json::Value {
    let mut value = serde_json::to_value(entity).expect("Entity serializes");
    if let serde_json::Value::Object(map) = &mut value {
        for field in IGNORED_FIELDS {
            map.remove(*field);
        }
    }
    value
}

/// A deterministic signature for the diff between `persisted` and
/// `incoming`, or `None` if they're equal once normalized.
fn diff_signature(persisted: &Entity, incoming: &Entity) -> Option<String> {
    let old = normalize(persisted);
    let new = normalize(incoming);
    if old == new {
        return None;
    }
    let serialized = serde_json::json!({"old": old, "new": new}).to_string();
    Some(sha256_hex(serialized.as_bytes()))
}

pub struct ConflictResolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    conflicts: DashMap<String, Conflict>,
    /// Manual overrides remembered by signature so a re-detected divergence
    /// with the same signature does not spawn a new open conflict.
    manual_overrides: DashMap<String, Entity>,
    next_id: std::sync::atomic::AtomicU64,
}

impl ConflictResolver {
    pub fn new() -> Self {
        let mut strategies: Vec<Box<dyn ResolutionStrategy>> =
            vec![Box::new(LastWriteWins), Box::new(PropertyMerge), Box::new(SkipDeletions)];
        strategies.sort_by_key(|s| s.priority());
        ConflictResolver { strategies, conflicts: DashMap::new(), manual_overrides: DashMap::new(), next_id: std::sync::atomic::AtomicU64::new(1) }
    }

    /// Register an additional strategy, re-sorting by priority. Lower
    /// priority numbers are more specific and are tried first; `LastWriteWins`
    /// at 100 is the catch-all that always applies, so it runs last.
    pub fn register_strategy(&mut self, strategy: Box<dyn ResolutionStrategy>) {
        self.strategies.push(strategy);
        self.strategies.sort_by_key(|s| s.priority());
    }

    /// Detect a conflict between `persisted` and `incoming`. Returns `None`
    /// when they're equal once normalized, when an open conflict with the
    /// same signature already exists (deduped), or when a manual override
    /// with the same signature has already settled this divergence.
    pub fn detect(&self, persisted: &Entity, incoming: &Entity, kind: ConflictKind) -> Option<Conflict> {
        let signature = diff_signature(persisted, incoming)?;

        if self.manual_overrides.contains_key(&signature) {
            return None;
        }
        if let Some(existing) = self.conflicts.iter().find(|c| c.signature == signature && c.status == ConflictStatus::Open) {
            return Some(existing.clone());
        }

        let conflict = Conflict {
            id: format!("conflict_{}", self.next_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst)),
            entity_id: incoming.id.clone(),
            kind,
            signature,
            persisted: persisted.clone(),
            incoming: incoming.clone(),
            status: ConflictStatus::Open,
            detected_at: Utc::now(),
            resolved_value: None,
        };
        self.conflicts.insert(conflict.id.clone(), conflict.clone());
        Some(conflict)
    }

    /// Run the priority-ordered strategy list; the first applicable one
    /// resolves the conflict and its result becomes the persisted entity.
    pub fn auto_resolve(&self, conflict_id: &str) -> Result<Entity, ConflictUnresolved> {
        let mut entry = self.conflicts.get_mut(conflict_id).ok_or_else(|| ConflictUnresolved {
            entity_id: conflict_id.to_string(),
            reason: "unknown conflict".to_string(),
        })?;

        let Some(strategy) = self.strategies.iter().find(|s| s.can_handle(&entry)) else {
            return Err(ConflictUnresolved { entity_id: entry.entity_id.clone(), reason: "no applicable strategy".to_string() });
        };
        let resolved = strategy.resolve(&entry);
        entry.status = ConflictStatus::Resolved;
        entry.resolved_value = Some(resolved.clone());
        Ok(resolved)
    }

    /// Resolve manually with a caller-supplied value, remembering the
    /// signature so future detections of the same divergence no-op.
    pub fn resolve_manually(&self, conflict_id: &str, resolved_value: Entity) -> Result<(), ConflictUnresolved> {
        let mut entry = self.conflicts.get_mut(conflict_id).ok_or_else(|| ConflictUnresolved {
            entity_id: conflict_id.to_string(),
            reason: "unknown conflict".to_string(),
        })?;
        entry.status = ConflictStatus::Resolved;
        entry.resolved_value = Some(resolved_value.clone());
        self.manual_overrides.insert(entry.signature.clone(), resolved_value);
        Ok(())
    }

    pub fn get_unresolved(&self) -> Vec<Conflict> {
        self.conflicts.iter().filter(|c| c.status == ConflictStatus::Open).map(|c| c.clone()).collect()
    }

    pub fn get(&self, conflict_id: &str) -> Option<Conflict> {
        self.conflicts.get(conflict_id).map(|c| c.clone())
    }
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::{EntityAttrs, EntityKind};
    use std::collections::HashMap;

    fn entity(owner: &str) -> Entity {
        let now = Utc::now();
        let mut metadata = HashMap::new();
        metadata.insert("owner".to_string(), owner.to_string());
        Entity {
            id: "file:a.ts".to_string(),
            kind: EntityKind::File,
            path: "a.ts".to_string(),
            content_hash: "h1".to_string(),
            language: None,
            created: now,
            last_modified: now,
            metadata,
            attrs: EntityAttrs::File { extension: "ts".into(), size_bytes: 0, line_count: 0, is_test: false, is_config: false, dependencies: Vec::new() },
        }
    }

    #[test]
    fn identical_entities_produce_no_conflict() {
        let resolver = ConflictResolver::new();
        let e = entity("A");
        assert!(resolver.detect(&e, &e, ConflictKind::EntityVersion).is_none());
    }

    #[test]
    fn manual_override_suppresses_future_detections_of_same_signature() {
        let resolver = ConflictResolver::new();
        let persisted = entity("A");
        let incoming = entity("B");

        let c1 = resolver.detect(&persisted, &incoming, ConflictKind::EntityVersion).unwrap();
        assert_eq!(resolver.get_unresolved().len(), 1);

        resolver.resolve_manually(&c1.id, persisted.clone()).unwrap();
        assert_eq!(resolver.get_unresolved().len(), 0);

        let c2 = resolver.detect(&persisted, &incoming, ConflictKind::EntityVersion);
        assert!(c2.is_none());
        assert_eq!(resolver.get_unresolved().len(), 0);
    }

    #[test]
    fn repeated_open_detection_dedupes_by_signature() {
        let resolver = ConflictResolver::new();
        let persisted = entity("A");
        let incoming = entity("B");

        let c1 = resolver.detect(&persisted, &incoming, ConflictKind::EntityVersion).unwrap();
        let c2 = resolver.detect(&persisted, &incoming, ConflictKind::EntityVersion).unwrap();
        assert_eq!(c1.id, c2.id);
        assert_eq!(resolver.get_unresolved().len(), 1);
    }

    #[test]
    fn skip_deletions_preempts_last_write_wins_for_deletion_conflicts() {
        let resolver = ConflictResolver::new();
        let persisted = entity("A");
        let incoming = entity("B");
        let conflict = resolver.detect(&persisted, &incoming, ConflictKind::EntityDeletion).unwrap();

        let resolved = resolver.auto_resolve(&conflict.id).unwrap();
        assert_eq!(resolved.metadata.get("owner"), Some(&"A".to_string()));
    }

    #[test]
    fn last_write_wins_is_the_fallback_for_version_conflicts_without_property_merge() {
        let resolver = ConflictResolver::new();
        let persisted = entity("A");
        let incoming = entity("B");
        let conflict = resolver.detect(&persisted, &incoming, ConflictKind::EntityVersion).unwrap();

        // property-merge (priority 50) handles EntityVersion before last-write-wins (100).
        let resolved = resolver.auto_resolve(&conflict.id).unwrap();
        assert_eq!(resolved.content_hash, incoming.content_hash);
    }
}
