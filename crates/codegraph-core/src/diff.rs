//! Snapshot diffing used by the sync coordinator's state-based rollback
//! mode: take two `(entities, relationships)` snapshots and describe what
//! changed between them, independent of how either snapshot was produced.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, RelationshipId};
use crate::model::{Entity, Relationship};

/// The set of changes between an old and a new graph snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDiff {
    pub added_entities: Vec<Entity>,
    pub removed_entities: Vec<EntityId>,
    pub modified_entities: Vec<Entity>,
    pub added_relationships: Vec<Relationship>,
    pub removed_relationships: Vec<RelationshipId>,
}

impl GraphDiff {
    pub fn is_empty(&self) -> bool {
        self.added_entities.is_empty()
            && self.removed_entities.is_empty()
            && self.modified_entities.is_empty()
            && self.added_relationships.is_empty()
            && self.removed_relationships.is_empty()
    }
}

/// Compare two entity/relationship snapshots and produce the diff between
/// them. An entity present in both but with a different `content_hash` (or,
/// lacking a file-level hash, a different serialized form) counts as
/// modified rather than added+removed.
pub fn diff_snapshots(
    old_entities: &[Entity],
    new_entities: &[Entity],
    old_relationships: &[Relationship],
    new_relationships: &[Relationship],
) -> GraphDiff {
    let old_by_id: HashMap<&str, &Entity> = old_entities.iter().map(|e| (e.id.as_str(), e)).collect();
    let new_by_id: HashMap<&str, &Entity> = new_entities.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut diff = GraphDiff::default();

    for entity in new_entities {
        match old_by_id.get(entity.id.as_str()) {
            None => diff.added_entities.push(entity.clone()),
            Some(old) if old.content_hash != entity.content_hash => {
                diff.modified_entities.push(entity.clone());
            }
            Some(_) => {}
        }
    }
    for entity in old_entities {
        if !new_by_id.contains_key(entity.id.as_str()) {
            diff.removed_entities.push(entity.id.clone());
        }
    }

    let old_rel_ids: std::collections::HashSet<&str> = old_relationships.iter().map(|r| r.id.as_str()).collect();
    let new_rel_ids: std::collections::HashSet<&str> = new_relationships.iter().map(|r| r.id.as_str()).collect();

    for rel in new_relationships {
        if !old_rel_ids.contains(rel.id.as_str()) {
            diff.added_relationships.push(rel.clone());
        }
    }
    for rel in old_relationships {
        if !new_rel_ids.contains(rel.id.as_str()) {
            diff.removed_relationships.push(rel.id.clone());
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_file_entity;

    #[test]
    fn detects_added_and_removed_entities() {
        let old = vec![sample_file_entity("a.rs")];
        let new = vec![sample_file_entity("a.rs"), sample_file_entity("b.rs")];

        let diff = diff_snapshots(&old, &new, &[], &[]);
        assert_eq!(diff.added_entities.len(), 1);
        assert_eq!(diff.added_entities[0].path, "b.rs");
        assert!(diff.removed_entities.is_empty());
    }

    #[test]
    fn detects_modified_entities_by_content_hash() {
        let old_entity = sample_file_entity("a.rs");
        let mut new_entity = old_entity.clone();
        new_entity.content_hash = "different".to_string();

        let diff = diff_snapshots(&[old_entity], &[new_entity], &[], &[]);
        assert_eq!(diff.modified_entities.len(), 1);
        assert!(diff.added_entities.is_empty());
    }

    #[test]
    fn empty_diff_is_empty() {
        let snapshot = vec![sample_file_entity("a.rs")];
        let diff = diff_snapshots(&snapshot, &snapshot, &[], &[]);
        assert!(diff.is_empty());
    }
}
