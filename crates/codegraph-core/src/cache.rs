//! On-disk snapshot cache for the graph, keyed at the repository root.

use std::path::{Path, PathBuf};

use crate::graph::Graph;
use crate::model::{Entity, Relationship};
use serde::{Deserialize, Serialize};

pub const CACHE_DIR: &str = ".codegraph";
pub const GRAPH_CACHE: &str = "graph.bin";

pub fn cache_dir(root: &Path) -> PathBuf {
    root.join(CACHE_DIR)
}

pub fn graph_cache_path(root: &Path) -> PathBuf {
    cache_dir(root).join(GRAPH_CACHE)
}

pub fn ensure_cache_dir(root: &Path) -> std::io::Result<()> {
    let cache = cache_dir(root);
    if !cache.exists() {
        std::fs::create_dir_all(&cache)?;
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: String,
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
}

/// Serialize the full graph (bincode) to `<root>/.codegraph/graph.bin`.
pub fn save_graph(graph: &Graph, root: &Path) -> anyhow::Result<()> {
    ensure_cache_dir(root)?;
    let path = graph_cache_path(root);

    let snapshot = Snapshot {
        version: env!("CARGO_PKG_VERSION").to_string(),
        entities: graph.all_entities(),
        relationships: graph.all_relationships(),
    };
    let bytes = bincode::serialize(&snapshot)?;
    std::fs::write(&path, bytes)?;

    tracing::debug!(
        path = %path.display(),
        entities = snapshot.entities.len(),
        relationships = snapshot.relationships.len(),
        "graph cache saved"
    );
    Ok(())
}

/// Load a previously saved graph, or `None` if no cache exists.
pub fn load_graph(root: &Path) -> anyhow::Result<Option<Graph>> {
    let path = graph_cache_path(root);
    if !path.exists() {
        return Ok(None);
    }

    let bytes = std::fs::read(&path)?;
    let snapshot: Snapshot = bincode::deserialize(&bytes)?;

    let mut graph = Graph::new();
    for entity in snapshot.entities {
        graph.upsert_entity(entity);
    }
    for rel in snapshot.relationships {
        graph.upsert_relationship(rel);
    }

    tracing::debug!(path = %path.display(), "graph cache loaded");
    Ok(Some(graph))
}

pub fn clear_cache(root: &Path) -> std::io::Result<()> {
    let cache = cache_dir(root);
    if cache.exists() {
        std::fs::remove_dir_all(&cache)?;
    }
    Ok(())
}

/// Invalidate the cache for a single file. The current cache format is a
/// whole-graph snapshot, so this drops the entire cache; a future format
/// keyed per-file could invalidate more granularly.
pub fn invalidate_file_cache(root: &Path, _file: &Path) -> anyhow::Result<()> {
    clear_cache(root)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let mut graph = Graph::new();
        graph.upsert_entity(crate::test_utils::sample_file_entity("src/lib.rs"));

        save_graph(&graph, dir.path()).unwrap();
        let loaded = load_graph(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.entity_count(), graph.entity_count());
    }

    #[test]
    fn missing_cache_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_graph(dir.path()).unwrap().is_none());
    }
}
