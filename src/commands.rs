//! CLI command implementations: each wires the crates in
//! `codegraph-core`/`-parser`/`-sync` together for one invocation, then
//! prints a human-readable summary. Library-level structured results stay
//! structured; only this layer turns them into terminal output.

use std::path::PathBuf;
use std::sync::Arc;

use codegraph_core::{Config, Graph};
use codegraph_parser::ParserCoordinator;
use codegraph_sync::{Health, OperationType, SyncCoordinator};
use ignore::WalkBuilder;
use tokio::sync::RwLock;

/// Run a full sync operation (§4.6) over every file under `root`: walk the
/// tree honoring `.gitignore`, hash-gate each file through the incremental
/// parser, and fold the result into a fresh in-memory graph via the
/// coordinator, one file at a time so each gets its own rollback point.
pub async fn index(root: PathBuf) -> anyhow::Result<()> {
    let root = root.canonicalize().unwrap_or(root);
    tracing::info!("indexing repository: {}", root.display());

    let config = Config::from_env();
    let parser = ParserCoordinator::new(root.clone(), config.noise.clone(), config.max_export_depth);

    let graph = match codegraph_core::load_graph(&root) {
        Ok(Some(g)) => {
            tracing::debug!("resuming from cached graph");
            g
        }
        _ => Graph::new(),
    };
    let coordinator = SyncCoordinator::new(Arc::new(RwLock::new(graph)));

    let mut files_seen = 0usize;
    let mut parse_errors = 0usize;
    let mut unresolved_total = 0usize;

    for entry in WalkBuilder::new(&root).hidden(true).git_ignore(true).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("cannot walk entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        if path.starts_with(codegraph_core::cache_dir(&root)) {
            continue;
        }

        let file_rel = path.strip_prefix(&root).unwrap_or(path).to_string_lossy().replace('\\', "/");
        let result = parser.parse_file_incremental(path);
        files_seen += 1;
        parse_errors += result.errors.len();

        if result.is_incremental {
            continue;
        }

        let outcome = coordinator
            .run_file_sync(OperationType::FullSync, &file_rel, result.entities, result.relationships, result.errors)
            .await;
        unresolved_total += outcome.unresolved_conflicts.len();
    }

    let graph_handle = coordinator.graph_handle();
    let graph = graph_handle.read().await;
    codegraph_core::save_graph(&graph, &root)?;

    let (ops_total, ops_succeeded, ops_failed, avg_sync_ms, error_rate) = coordinator.monitor().metrics_snapshot();
    tracing::info!(
        "indexed {} files ({} entities, {} relationships); {} sync operations ({} ok, {} failed, {:.1}ms avg, {:.1}% error rate)",
        files_seen,
        graph.entity_count(),
        graph.relationship_count(),
        ops_total,
        ops_succeeded,
        ops_failed,
        avg_sync_ms,
        error_rate * 100.0,
    );
    if parse_errors > 0 {
        tracing::warn!("{parse_errors} per-file parse error(s) encountered; affected files still produced a File entity");
    }
    if unresolved_total > 0 {
        tracing::warn!("{unresolved_total} conflict(s) left unresolved against the persisted graph");
    }
    match coordinator.monitor().health() {
        Health::Healthy => tracing::info!("pipeline health: healthy"),
        Health::Degraded => tracing::warn!("pipeline health: degraded"),
        Health::Unhealthy => tracing::error!("pipeline health: unhealthy"),
    }

    Ok(())
}

/// Wipe the on-disk graph cache for `root`.
pub fn clear(root: PathBuf) -> anyhow::Result<()> {
    tracing::info!("clearing cache for: {}", root.display());
    codegraph_core::clear_cache(&root)?;
    tracing::info!("cache cleared");
    Ok(())
}
