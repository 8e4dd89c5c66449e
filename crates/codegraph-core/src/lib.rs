//! Core data model for the code knowledge graph: deterministic ids, the
//! entity/relationship schema, the in-memory graph store, confidence
//! scoring, configuration, and the shared error taxonomy.

pub mod cache;
pub mod config;
pub mod diff;
pub mod error;
pub mod graph;
pub mod ids;
pub mod model;
pub mod scoring;
pub mod symbols;
pub mod workspace;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod tests;

pub use cache::{cache_dir, clear_cache, ensure_cache_dir, graph_cache_path, invalidate_file_cache, load_graph, save_graph, CACHE_DIR, GRAPH_CACHE};
pub use config::{Config, Severity};
pub use diff::{diff_snapshots, GraphDiff};
pub use error::{ConflictUnresolved, InvariantViolation, ParseError, ParseSeverity, ResolutionDegraded, RollbackStepError, StorageError, SyncError};
pub use graph::Graph;
pub use ids::{dir_id, file_id, rel_id, sha1_hex, sha256_hex, symbol_id, test_id, EntityId, RelationshipId};
pub use model::{
    ClassAttrs, Coverage, EdgeSource, Entity, EntityAttrs, EntityKind, Evidence, FunctionAttrs, InterfaceAttrs,
    IssueSeverity, Language, Location, Parameter, RefKind, Relationship, RelationshipKind, Resolution, Scope,
    SymbolKind, TestExecution, TestType, TypeAliasAttrs, Visibility,
};
pub use scoring::{score_inferred_edge, InferredEdgeInputs, NoiseConfig};
pub use symbols::SymbolTable;
pub use workspace::{detect_workspace, WorkspaceType};
