//! The closed error taxonomy shared across the pipeline.

use thiserror::Error;

/// Per-file/per-symbol parse failure. Recoverable: the caller keeps the
/// file's entity and continues with the rest of the batch.
#[derive(Debug, Clone, Error)]
#[error("{severity:?} parsing {path}:{line}:{column}: {message}")]
pub struct ParseError {
    pub path: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub severity: ParseSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseSeverity {
    Error,
    Warning,
}

/// A relationship was silently demoted or dropped during resolution. Not
/// propagated as an error — callers observe it by inspecting the returned
/// counts, not by `?`.
#[derive(Debug, Clone)]
pub struct ResolutionDegraded {
    pub reason: String,
}

/// Errors surfaced by a storage adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage call timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("storage query failed: {0}")]
    Query(String),
}

/// A conflict between an incoming entity/relationship and what's persisted
/// could not be auto-resolved by any registered strategy.
#[derive(Debug, Error)]
#[error("unresolved conflict on {entity_id}: {reason}")]
pub struct ConflictUnresolved {
    pub entity_id: String,
    pub reason: String,
}

/// One step of a rollback plan failed to apply.
#[derive(Debug, Error)]
#[error("rollback step failed for {entity_id}: {reason} (recoverable: {recoverable})")]
pub struct RollbackStepError {
    pub entity_id: String,
    pub reason: String,
    pub recoverable: bool,
}

/// A core invariant (see the graph model's containment-forest / id-stability
/// guarantees) was violated. Fatal: the operation rolls back and fails hard.
/// A correct pipeline should never construct this.
#[derive(Debug, Error)]
#[error("invariant violated: {0}")]
pub struct InvariantViolation(pub String);

/// Top-level error returned by synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Conflict(#[from] ConflictUnresolved),
    #[error(transparent)]
    Rollback(#[from] RollbackStepError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}
