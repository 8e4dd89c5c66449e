//! Synchronization coordinator: turns parser output into graph mutations
//! under a rollback point, detecting and resolving conflicts against the
//! persisted graph, with metrics/health exposed via [`monitor::Monitor`].

pub mod conflict;
pub mod coordinator;
pub mod monitor;
pub mod operation;
pub mod rollback;

pub use conflict::{Conflict, ConflictKind, ConflictResolver, ConflictStatus, LastWriteWins, PropertyMerge, ResolutionStrategy, SkipDeletions};
pub use coordinator::{SyncCoordinator, SyncOutcome};
pub use monitor::{Alert, AlertSeverity, Health, LogEntry, Metrics, Monitor, PerformanceMetrics};
pub use operation::{Operation, OperationCounters, OperationStatus, OperationType};
pub use rollback::{MutationAction, MutationRecord, RollbackManager, RollbackMode, RollbackResult, RollbackValue};
