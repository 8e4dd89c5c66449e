//! Synchronization operation lifecycle: the unit of work the coordinator
//! tracks from `begin` through `complete`/`fail`.

use chrono::{DateTime, Utc};

use codegraph_core::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    FullSync,
    IncrementalSync,
    SingleFile,
}

/// Running totals of graph mutations performed during an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounters {
    pub entities_created: u32,
    pub entities_updated: u32,
    pub entities_deleted: u32,
    pub relationships_created: u32,
    pub relationships_updated: u32,
    pub relationships_deleted: u32,
    pub files_processed: u32,
}

/// One synchronization operation: id, type, timing, status, running
/// counters, and any parse errors accumulated along the way.
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: String,
    pub operation_type: OperationType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: OperationStatus,
    pub counters: OperationCounters,
    pub errors: Vec<ParseError>,
    /// The rollback point created when this operation began.
    pub rollback_point_id: String,
}

impl Operation {
    pub fn begin(id: impl Into<String>, operation_type: OperationType, rollback_point_id: impl Into<String>) -> Self {
        Operation {
            id: id.into(),
            operation_type,
            start_time: Utc::now(),
            end_time: None,
            status: OperationStatus::Running,
            counters: OperationCounters::default(),
            errors: Vec::new(),
            rollback_point_id: rollback_point_id.into(),
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time.unwrap_or_else(Utc::now) - self.start_time
    }

    pub fn complete(&mut self) {
        self.status = OperationStatus::Completed;
        self.end_time = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = OperationStatus::Failed;
        self.end_time = Some(Utc::now());
    }

    pub fn record_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}
