//! In-process observability for the sync pipeline: running metrics,
//! derived health, alerts, and a rolling event log.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

const MAX_LOG_ENTRIES: usize = 1000;
const MAX_ALERTS: usize = 100;
/// Consecutive failures at or above this count mark health `unhealthy`.
const UNHEALTHY_CONSECUTIVE_FAILURES: u32 = 3;
/// Error rate at or above this fraction (over the recorded window) marks
/// health `degraded` rather than `healthy`.
const DEGRADED_ERROR_RATE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub id: u64,
    pub severity: AlertSeverity,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Coarse operation counters and throughput, accumulated since startup.
#[derive(Debug, Default)]
pub struct Metrics {
    pub operations_total: u64,
    pub operations_succeeded: u64,
    pub operations_failed: u64,
    pub total_sync_time_ms: u64,
    pub entities_processed: u64,
    pub relationships_processed: u64,
}

impl Metrics {
    pub fn average_sync_time_ms(&self) -> f64 {
        if self.operations_total == 0 {
            0.0
        } else {
            self.total_sync_time_ms as f64 / self.operations_total as f64
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.operations_total == 0 {
            0.0
        } else {
            self.operations_failed as f64 / self.operations_total as f64
        }
    }

    /// Operations per minute, given the window (in ms) they were observed over.
    pub fn throughput_per_min(&self, window_ms: u64) -> f64 {
        if window_ms == 0 {
            0.0
        } else {
            self.operations_total as f64 * 60_000.0 / window_ms as f64
        }
    }
}

/// Timing for the pipeline's own phases, separate from operation counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerformanceMetrics {
    pub avg_parse_time_ms: f64,
    pub avg_graph_update_time_ms: f64,
    pub avg_embedding_time_ms: f64,
    pub memory_bytes: u64,
}

struct MonitorState {
    metrics: Metrics,
    performance: PerformanceMetrics,
    consecutive_failures: u32,
    log: VecDeque<LogEntry>,
    alerts: VecDeque<Alert>,
    next_alert_id: u64,
}

/// Thread-safe observer of coordinator events. Cheap to clone via `Arc` and
/// share between the coordinator and any reporting surface.
pub struct Monitor {
    state: Mutex<MonitorState>,
    operation_counter: AtomicU64,
}

impl Monitor {
    pub fn new() -> Self {
        Monitor {
            state: Mutex::new(MonitorState {
                metrics: Metrics::default(),
                performance: PerformanceMetrics::default(),
                consecutive_failures: 0,
                log: VecDeque::with_capacity(MAX_LOG_ENTRIES),
                alerts: VecDeque::with_capacity(MAX_ALERTS),
                next_alert_id: 1,
            }),
            operation_counter: AtomicU64::new(0),
        }
    }

    pub fn record_operation_completed(&self, duration_ms: u64, entities: u64, relationships: u64) {
        let mut state = self.state.lock().unwrap();
        state.metrics.operations_total += 1;
        state.metrics.operations_succeeded += 1;
        state.metrics.total_sync_time_ms += duration_ms;
        state.metrics.entities_processed += entities;
        state.metrics.relationships_processed += relationships;
        state.consecutive_failures = 0;
        self.log(&mut state, format!("operation completed in {duration_ms}ms"));
    }

    pub fn record_operation_failed(&self, duration_ms: u64, reason: &str) {
        let mut state = self.state.lock().unwrap();
        state.metrics.operations_total += 1;
        state.metrics.operations_failed += 1;
        state.metrics.total_sync_time_ms += duration_ms;
        state.consecutive_failures += 1;
        self.log(&mut state, format!("operation failed: {reason}"));

        if state.consecutive_failures >= UNHEALTHY_CONSECUTIVE_FAILURES {
            self.raise_alert_locked(&mut state, AlertSeverity::Critical, format!("{} consecutive operation failures", state.consecutive_failures));
        } else {
            self.raise_alert_locked(&mut state, AlertSeverity::Warning, reason.to_string());
        }
    }

    pub fn record_performance(&self, parse_ms: f64, graph_update_ms: f64, embedding_ms: f64, memory_bytes: u64) {
        let mut state = self.state.lock().unwrap();
        state.performance = PerformanceMetrics {
            avg_parse_time_ms: parse_ms,
            avg_graph_update_time_ms: graph_update_ms,
            avg_embedding_time_ms: embedding_ms,
            memory_bytes,
        };
    }

    pub fn raise_alert(&self, severity: AlertSeverity, message: impl Into<String>) -> u64 {
        let mut state = self.state.lock().unwrap();
        self.raise_alert_locked(&mut state, severity, message.into())
    }

    fn raise_alert_locked(&self, state: &mut MonitorState, severity: AlertSeverity, message: String) -> u64 {
        let id = state.next_alert_id;
        state.next_alert_id += 1;
        if state.alerts.len() >= MAX_ALERTS {
            state.alerts.pop_front();
        }
        state.alerts.push_back(Alert { id, severity, message, raised_at: Utc::now(), resolved_at: None });
        id
    }

    pub fn resolve_alert(&self, id: u64) {
        let mut state = self.state.lock().unwrap();
        if let Some(alert) = state.alerts.iter_mut().find(|a| a.id == id) {
            alert.resolved_at = Some(Utc::now());
        }
    }

    fn log(&self, state: &mut MonitorState, message: String) {
        if state.log.len() >= MAX_LOG_ENTRIES {
            state.log.pop_front();
        }
        state.log.push_back(LogEntry { at: Utc::now(), message });
    }

    pub fn next_operation_id(&self) -> u64 {
        self.operation_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Overall health: `unhealthy` on a run of consecutive failures,
    /// `degraded` on an elevated error rate, `healthy` otherwise.
    pub fn health(&self) -> Health {
        let state = self.state.lock().unwrap();
        if state.consecutive_failures >= UNHEALTHY_CONSECUTIVE_FAILURES {
            Health::Unhealthy
        } else if state.metrics.error_rate() >= DEGRADED_ERROR_RATE {
            Health::Degraded
        } else {
            Health::Healthy
        }
    }

    pub fn metrics_snapshot(&self) -> (u64, u64, u64, f64, f64) {
        let state = self.state.lock().unwrap();
        (
            state.metrics.operations_total,
            state.metrics.operations_succeeded,
            state.metrics.operations_failed,
            state.metrics.average_sync_time_ms(),
            state.metrics.error_rate(),
        )
    }

    pub fn performance(&self) -> PerformanceMetrics {
        self.state.lock().unwrap().performance
    }

    pub fn recent_log(&self, limit: usize) -> Vec<LogEntry> {
        let state = self.state.lock().unwrap();
        state.log.iter().rev().take(limit).cloned().collect()
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.state.lock().unwrap().alerts.iter().filter(|a| a.resolved_at.is_none()).cloned().collect()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}
