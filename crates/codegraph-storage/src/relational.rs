//! Relational adapter contract, covering the `documents`/`sessions`/
//! `changes`/`test_results` tables produced by external collaborators
//! (test ingestion, session tracking) and consumed here for correlation.

use std::time::Duration;

use async_trait::async_trait;
use codegraph_core::StorageError;

use crate::value::QueryValue;
use crate::graph_store::Row;

/// One statement of a transaction or bulk batch: SQL text plus positional
/// parameters.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<QueryValue>,
}

#[async_trait]
pub trait RelationalAdapter: Send + Sync {
    async fn query(&self, sql: &str, params: &[QueryValue], timeout: Option<Duration>) -> Result<Vec<Row>, StorageError>;

    /// Run `statements` as a single all-or-nothing transaction. The spec's
    /// `transaction(fn)` callback form assumes a live connection handle
    /// threaded through a closure, which is exactly the concrete-engine
    /// detail the core is not responsible for; the reference adapter here
    /// instead takes the statement list the caller would have issued
    /// inside that closure and applies it atomically.
    async fn transaction(&self, statements: &[Statement]) -> Result<(), StorageError>;

    /// Run every statement independently; when `continue_on_error` is
    /// true a failing statement doesn't stop the rest and its error is
    /// reported per-item instead of aborting the batch.
    async fn bulk_query(&self, statements: &[Statement], continue_on_error: bool) -> Result<Vec<Result<u64, StorageError>>, StorageError>;
}
