//! Property graph adapter contract.

use std::collections::HashMap;

use async_trait::async_trait;
use codegraph_core::{Entity, Relationship, StorageError};

use crate::value::QueryValue;

/// A single row of a property-graph query result.
pub type Row = HashMap<String, QueryValue>;

#[async_trait]
pub trait PropertyGraphAdapter: Send + Sync {
    /// A parameterized, cypher-like query. Engines that only support
    /// templated queries must escape parameters themselves (see
    /// [`crate::escape::escape_value`]) before splicing them in.
    async fn query(&self, query: &str, params: &HashMap<String, QueryValue>) -> Result<Vec<Row>, StorageError>;

    /// A raw, engine-specific administrative command (e.g. index
    /// creation) with positional arguments.
    async fn command(&self, args: &[QueryValue]) -> Result<QueryValue, StorageError>;

    async fn bulk_upsert_nodes(&self, nodes: &[Entity]) -> Result<(), StorageError>;
    async fn bulk_upsert_edges(&self, edges: &[Relationship]) -> Result<(), StorageError>;
    async fn delete_node(&self, id: &str) -> Result<(), StorageError>;
    async fn delete_edge(&self, id: &str) -> Result<(), StorageError>;
}
