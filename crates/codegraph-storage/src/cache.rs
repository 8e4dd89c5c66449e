//! Optional cache adapter contract.

use std::time::Duration;

use async_trait::async_trait;
use codegraph_core::StorageError;

#[async_trait]
pub trait CacheAdapter: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StorageError>;
    async fn del(&self, key: &str) -> Result<(), StorageError>;
}
