//! Vector store adapter contract. The core maintains exactly one vector
//! record per entity, keyed by a stable numeric id derived from the
//! entity's string id (see `codegraph-kg`), across three collections.

use std::collections::HashMap;

use async_trait::async_trait;
use codegraph_core::StorageError;

use crate::value::QueryValue;

pub const CODE_EMBEDDINGS: &str = "code_embeddings";
pub const DOCUMENTATION_EMBEDDINGS: &str = "documentation_embeddings";
pub const INTEGRATION_TEST_EMBEDDINGS: &str = "integration_test_embeddings";
pub const VECTOR_DIMENSIONS: usize = 1536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Cosine,
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, QueryValue>,
}

#[derive(Debug, Clone)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    pub limit: usize,
    pub with_payload: bool,
    pub filter: Option<PayloadFilter>,
}

/// An equality filter on one payload field, e.g. `entityId == "file:a.ts"`.
#[derive(Debug, Clone)]
pub struct PayloadFilter {
    pub key: String,
    pub value: QueryValue,
}

#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: u64,
    pub score: f32,
    pub payload: HashMap<String, QueryValue>,
}

#[async_trait]
pub trait VectorStoreAdapter: Send + Sync {
    async fn create_collection(&self, name: &str, size: usize, distance: DistanceMetric) -> Result<(), StorageError>;
    async fn upsert(&self, collection: &str, point: VectorPoint) -> Result<(), StorageError>;
    async fn search(&self, collection: &str, query: VectorQuery) -> Result<Vec<VectorHit>, StorageError>;
    async fn delete(&self, collection: &str, filter: &PayloadFilter) -> Result<(), StorageError>;
}

/// Cosine similarity between two equal-length vectors. Returns 0.0 for a
/// degenerate (zero-norm) input rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }
}
