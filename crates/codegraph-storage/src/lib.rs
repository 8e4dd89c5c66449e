//! Narrow storage adapter contracts the synchronization pipeline consumes:
//! a property graph, a vector index, a relational store, and an optional
//! cache — plus the embedding provider contract. Concrete engines (a real
//! graph database, vector database, or SQL engine) are out of scope; this
//! crate ships the contracts and an in-memory reference implementation of
//! each, sufficient to drive the coordinator and knowledge-graph service
//! end to end in tests and in the CLI's local-only mode.

pub mod embedding;
pub mod escape;
pub mod memory;
pub mod value;

pub mod cache;
pub mod graph_store;
pub mod relational;
pub mod vector;

pub use cache::CacheAdapter;
pub use embedding::{deterministic_fallback_vector, EmbeddingProvider};
pub use graph_store::PropertyGraphAdapter;
pub use relational::RelationalAdapter;
pub use value::QueryValue;
pub use vector::{
    DistanceMetric, PayloadFilter, VectorHit, VectorPoint, VectorQuery, VectorStoreAdapter, CODE_EMBEDDINGS,
    DOCUMENTATION_EMBEDDINGS, INTEGRATION_TEST_EMBEDDINGS, VECTOR_DIMENSIONS,
};

pub use memory::{InMemoryCache, InMemoryGraphStore, InMemoryRelationalStore, InMemoryVectorStore};
