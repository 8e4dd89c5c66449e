//! The Knowledge Graph Service: CRUD over entities/relationships, bounded
//! path and traversal queries, structural and semantic search, and vector
//! maintenance — sitting atop `codegraph-core`'s in-memory graph and the
//! `codegraph-storage` adapter contracts.

pub mod query;
pub mod service;
pub mod vector_sync;

pub use query::{PathQuery, StructuralFilters, TraverseQuery};
pub use service::KnowledgeGraphService;
pub use vector_sync::entity_vector_id;
