//! Query request shapes for the knowledge graph service.

use chrono::{DateTime, Utc};
use codegraph_core::{EntityKind, Language, RelationshipKind};

/// `find_paths({start, end?, types?, maxDepth=5})`, bounded to 10 results
/// by [`codegraph_core::Graph::find_paths`].
#[derive(Debug, Clone)]
pub struct PathQuery {
    pub start: String,
    pub end: Option<String>,
    pub types: Vec<RelationshipKind>,
    pub max_depth: usize,
}

impl PathQuery {
    pub fn new(start: impl Into<String>) -> Self {
        PathQuery { start: start.into(), end: None, types: Vec::new(), max_depth: 5 }
    }
}

/// `traverse({start, types?, maxDepth=3, limit=50})`.
#[derive(Debug, Clone)]
pub struct TraverseQuery {
    pub start: String,
    pub types: Vec<RelationshipKind>,
    pub max_depth: usize,
    pub limit: usize,
}

impl TraverseQuery {
    pub fn new(start: impl Into<String>) -> Self {
        TraverseQuery { start: start.into(), types: Vec::new(), max_depth: 3, limit: 50 }
    }
}

/// `structural_search(filters{types?, pathContains?, language?,
/// modifiedSince?, modifiedUntil?, limit?})`.
#[derive(Debug, Clone, Default)]
pub struct StructuralFilters {
    pub types: Option<Vec<EntityKind>>,
    pub path_contains: Option<String>,
    pub language: Option<Language>,
    pub modified_since: Option<DateTime<Utc>>,
    pub modified_until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}
