//! The per-language extraction contract: turn one file's source text into
//! entities and relationships, given enough project context to resolve
//! same-file and cross-file references.

use std::path::Path;

use codegraph_core::{Entity, NoiseConfig, ParseError, Relationship};

use crate::resolution::ProjectContext;

/// One file's extracted graph fragment, plus any parse-level diagnostics
/// that shouldn't abort the whole run (§4.4 "errors are recorded, not
/// fatal").
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub errors: Vec<ParseError>,
}

impl ExtractionResult {
    pub fn merge(&mut self, other: ExtractionResult) {
        self.entities.extend(other.entities);
        self.relationships.extend(other.relationships);
        self.errors.extend(other.errors);
    }
}

/// Everything an extractor needs beyond the raw source: the repo-relative
/// path it's parsing, the noise/confidence thresholds from config, and
/// the project context used to resolve cross-file references.
pub struct ExtractionContext<'a> {
    pub repo_relative_path: &'a str,
    pub noise: &'a NoiseConfig,
    pub project: &'a ProjectContext,
}

pub trait LanguageExtractor: Send + Sync {
    fn extract(&self, path: &Path, source: &str, ctx: &ExtractionContext) -> ExtractionResult;
}
