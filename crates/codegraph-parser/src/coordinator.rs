//! The parser's top-level contract (§4.4): `parse_file`, `parse_many`, and
//! the hash-gated `parse_file_incremental`. Everything below this module
//! (extractors, resolution, support) is pure per-file logic; this is the
//! only place that owns state across calls — the per-file parse cache that
//! makes incremental re-parses cheap and the added/updated/removed diff
//! possible.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use codegraph_core::{
    file_id, sha256_hex, Entity, EntityAttrs, EntityId, EntityKind, Language, NoiseConfig, ParseError, ParseSeverity,
    Relationship, RelationshipId,
};
use dashmap::DashMap;
use rayon::prelude::*;

use crate::config as fileconfig;
use crate::extractor::{ExtractionContext, ExtractionResult};
use crate::languages::extractor_for;
use crate::resolution::ProjectContext;
use crate::support::{repo_relative, synthesize_directories};

/// Result of a full, non-incremental parse of one file.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub errors: Vec<ParseError>,
}

/// Result of a hash-gated incremental parse (§4.4, §8 invariant 3).
#[derive(Debug, Clone, Default)]
pub struct IncrementalParseOutput {
    pub is_incremental: bool,
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub errors: Vec<ParseError>,
    pub added: Vec<EntityId>,
    pub updated: Vec<EntityId>,
    pub removed: Vec<EntityId>,
    pub added_relationships: Vec<Relationship>,
    pub removed_relationships: Vec<RelationshipId>,
}

/// Result of `parse_many`: per-file failures are recorded as `errors` and
/// never abort the batch (§4.4 "Failure semantics").
#[derive(Debug, Clone, Default)]
pub struct AggregateParseOutput {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub errors: Vec<ParseError>,
    pub files_processed: usize,
}

/// What the coordinator remembers about the last parse of one file, keyed
/// by repo-relative path: enough to answer "did anything change" without
/// re-reading the previous entities/relationships from the graph service.
#[derive(Clone, Default)]
struct FileCacheEntry {
    content_hash: String,
    /// symbol name -> its content hash, as of the last parse of this file.
    symbol_hashes: HashMap<String, String>,
    /// symbol name -> its entity id, as of the last parse of this file.
    symbol_ids: HashMap<String, EntityId>,
    relationships: Vec<Relationship>,
}

/// Turns files into entities/relationships. Owns the project-wide
/// resolution context (path aliases, export-map cache) and the per-file
/// incremental cache; safe to share across worker threads (`parse_many`
/// dispatches across a rayon pool internally).
pub struct ParserCoordinator {
    repo_root: PathBuf,
    noise: NoiseConfig,
    project: ProjectContext,
    cache: DashMap<String, FileCacheEntry>,
}

impl ParserCoordinator {
    pub fn new(repo_root: impl Into<PathBuf>, noise: NoiseConfig, max_export_depth: u32) -> Self {
        let repo_root = repo_root.into();
        ParserCoordinator {
            project: ProjectContext::new(repo_root.clone(), max_export_depth),
            repo_root,
            noise,
            cache: DashMap::new(),
        }
    }

    /// A full pass over one file: always re-extracts, regardless of any
    /// cached hash. `parse_many` and the first call to
    /// `parse_file_incremental` for a given file both go through this.
    pub fn parse_file(&self, path: &Path) -> ParseOutput {
        let file_rel = repo_relative(&self.repo_root, path);
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                return ParseOutput {
                    entities: Vec::new(),
                    relationships: Vec::new(),
                    errors: vec![ParseError {
                        path: file_rel,
                        line: 1,
                        column: 1,
                        message: format!("failed to read file: {e}"),
                        severity: ParseSeverity::Error,
                    }],
                };
            }
        };

        let content_hash = sha256_hex(&bytes);
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let language = Language::from_path(path);

        let mut entities = Vec::new();
        let mut relationships = Vec::new();
        let mut errors = Vec::new();

        match extractor_for(path) {
            Some(extractor) => {
                let ctx = ExtractionContext { repo_relative_path: &file_rel, noise: &self.noise, project: &self.project };
                let ExtractionResult { entities: e, relationships: r, errors: err } =
                    extractor.extract(path, &text, &ctx);
                entities.extend(e);
                relationships.extend(r);
                errors.extend(err);
            }
            None => {
                // No language extractor for this file type: still synthesize
                // the directory chain so the containment forest covers every
                // file, code or not (§4.4 "Directory synthesis").
                let (dirs, dir_rels) = synthesize_directories(&file_rel);
                entities.extend(dirs);
                relationships.extend(dir_rels);
            }
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_string();
        let line_count = text.lines().count() as u32;
        let is_test = fileconfig::is_test_file(path);
        let is_config = fileconfig::is_config_file(path);
        let dependencies = fileconfig::dependencies_of(path, &text);

        let now = chrono::Utc::now();
        entities.push(Entity {
            id: file_id(&file_rel),
            kind: EntityKind::File,
            path: file_rel.clone(),
            content_hash: content_hash.clone(),
            language: Some(language),
            created: now,
            last_modified: now,
            metadata: HashMap::new(),
            attrs: EntityAttrs::File {
                extension,
                size_bytes: bytes.len() as u64,
                line_count,
                is_test,
                is_config,
                dependencies,
            },
        });

        ParseOutput { entities, relationships, errors }
    }

    /// Hash-gated pass (§4.4, §8 invariant 3): if `path`'s bytes are
    /// unchanged since the last call, returns a zero-delta result without
    /// re-extracting. On a change (including the first call for a path),
    /// runs a full [`Self::parse_file`] and diffs the new symbol set
    /// against the cached one, keyed by `(filePath, name)` per spec.
    pub fn parse_file_incremental(&self, path: &Path) -> IncrementalParseOutput {
        let file_rel = repo_relative(&self.repo_root, path);
        let current_hash = match std::fs::read(path) {
            Ok(bytes) => sha256_hex(&bytes),
            Err(e) => {
                return IncrementalParseOutput {
                    is_incremental: false,
                    errors: vec![ParseError {
                        path: file_rel,
                        line: 1,
                        column: 1,
                        message: format!("failed to read file: {e}"),
                        severity: ParseSeverity::Error,
                    }],
                    ..Default::default()
                };
            }
        };

        if let Some(cached) = self.cache.get(&file_rel) {
            if cached.content_hash == current_hash {
                return IncrementalParseOutput { is_incremental: true, ..Default::default() };
            }
        }

        let ParseOutput { entities, relationships, errors } = self.parse_file(path);

        let mut new_symbol_hashes: HashMap<String, String> = HashMap::new();
        let mut new_symbol_ids: HashMap<String, EntityId> = HashMap::new();
        for e in &entities {
            if let EntityKind::Symbol(_) = e.kind {
                let name = e.display_name().to_string();
                new_symbol_hashes.insert(name.clone(), e.content_hash.clone());
                new_symbol_ids.insert(name, e.id.clone());
            }
        }

        let previous = self.cache.get(&file_rel).map(|c| c.clone());
        let mut added = Vec::new();
        let mut updated = Vec::new();
        let mut removed = Vec::new();
        let mut removed_relationships = Vec::new();

        match &previous {
            None => {
                added.extend(new_symbol_ids.values().cloned());
            }
            Some(prev) => {
                for (name, id) in &new_symbol_ids {
                    match prev.symbol_hashes.get(name) {
                        None => added.push(id.clone()),
                        Some(old_hash) if old_hash != &new_symbol_hashes[name] => updated.push(id.clone()),
                        Some(_) => {}
                    }
                }
                for (name, id) in &prev.symbol_ids {
                    if !new_symbol_hashes.contains_key(name) {
                        removed.push(id.clone());
                    }
                }
                removed_relationships.extend(prev.relationships.iter().map(|r| r.id.clone()));
            }
        }

        self.cache.insert(
            file_rel,
            FileCacheEntry {
                content_hash: current_hash,
                symbol_hashes: new_symbol_hashes,
                symbol_ids: new_symbol_ids,
                relationships: relationships.clone(),
            },
        );

        IncrementalParseOutput {
            is_incremental: false,
            added_relationships: relationships.clone(),
            entities,
            relationships,
            errors,
            added,
            updated,
            removed,
            removed_relationships,
        }
    }

    /// Independent per-file parses, run in parallel across a rayon pool
    /// (§5 "Parsing is CPU-bound and uses worker threads sized to available
    /// cores"). A panic inside one file's extraction is caught and recorded
    /// as a parse error rather than poisoning the batch.
    pub fn parse_many(&self, paths: &[PathBuf]) -> AggregateParseOutput {
        let results: Vec<ParseOutput> = paths
            .par_iter()
            .map(|path| {
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.parse_file(path))).unwrap_or_else(|_| {
                    ParseOutput {
                        entities: Vec::new(),
                        relationships: Vec::new(),
                        errors: vec![ParseError {
                            path: repo_relative(&self.repo_root, path),
                            line: 1,
                            column: 1,
                            message: "parser panicked on this file".into(),
                            severity: ParseSeverity::Error,
                        }],
                    }
                })
            })
            .collect();

        let mut out = AggregateParseOutput { files_processed: results.len(), ..Default::default() };
        for r in results {
            out.entities.extend(r.entities);
            out.relationships.extend(r.relationships);
            out.errors.extend(r.errors);
        }
        out
    }

    /// Invalidate a single file's cached hash/symbol state, e.g. when the
    /// coordinator learns a file was deleted outside of a normal re-parse.
    pub fn forget(&self, path: &Path) {
        let file_rel = repo_relative(&self.repo_root, path);
        self.cache.remove(&file_rel);
    }
}
