//! Cross-file reference resolution shared by all language extractors:
//! wraps [`codegraph_resolver`]'s export-map/specifier resolution behind a
//! filesystem-backed [`ExportSource`] and exposes an import map built from
//! the current file's own import statements.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use codegraph_core::sha256_hex;
use codegraph_resolver::{resolve_specifier, ExportEntry, ExportResolver, ExportSource, FileExports, PathAliasConfig};

use crate::languages::ecma;

/// Project-wide resolution state, long-lived across a whole parse run (or
/// the whole process, for incremental re-syncs): the path-alias config
/// loaded once from `tsconfig.json`, and the export-map cache.
pub struct ProjectContext {
    pub repo_root: PathBuf,
    pub alias_config: PathAliasConfig,
    export_resolver: ExportResolver,
}

impl ProjectContext {
    pub fn new(repo_root: impl Into<PathBuf>, max_export_depth: u32) -> Self {
        let repo_root = repo_root.into();
        let tsconfig_path = repo_root.join("tsconfig.json");
        let alias_config = PathAliasConfig::load(&repo_root, &tsconfig_path);
        ProjectContext { repo_root, alias_config, export_resolver: ExportResolver::new(max_export_depth) }
    }

    /// Resolve an import specifier from `from_file` to an absolute path on
    /// disk, honoring relative paths, `tsconfig` aliases, extension
    /// probing, and index-file fallback.
    pub fn resolve_specifier(&self, specifier: &str, from_file: &Path) -> Option<PathBuf> {
        resolve_specifier(specifier, from_file, &self.alias_config)
    }

    /// The name -> declaration map for `file`, following re-exports.
    pub fn export_map(&self, file: &Path) -> HashMap<String, ExportEntry> {
        let source = FilesystemExportSource { alias_config: &self.alias_config };
        self.export_resolver.export_map(file, &source)
    }
}

/// Reads a file's direct/re-exported names directly off disk for export-map
/// resolution. Only TypeScript/JavaScript files carry a re-export concept;
/// every other extension reports its top-level declarations as direct
/// (depth-0) exports with no re-exports, which is enough for the import
/// resolution chain to terminate at the right declaring file.
struct FilesystemExportSource<'a> {
    alias_config: &'a PathAliasConfig,
}

impl ExportSource for FilesystemExportSource<'_> {
    fn file_exports(&self, file: &Path) -> Option<FileExports> {
        let content = std::fs::read(file).ok()?;
        let text = String::from_utf8_lossy(&content);
        let hash = sha256_hex(&content);
        let is_ts = matches!(file.extension().and_then(|e| e.to_str()), Some("ts") | Some("tsx"));
        let is_js = matches!(file.extension().and_then(|e| e.to_str()), Some("js") | Some("jsx") | Some("mjs") | Some("cjs"));

        let (direct, re_exports) = if is_ts || is_js {
            ecma::scan_exports(&text)
        } else {
            (ecma::scan_top_level_declarations(&text), Vec::new())
        };

        Some(FileExports { content_hash: hash, direct, re_exports })
    }

    fn resolve_specifier(&self, specifier: &str, from_file: &Path) -> Option<PathBuf> {
        resolve_specifier(specifier, from_file, self.alias_config)
    }
}
