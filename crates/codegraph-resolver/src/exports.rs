//! Transitive export-map resolution: follow `export * from`/named
//! re-exports to find where an exported name is ultimately declared.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use dashmap::DashMap;

/// A re-export statement, as the AST parser reports it: `export { a as b }
/// from './x'` (`imported_name = Some("a")`, `exported_as = Some("b")`) or
/// `export * from './x'` (`imported_name = None`).
#[derive(Debug, Clone)]
pub struct ReExportSpec {
    pub imported_name: Option<String>,
    pub exported_as: Option<String>,
    pub from_specifier: String,
}

/// What one file directly declares/re-exports, as reported by the parser.
#[derive(Debug, Clone)]
pub struct FileExports {
    /// Content hash of the file these exports were computed from — the
    /// cache key that makes [`ExportResolver`] invalidate correctly.
    pub content_hash: String,
    /// Names declared and exported directly in this file (depth 0).
    pub direct: Vec<String>,
    pub re_exports: Vec<ReExportSpec>,
}

/// Where an exported name ultimately resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub decl_file: PathBuf,
    pub decl_name: String,
    pub depth: u32,
}

/// Callback surface the resolver needs from the AST layer: a file's direct
/// exports/re-exports, and specifier-to-file resolution (delegated to
/// [`crate::specifier::resolve_specifier`] by the caller).
pub trait ExportSource {
    fn file_exports(&self, file: &Path) -> Option<FileExports>;
    fn resolve_specifier(&self, specifier: &str, from_file: &Path) -> Option<PathBuf>;
}

/// Caches export maps per absolute file path, invalidated by content hash.
pub struct ExportResolver {
    max_depth: u32,
    cache: DashMap<PathBuf, (String, HashMap<String, ExportEntry>)>,
}

impl ExportResolver {
    pub fn new(max_depth: u32) -> Self {
        ExportResolver { max_depth, cache: DashMap::new() }
    }

    /// The exported-name -> declaration map for `file`, following
    /// re-exports breadth-first, bounded by `max_depth`, with cycle
    /// detection on absolute file paths.
    pub fn export_map(&self, file: &Path, source: &dyn ExportSource) -> HashMap<String, ExportEntry> {
        let Some(exports) = source.file_exports(file) else {
            return HashMap::new();
        };

        if let Some(cached) = self.cache.get(file) {
            if cached.0 == exports.content_hash {
                return cached.1.clone();
            }
        }

        let map = self.compute(file, &exports, source);
        self.cache.insert(file.to_path_buf(), (exports.content_hash.clone(), map.clone()));
        map
    }

    fn compute(&self, file: &Path, exports: &FileExports, source: &dyn ExportSource) -> HashMap<String, ExportEntry> {
        let mut result = HashMap::new();
        for name in &exports.direct {
            result.insert(
                name.clone(),
                ExportEntry { decl_file: file.to_path_buf(), decl_name: name.clone(), depth: 0 },
            );
        }

        let mut visited: HashSet<PathBuf> = HashSet::from([file.to_path_buf()]);
        let mut queue: VecDeque<(PathBuf, ReExportSpec, u32)> =
            exports.re_exports.iter().cloned().map(|r| (file.to_path_buf(), r, 0)).collect();

        while let Some((from_file, spec, depth)) = queue.pop_front() {
            if depth >= self.max_depth {
                continue;
            }
            let Some(target_file) = source.resolve_specifier(&spec.from_specifier, &from_file) else {
                continue;
            };
            if !visited.insert(target_file.clone()) {
                continue;
            }
            let Some(target_exports) = source.file_exports(&target_file) else { continue };

            match &spec.imported_name {
                Some(imported) => {
                    // Named re-export: find `imported` among the target's
                    // direct names (depth+1) or, failing that, among its
                    // own re-exports (resolved recursively below).
                    if target_exports.direct.contains(imported) {
                        let exported_as = spec.exported_as.clone().unwrap_or_else(|| imported.clone());
                        result.entry(exported_as).or_insert(ExportEntry {
                            decl_file: target_file.clone(),
                            decl_name: imported.clone(),
                            depth: depth + 1,
                        });
                    } else {
                        for nested in &target_exports.re_exports {
                            if nested.exported_as.as_deref() == Some(imported.as_str())
                                || nested.imported_name.as_deref() == Some(imported.as_str())
                            {
                                queue.push_back((
                                    target_file.clone(),
                                    ReExportSpec {
                                        imported_name: nested.imported_name.clone(),
                                        exported_as: spec.exported_as.clone().or_else(|| Some(imported.clone())),
                                        from_specifier: nested.from_specifier.clone(),
                                    },
                                    depth + 1,
                                ));
                            }
                        }
                    }
                }
                None => {
                    // `export * from` — inherit every direct name at
                    // depth+1, then keep walking the target's own
                    // star re-exports.
                    for name in &target_exports.direct {
                        result.entry(name.clone()).or_insert(ExportEntry {
                            decl_file: target_file.clone(),
                            decl_name: name.clone(),
                            depth: depth + 1,
                        });
                    }
                    for nested in &target_exports.re_exports {
                        queue.push_back((target_file.clone(), nested.clone(), depth + 1));
                    }
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    struct FakeSource {
        files: Map<PathBuf, FileExports>,
    }

    impl ExportSource for FakeSource {
        fn file_exports(&self, file: &Path) -> Option<FileExports> {
            self.files.get(file).cloned()
        }

        fn resolve_specifier(&self, specifier: &str, from_file: &Path) -> Option<PathBuf> {
            let dir = from_file.parent().unwrap_or_else(|| Path::new("."));
            let candidate = dir.join(specifier.trim_start_matches("./")).with_extension("ts");
            self.files.contains_key(&candidate).then_some(candidate)
        }
    }

    #[test]
    fn direct_export_is_depth_zero() {
        let mut files = Map::new();
        files.insert(
            PathBuf::from("b.ts"),
            FileExports { content_hash: "h1".into(), direct: vec!["greet".into()], re_exports: vec![] },
        );
        let source = FakeSource { files };
        let resolver = ExportResolver::new(4);

        let map = resolver.export_map(Path::new("b.ts"), &source);
        assert_eq!(map["greet"].depth, 0);
        assert_eq!(map["greet"].decl_file, PathBuf::from("b.ts"));
    }

    #[test]
    fn re_export_chain_increments_depth() {
        // pkg/index.ts: export { greet } from './impl'
        // pkg/impl.ts: direct export greet
        let mut files = Map::new();
        files.insert(
            PathBuf::from("pkg/impl.ts"),
            FileExports { content_hash: "h1".into(), direct: vec!["greet".into()], re_exports: vec![] },
        );
        files.insert(
            PathBuf::from("pkg/index.ts"),
            FileExports {
                content_hash: "h2".into(),
                direct: vec![],
                re_exports: vec![ReExportSpec {
                    imported_name: Some("greet".into()),
                    exported_as: None,
                    from_specifier: "./impl".into(),
                }],
            },
        );
        let source = FakeSource { files };
        let resolver = ExportResolver::new(4);

        let map = resolver.export_map(Path::new("pkg/index.ts"), &source);
        assert_eq!(map["greet"].depth, 1);
        assert_eq!(map["greet"].decl_file, PathBuf::from("pkg/impl.ts"));
    }

    #[test]
    fn star_re_export_is_cycle_safe() {
        let mut files = Map::new();
        files.insert(
            PathBuf::from("a.ts"),
            FileExports {
                content_hash: "h1".into(),
                direct: vec!["x".into()],
                re_exports: vec![ReExportSpec { imported_name: None, exported_as: None, from_specifier: "./b".into() }],
            },
        );
        files.insert(
            PathBuf::from("b.ts"),
            FileExports {
                content_hash: "h2".into(),
                direct: vec!["y".into()],
                re_exports: vec![ReExportSpec { imported_name: None, exported_as: None, from_specifier: "./a".into() }],
            },
        );
        let source = FakeSource { files };
        let resolver = ExportResolver::new(4);

        // Must terminate despite the a<->b cycle.
        let map = resolver.export_map(Path::new("a.ts"), &source);
        assert_eq!(map["x"].depth, 0);
        assert_eq!(map["y"].depth, 1);
    }

    #[test]
    fn cache_hits_on_unchanged_content_hash() {
        let mut files = Map::new();
        files.insert(
            PathBuf::from("b.ts"),
            FileExports { content_hash: "h1".into(), direct: vec!["greet".into()], re_exports: vec![] },
        );
        let source = FakeSource { files };
        let resolver = ExportResolver::new(4);

        let first = resolver.export_map(Path::new("b.ts"), &source);
        let second = resolver.export_map(Path::new("b.ts"), &source);
        assert_eq!(first, second);
    }
}
