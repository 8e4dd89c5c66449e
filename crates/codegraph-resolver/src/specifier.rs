//! Turning a module specifier into a concrete file on disk.

use std::path::{Path, PathBuf};

use crate::config::PathAliasConfig;

/// Extensions tried, in order, when a specifier omits one. Implementation
/// files are listed before declaration files so a coexisting `.ts`/`.d.ts`
/// pair resolves to the implementation.
const CANDIDATE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "go", "java", "rs"];
const INDEX_BASENAMES: &[&str] = &["index.ts", "index.tsx", "index.js", "index.jsx", "mod.rs", "__init__.py"];

/// Resolve `specifier` (as written in an import/require/use) to an
/// absolute file path, relative to the file that contains it.
///
/// Resolution order:
/// 1. Relative/absolute specifiers (`./x`, `../x`, `/x`) resolve directly
///    against `from_file`'s directory.
/// 2. Path-alias candidates from `alias_config` (if any pattern matches).
/// 3. A bare specifier is otherwise treated as an external package and
///    left unresolved (`None`) — the core does not attempt to resolve into
///    `node_modules`/site-packages/vendored dependencies.
///
/// Each candidate base is probed as: the literal path, the literal path
/// plus each of [`CANDIDATE_EXTENSIONS`], and as a directory containing one
/// of [`INDEX_BASENAMES`]. A `.d.ts` declaration file is only returned if
/// no implementation file exists alongside it.
pub fn resolve_specifier(specifier: &str, from_file: &Path, alias_config: &PathAliasConfig) -> Option<PathBuf> {
    let is_relative = specifier.starts_with('.') || specifier.starts_with('/');

    let bases: Vec<PathBuf> = if is_relative {
        let dir = from_file.parent().unwrap_or_else(|| Path::new("."));
        vec![dir.join(specifier)]
    } else {
        alias_config.candidates(specifier)
    };

    for base in bases {
        if let Some(found) = probe(&base) {
            return Some(found);
        }
    }
    None
}

fn probe(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(normalize(base));
    }

    let mut impl_hit: Option<PathBuf> = None;
    let mut decl_hit: Option<PathBuf> = None;
    for ext in CANDIDATE_EXTENSIONS {
        let candidate = with_extension(base, ext);
        if candidate.is_file() {
            impl_hit = Some(normalize(&candidate));
            break;
        }
    }
    let decl_candidate = with_extension(base, "d.ts");
    if decl_candidate.is_file() {
        decl_hit = Some(normalize(&decl_candidate));
    }
    if let Some(hit) = impl_hit {
        return Some(hit);
    }

    if base.is_dir() {
        for index in INDEX_BASENAMES {
            let candidate = base.join(index);
            if candidate.is_file() {
                return Some(normalize(&candidate));
            }
        }
    }

    decl_hit
}

fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

fn normalize(path: &Path) -> PathBuf {
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolves_relative_specifier_with_extension() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.ts"), "export function greet() {}").unwrap();
        let from = dir.path().join("a.ts");

        let resolved = resolve_specifier("./b", &from, &PathAliasConfig::default());
        assert_eq!(resolved, Some(dir.path().join("b.ts")));
    }

    #[test]
    fn resolves_relative_specifier_to_index() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("pkg/index.ts"), "export function greet() {}").unwrap();
        let from = dir.path().join("app.ts");

        let resolved = resolve_specifier("./pkg", &from, &PathAliasConfig::default());
        assert_eq!(resolved, Some(dir.path().join("pkg/index.ts")));
    }

    #[test]
    fn prefers_implementation_over_declaration_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.ts"), "export function greet() {}").unwrap();
        std::fs::write(dir.path().join("b.d.ts"), "export declare function greet(): void;").unwrap();
        let from = dir.path().join("a.ts");

        let resolved = resolve_specifier("./b", &from, &PathAliasConfig::default());
        assert_eq!(resolved, Some(dir.path().join("b.ts")));
    }

    #[test]
    fn bare_specifier_is_unresolved_without_alias() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.ts");
        assert_eq!(resolve_specifier("react", &from, &PathAliasConfig::default()), None);
    }
}
