//! Path-alias configuration (`baseUrl`/`paths`, `tsconfig.json`-style),
//! read once at init and consulted by [`crate::specifier::resolve_specifier`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// A `baseUrl` plus a `paths` alias map, as found under `compilerOptions`
/// in a `tsconfig.json`/`jsconfig.json`. Each `paths` value is a list of
/// fallback patterns tried in order; `*` is a single wildcard segment.
#[derive(Debug, Clone, Default)]
pub struct PathAliasConfig {
    pub base_url: Option<PathBuf>,
    pub paths: HashMap<String, Vec<String>>,
}

#[derive(Deserialize, Default)]
struct RawTsconfig {
    #[serde(rename = "compilerOptions", default)]
    compiler_options: RawCompilerOptions,
}

#[derive(Deserialize, Default)]
struct RawCompilerOptions {
    #[serde(rename = "baseUrl", default)]
    base_url: Option<String>,
    #[serde(default)]
    paths: HashMap<String, Vec<String>>,
}

impl PathAliasConfig {
    /// Load from a `tsconfig.json`-shaped file at `path`, relative to
    /// `project_root`. Missing file, unreadable JSON, or an absent
    /// `compilerOptions` block all degrade to an empty config rather than
    /// an error — path aliases are an optimization, not a requirement.
    pub fn load(project_root: &Path, path: &Path) -> Self {
        let Ok(bytes) = std::fs::read(path) else {
            return Self::default();
        };
        let Ok(raw) = serde_json::from_slice::<RawTsconfig>(&bytes) else {
            tracing::debug!(path = %path.display(), "tsconfig not valid JSON, ignoring path aliases");
            return Self::default();
        };
        let base_url = raw
            .compiler_options
            .base_url
            .map(|b| project_root.join(b));
        PathAliasConfig {
            base_url,
            paths: raw.compiler_options.paths,
        }
    }

    /// Candidate absolute paths for `specifier` under every alias pattern
    /// that matches, most-specific first. Does not touch the filesystem;
    /// [`crate::specifier::resolve_specifier`] probes these for existence.
    pub fn candidates(&self, specifier: &str) -> Vec<PathBuf> {
        let Some(base) = &self.base_url else { return Vec::new() };
        let mut out = Vec::new();

        for (pattern, targets) in &self.paths {
            if let Some(matched) = match_alias_pattern(pattern, specifier) {
                for target in targets {
                    let resolved = target.replacen('*', &matched, 1);
                    out.push(base.join(resolved));
                }
            }
        }
        // Bare baseUrl resolution (no explicit `paths` entry matched) is
        // also a valid fallback per tsconfig semantics.
        out.push(base.join(specifier));
        out
    }
}

/// Match `specifier` against a `paths`-style pattern containing at most one
/// `*` wildcard. Returns the substring the wildcard captured.
fn match_alias_pattern(pattern: &str, specifier: &str) -> Option<String> {
    match pattern.find('*') {
        None => (pattern == specifier).then(|| String::new()),
        Some(star) => {
            let (prefix, suffix) = (&pattern[..star], &pattern[star + 1..]);
            specifier
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix))
                .map(|s| s.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_empty_config() {
        let dir = TempDir::new().unwrap();
        let cfg = PathAliasConfig::load(dir.path(), &dir.path().join("tsconfig.json"));
        assert!(cfg.base_url.is_none());
        assert!(cfg.candidates("@app/foo").is_empty());
    }

    #[test]
    fn wildcard_alias_resolves_candidates() {
        let dir = TempDir::new().unwrap();
        let tsconfig = dir.path().join("tsconfig.json");
        let mut f = std::fs::File::create(&tsconfig).unwrap();
        write!(
            f,
            r#"{{"compilerOptions":{{"baseUrl":"src","paths":{{"@app/*":["app/*"]}}}}}}"#
        )
        .unwrap();

        let cfg = PathAliasConfig::load(dir.path(), &tsconfig);
        let candidates = cfg.candidates("@app/services/user");
        assert!(candidates
            .iter()
            .any(|c| c.ends_with("src/app/services/user")));
    }

    #[test]
    fn pattern_matching_extracts_wildcard() {
        assert_eq!(
            match_alias_pattern("@app/*", "@app/foo/bar"),
            Some("foo/bar".to_string())
        );
        assert_eq!(match_alias_pattern("@app/*", "other"), None);
        assert_eq!(match_alias_pattern("@fixed", "@fixed"), Some(String::new()));
    }
}
