//! Non-code file classification and dependency-manifest parsing: the bits
//! of `EntityAttrs::File` that aren't handled by a language extractor
//! (`is_config`, `is_test`, `dependencies`).

use std::path::Path;
use std::sync::OnceLock;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

const CONFIG_EXTENSIONS: &[&str] = &["yml", "yaml", "toml", "json", "jsonc", "ini", "cfg", "env"];
const CONFIG_FILENAMES: &[&str] = &[
    ".env",
    "dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "makefile",
    "procfile",
];

/// Filename-shaped patterns that extension/exact-name matching can't
/// express: `Dockerfile.*` variants and anything under a workflow/CI
/// directory, regardless of how deep the repo nests it.
fn config_globs() -> &'static GlobSet {
    static SET: OnceLock<GlobSet> = OnceLock::new();
    SET.get_or_init(|| {
        let mut builder = GlobSetBuilder::new();
        for pattern in ["**/dockerfile.*", "**/.github/**", "**/.circleci/**", "**/k8s/**/*.yaml", "**/k8s/**/*.yml"] {
            builder.add(Glob::new(pattern).expect("static glob pattern is valid"));
        }
        builder.build().expect("static glob set compiles")
    })
}

/// Whether `path` is a configuration file rather than source: recognized
/// by extension, exact filename, or a glob pattern (`Dockerfile.*`,
/// anything under `.github/workflows/`).
pub fn is_config_file(path: &Path) -> bool {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_ascii_lowercase();
    if CONFIG_FILENAMES.contains(&file_name.as_str()) {
        return true;
    }
    if config_globs().is_match(path) {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => CONFIG_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Whether `path` looks like a test file: a `test`/`tests`/`__tests__`/
/// `spec` path segment, or a `_test`/`.test`/`_spec`/`.spec` filename
/// suffix before the extension.
pub fn is_test_file(path: &Path) -> bool {
    let in_test_dir = path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy().to_ascii_lowercase();
        matches!(s.as_str(), "test" | "tests" | "__tests__" | "spec" | "specs")
    });
    if in_test_dir {
        return true;
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_ascii_lowercase();
    stem.ends_with("_test")
        || stem.ends_with(".test")
        || stem.ends_with("_spec")
        || stem.ends_with(".spec")
        || stem.starts_with("test_")
}

fn requirement_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*([A-Za-z0-9_.-]+)\s*(?:[=<>~!].*)?$").unwrap())
}

fn go_mod_require_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*([A-Za-z0-9_./-]+)\s+v[0-9]").unwrap())
}

/// Best-effort extraction of declared dependency names from a manifest
/// file's content, by filename. Returns an empty list for anything that
/// isn't a manifest this function recognizes, or that fails to parse as
/// its expected format (a malformed manifest still gets a File entity;
/// it just reports no dependencies).
pub fn dependencies_of(path: &Path, content: &str) -> Vec<String> {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let mut deps: Vec<String> = match file_name {
        "package.json" => extract_package_json_deps(content),
        "Cargo.toml" => extract_cargo_toml_deps(content),
        "requirements.txt" => requirement_line_re()
            .captures_iter(content)
            .map(|c| c[1].to_string())
            .filter(|s| !s.is_empty() && !s.starts_with('#'))
            .collect(),
        "go.mod" => go_mod_require_re().captures_iter(content).map(|c| c[1].to_string()).collect(),
        _ => Vec::new(),
    };
    deps.sort();
    deps.dedup();
    deps
}

fn extract_package_json_deps(content: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(content) else { return Vec::new() };
    let mut deps = Vec::new();
    for section in ["dependencies", "devDependencies", "peerDependencies"] {
        if let Some(obj) = value.get(section).and_then(|v| v.as_object()) {
            deps.extend(obj.keys().cloned());
        }
    }
    deps
}

fn extract_cargo_toml_deps(content: &str) -> Vec<String> {
    let Ok(value) = content.parse::<toml::Value>() else { return Vec::new() };
    let Some(table) = value.as_table() else { return Vec::new() };
    let mut deps = Vec::new();
    for section in ["dependencies", "dev-dependencies", "build-dependencies"] {
        if let Some(obj) = table.get(section).and_then(|v| v.as_table()) {
            deps.extend(obj.keys().cloned());
        }
    }
    // Target-specific dependency tables, e.g. `[target.'cfg(unix)'.dependencies]`.
    if let Some(targets) = table.get("target").and_then(|v| v.as_table()) {
        for target in targets.values() {
            let Some(target) = target.as_table() else { continue };
            for section in ["dependencies", "dev-dependencies", "build-dependencies"] {
                if let Some(obj) = target.get(section).and_then(|v| v.as_table()) {
                    deps.extend(obj.keys().cloned());
                }
            }
        }
    }
    deps
}
