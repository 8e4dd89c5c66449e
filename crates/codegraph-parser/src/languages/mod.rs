//! Per-language extractors, dispatched by file extension.

pub mod ecma;
pub mod javascript;
pub mod python;
pub mod tolerant;
pub mod typescript;

use std::path::Path;

use crate::extractor::LanguageExtractor;

/// Pick the extractor for `path` by extension, or `None` for a file type
/// this pipeline doesn't parse for entities (still gets a plain File
/// entity from the coordinator).
pub fn extractor_for(path: &Path) -> Option<Box<dyn LanguageExtractor>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts") | Some("tsx") => Some(Box::new(typescript::TypeScriptExtractor)),
        Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Some(Box::new(javascript::JavaScriptExtractor)),
        Some("py") | Some("pyi") => Some(Box::new(python::PythonExtractor)),
        Some("go") => Some(Box::new(tolerant::GoExtractor)),
        Some("java") => Some(Box::new(tolerant::JavaExtractor)),
        Some("c") | Some("h") => Some(Box::new(tolerant::CExtractor)),
        Some("cpp") | Some("cc") | Some("cxx") | Some("hpp") | Some("hh") => Some(Box::new(tolerant::CppExtractor)),
        Some("rs") => Some(Box::new(tolerant::RustExtractor)),
        _ => None,
    }
}
