//! TypeScript extraction: a thin wrapper over [`super::ecma`], which
//! implements the shared JS/TS grammar walk.

use std::path::Path;

use codegraph_core::Language;

use crate::extractor::{ExtractionContext, ExtractionResult, LanguageExtractor};
use crate::languages::ecma;

pub struct TypeScriptExtractor;

impl LanguageExtractor for TypeScriptExtractor {
    fn extract(&self, path: &Path, source: &str, ctx: &ExtractionContext) -> ExtractionResult {
        let is_tsx = path.extension().and_then(|e| e.to_str()) == Some("tsx");
        let grammar = if is_tsx {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        } else {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        };
        ecma::extract(path, source, ctx, grammar, true, Language::TypeScript)
    }
}
