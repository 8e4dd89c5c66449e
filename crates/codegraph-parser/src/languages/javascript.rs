//! JavaScript extraction: a thin wrapper over [`super::ecma`], which
//! implements the shared JS/TS grammar walk.

use std::path::Path;

use codegraph_core::Language;

use crate::extractor::{ExtractionContext, ExtractionResult, LanguageExtractor};
use crate::languages::ecma;

pub struct JavaScriptExtractor;

impl LanguageExtractor for JavaScriptExtractor {
    fn extract(&self, path: &Path, source: &str, ctx: &ExtractionContext) -> ExtractionResult {
        let grammar = tree_sitter_javascript::LANGUAGE.into();
        ecma::extract(path, source, ctx, grammar, false, Language::JavaScript)
    }
}
