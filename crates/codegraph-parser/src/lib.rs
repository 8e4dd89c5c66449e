//! File parsing and symbol extraction: per-language tree-sitter extractors
//! behind a common [`extractor::LanguageExtractor`] trait, a coordinator
//! that turns one or many files into entities/relationships ready for
//! [`codegraph_sync`], and the cross-file resolution context they share.

pub mod config;
pub mod coordinator;
pub mod extractor;
pub mod languages;
pub mod resolution;
pub mod support;

pub use coordinator::{AggregateParseOutput, IncrementalParseOutput, ParseOutput, ParserCoordinator};

#[cfg(test)]
mod tests;
