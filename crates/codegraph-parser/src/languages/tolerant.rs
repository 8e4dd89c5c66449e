//! Shared, lower-fidelity extraction for Go, Java, C, C++, and Rust: every
//! top-level (and, for Java, nested) function/class-shaped declaration
//! becomes a Symbol with CONTAINS/DEFINES edges, and calls resolve only
//! against same-file declarations. No cross-file import resolution: these
//! languages' module systems (Go packages, Java fully-qualified imports,
//! C/C++ headers, Rust `use` paths) each need enough bespoke handling that
//! doing all five justice is a separate effort from this pass; §4.2's
//! "local symbol first" tier still gives full-confidence same-file edges,
//! which is most of what a knowledge graph query cares about for these
//! languages in practice.

use std::collections::HashMap;
use std::path::Path;

use codegraph_core::{
    EntityAttrs, FunctionAttrs, Language, RefKind, RelationshipKind, Resolution, Scope, SymbolKind, Visibility,
};
use tree_sitter::{Node, Parser};

use crate::extractor::{ExtractionContext, ExtractionResult, LanguageExtractor};
use crate::support::{cyclomatic_complexity, leading_docstring, location_of, structural_rel, symbol_entity, synthesize_directories, aggregate, ComplexityKinds, RawRef};

/// Declarative description of the handful of grammar node kinds this tier
/// cares about, one per supported language.
pub struct LangSpec {
    pub language: Language,
    pub function_kinds: &'static [&'static str],
    pub class_kinds: &'static [&'static str],
    pub call_kinds: &'static [&'static str],
    pub name_field: &'static str,
    pub call_function_field: &'static str,
    pub body_field: &'static str,
    pub comment_kinds: &'static [&'static str],
    pub complexity: ComplexityKinds,
}

pub fn extract(path: &Path, source: &str, ctx: &ExtractionContext, ts_grammar: tree_sitter::Language, spec: &LangSpec) -> ExtractionResult {
    let mut result = ExtractionResult::default();
    let file_rel = ctx.repo_relative_path;
    let file_id = codegraph_core::file_id(file_rel);

    let mut parser = Parser::new();
    if parser.set_language(&ts_grammar).is_err() {
        result.errors.push(codegraph_core::ParseError {
            path: file_rel.to_string(),
            line: 1,
            column: 1,
            message: "failed to initialize grammar".into(),
            severity: codegraph_core::ParseSeverity::Error,
        });
        return result;
    }
    let Some(tree) = parser.parse(source, None) else {
        result.errors.push(codegraph_core::ParseError {
            path: file_rel.to_string(),
            line: 1,
            column: 1,
            message: "parser produced no tree".into(),
            severity: codegraph_core::ParseSeverity::Error,
        });
        return result;
    };
    let root = tree.root_node();
    if root.has_error() {
        result.errors.push(codegraph_core::ParseError {
            path: file_rel.to_string(),
            line: 1,
            column: 1,
            message: "source contains syntax errors; best-effort extraction only".into(),
            severity: codegraph_core::ParseSeverity::Warning,
        });
    }
    let _ = path;

    let (dirs, dir_rels) = synthesize_directories(file_rel);
    result.entities.extend(dirs);
    result.relationships.extend(dir_rels);

    let mut names: HashMap<String, String> = HashMap::new();
    collect_names(root, source, file_rel, spec, &mut names);

    emit_symbols(root, source, &file_id, file_rel, spec, &names, &mut result);

    let mut raw = Vec::new();
    walk_calls(root, source, spec, &names, ctx, &mut raw);
    result.relationships.extend(aggregate(&file_id, file_rel, raw, ctx.noise));

    result
}

fn collect_names(node: Node, source: &str, file_rel: &str, spec: &LangSpec, names: &mut HashMap<String, String>) {
    if spec.function_kinds.contains(&node.kind()) || spec.class_kinds.contains(&node.kind()) {
        if let Some(name) = decl_name(node, source, spec) {
            let sig = node.utf8_text(source.as_bytes()).unwrap_or_default();
            let id = codegraph_core::symbol_id(file_rel, &name, sig);
            names.insert(name, id);
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_names(child, source, file_rel, spec, names);
    }
}

fn emit_symbols(node: Node, source: &str, file_id: &str, file_rel: &str, spec: &LangSpec, names: &HashMap<String, String>, result: &mut ExtractionResult) {
    if spec.function_kinds.contains(&node.kind()) {
        if let Some(name) = decl_name(node, source, spec) {
            let sig = node.utf8_text(source.as_bytes()).unwrap_or_default().to_string();
            let doc = leading_docstring(node, source, spec.comment_kinds);
            let params = Vec::new();
            let complexity = node.child_by_field_name(spec.body_field).map(|b| cyclomatic_complexity(b, &spec.complexity)).unwrap_or(1);
            let visibility = if spec.language == Language::Go && name.chars().next().is_some_and(|c| c.is_uppercase()) {
                Visibility::Public
            } else if spec.language == Language::Go {
                Visibility::Private
            } else {
                Visibility::Public
            };
            let attrs = EntityAttrs::Symbol {
                name: name.clone(),
                signature: sig.clone(),
                docstring: doc,
                visibility,
                is_exported: matches!(visibility, Visibility::Public),
                is_deprecated: false,
                function: Some(FunctionAttrs { parameters: params, return_type: None, is_async: false, is_generator: false, cyclomatic_complexity: complexity }),
                class: None,
                interface: None,
                type_alias: None,
            };
            let entity = symbol_entity(file_rel, &name, &sig, spec.language, SymbolKind::Function, attrs);
            emit_defines(file_id, &entity.id, file_rel, node, result);
            result.entities.push(entity);
        }
    } else if spec.class_kinds.contains(&node.kind()) {
        if let Some(name) = decl_name(node, source, spec) {
            let sig = node.utf8_text(source.as_bytes()).unwrap_or_default().to_string();
            let doc = leading_docstring(node, source, spec.comment_kinds);
            let attrs = EntityAttrs::Symbol {
                name: name.clone(),
                signature: sig.clone(),
                docstring: doc,
                visibility: Visibility::Public,
                is_exported: true,
                is_deprecated: false,
                function: None,
                class: Some(codegraph_core::ClassAttrs { extends: Vec::new(), implements: Vec::new(), is_abstract: false, methods: Vec::new(), properties: Vec::new() }),
                interface: None,
                type_alias: None,
            };
            let entity = symbol_entity(file_rel, &name, &sig, spec.language, SymbolKind::Class, attrs);
            emit_defines(file_id, &entity.id, file_rel, node, result);
            result.entities.push(entity);
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        emit_symbols(child, source, file_id, file_rel, spec, names, result);
    }
}

fn emit_defines(file_id: &str, symbol_id: &str, file_rel: &str, node: Node, result: &mut ExtractionResult) {
    let loc = location_of(file_rel, node);
    result.relationships.push(structural_rel(file_id, symbol_id, RelationshipKind::Defines, loc.clone()));
    result.relationships.push(structural_rel(file_id, symbol_id, RelationshipKind::Contains, loc));
}

fn walk_calls(node: Node, source: &str, spec: &LangSpec, names: &HashMap<String, String>, ctx: &ExtractionContext, out: &mut Vec<RawRef>) {
    if spec.call_kinds.contains(&node.kind()) {
        if let Some(func) = node.child_by_field_name(spec.call_function_field) {
            if let Some(name) = callee_name(func, source) {
                if !ctx.noise.is_noise(&name) {
                    if let Some(id) = names.get(&name) {
                        out.push(RawRef {
                            to_id: id.clone(),
                            kind: RelationshipKind::Calls,
                            ref_kind: Some(RefKind::Call),
                            resolution: Resolution::Direct,
                            scope: Scope::Local,
                            location: location_of(ctx.repo_relative_path, node),
                            inferred: false,
                            target_is_resolved_symbol: true,
                            is_exported: false,
                            import_depth: None,
                            arity: None,
                            awaited: None,
                            operator: None,
                            access_path: None,
                            param_name: None,
                            name_len: name.len(),
                        });
                    }
                }
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(child, source, spec, names, ctx, out);
    }
}

fn decl_name(node: Node, source: &str, spec: &LangSpec) -> Option<String> {
    let field = node.child_by_field_name(spec.name_field)?;
    if field.kind() == "identifier" || field.kind() == "type_identifier" || field.kind() == "field_identifier" {
        return field.utf8_text(source.as_bytes()).ok().map(|s| s.to_string());
    }
    // C/C++ function declarators nest the identifier inside pointer/array/
    // function declarator wrappers; find the innermost identifier.
    innermost_identifier(field, source)
}

fn innermost_identifier(node: Node, source: &str) -> Option<String> {
    if node.kind() == "identifier" || node.kind() == "field_identifier" {
        return node.utf8_text(source.as_bytes()).ok().map(|s| s.to_string());
    }
    if let Some(declarator) = node.child_by_field_name("declarator") {
        return innermost_identifier(declarator, source);
    }
    let mut cursor = node.walk();
    node.children(&mut cursor).find_map(|c| innermost_identifier(c, source))
}

fn callee_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" => node.utf8_text(source.as_bytes()).ok().map(|s| s.to_string()),
        "field_expression" | "selector_expression" | "scoped_identifier" | "qualified_identifier" => {
            let last = node.named_child(node.named_child_count().checked_sub(1)?)?;
            callee_name(last, source)
        }
        _ => None,
    }
}

pub fn go_spec() -> LangSpec {
    LangSpec {
        language: Language::Go,
        function_kinds: &["function_declaration", "method_declaration"],
        class_kinds: &["type_declaration"],
        call_kinds: &["call_expression"],
        name_field: "name",
        call_function_field: "function",
        body_field: "body",
        comment_kinds: &["comment"],
        complexity: ComplexityKinds {
            conditionals: &["if_statement"],
            loops: &["for_statement"],
            case_clauses: &["expression_case", "default_case"],
            ternaries: &[],
        },
    }
}

pub fn java_spec() -> LangSpec {
    LangSpec {
        language: Language::Java,
        function_kinds: &["method_declaration", "constructor_declaration"],
        class_kinds: &["class_declaration", "interface_declaration", "enum_declaration"],
        call_kinds: &["method_invocation", "object_creation_expression"],
        name_field: "name",
        call_function_field: "name",
        body_field: "body",
        comment_kinds: &["line_comment", "block_comment"],
        complexity: ComplexityKinds {
            conditionals: &["if_statement", "ternary_expression"],
            loops: &["for_statement", "while_statement", "do_statement", "enhanced_for_statement"],
            case_clauses: &["switch_label"],
            ternaries: &["ternary_expression"],
        },
    }
}

pub fn c_spec() -> LangSpec {
    LangSpec {
        language: Language::C,
        function_kinds: &["function_definition"],
        class_kinds: &["struct_specifier"],
        call_kinds: &["call_expression"],
        name_field: "declarator",
        call_function_field: "function",
        body_field: "body",
        comment_kinds: &["comment"],
        complexity: ComplexityKinds {
            conditionals: &["if_statement", "conditional_expression"],
            loops: &["for_statement", "while_statement", "do_statement"],
            case_clauses: &["case_statement"],
            ternaries: &["conditional_expression"],
        },
    }
}

pub fn cpp_spec() -> LangSpec {
    LangSpec {
        language: Language::Cpp,
        function_kinds: &["function_definition"],
        class_kinds: &["class_specifier", "struct_specifier"],
        call_kinds: &["call_expression"],
        name_field: "declarator",
        call_function_field: "function",
        body_field: "body",
        comment_kinds: &["comment"],
        complexity: ComplexityKinds {
            conditionals: &["if_statement", "conditional_expression"],
            loops: &["for_statement", "while_statement", "do_statement", "for_range_loop"],
            case_clauses: &["case_statement"],
            ternaries: &["conditional_expression"],
        },
    }
}

pub fn rust_spec() -> LangSpec {
    LangSpec {
        language: Language::Rust,
        function_kinds: &["function_item"],
        class_kinds: &["struct_item", "enum_item", "trait_item"],
        call_kinds: &["call_expression"],
        name_field: "name",
        call_function_field: "function",
        body_field: "body",
        comment_kinds: &["line_comment", "block_comment"],
        complexity: ComplexityKinds {
            conditionals: &["if_expression", "match_expression"],
            loops: &["for_expression", "while_expression", "loop_expression"],
            case_clauses: &["match_arm"],
            ternaries: &[],
        },
    }
}

macro_rules! tolerant_extractor {
    ($struct_name:ident, $grammar:expr, $spec_fn:path) => {
        pub struct $struct_name;
        impl LanguageExtractor for $struct_name {
            fn extract(&self, path: &Path, source: &str, ctx: &ExtractionContext) -> ExtractionResult {
                let spec = $spec_fn();
                extract(path, source, ctx, $grammar, &spec)
            }
        }
    };
}

tolerant_extractor!(GoExtractor, tree_sitter_go::LANGUAGE.into(), go_spec);
tolerant_extractor!(JavaExtractor, tree_sitter_java::LANGUAGE.into(), java_spec);
tolerant_extractor!(CExtractor, tree_sitter_c::LANGUAGE.into(), c_spec);
tolerant_extractor!(CppExtractor, tree_sitter_cpp::LANGUAGE.into(), cpp_spec);
tolerant_extractor!(RustExtractor, tree_sitter_rust::LANGUAGE.into(), rust_spec);

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::NoiseConfig;
    use crate::resolution::ProjectContext;

    fn ctx<'a>(noise: &'a NoiseConfig, project: &'a ProjectContext) -> ExtractionContext<'a> {
        ExtractionContext { repo_relative_path: "src/lib.rs", noise, project }
    }

    #[test]
    fn rust_function_and_call_resolve_locally() {
        let source = "fn helper() -> i32 { 1 }\nfn main() { helper(); }\n";
        let noise = NoiseConfig::default();
        let project = ProjectContext::new(std::env::temp_dir(), 6);
        let ctx = ctx(&noise, &project);
        let extractor = RustExtractor;
        let result = extractor.extract(Path::new("src/lib.rs"), source, &ctx);

        let names: Vec<&str> = result
            .entities
            .iter()
            .filter_map(|e| if let EntityAttrs::Symbol { name, .. } = &e.attrs { Some(name.as_str()) } else { None })
            .collect();
        assert!(names.contains(&"helper"));
        assert!(names.contains(&"main"));
        assert!(result.relationships.iter().any(|r| r.kind == RelationshipKind::Calls));
    }

    #[test]
    fn go_exported_function_is_public() {
        let source = "package x\nfunc Greet() string { return \"hi\" }\n";
        let noise = NoiseConfig::default();
        let project = ProjectContext::new(std::env::temp_dir(), 6);
        let ctx = ctx(&noise, &project);
        let extractor = GoExtractor;
        let result = extractor.extract(Path::new("x.go"), source, &ctx);
        let greet = result.entities.iter().find(|e| matches!(&e.attrs, EntityAttrs::Symbol { name, .. } if name == "Greet")).unwrap();
        match &greet.attrs {
            EntityAttrs::Symbol { is_exported, .. } => assert!(*is_exported),
            _ => unreachable!(),
        }
    }
}
