//! Shared extraction logic for JavaScript and TypeScript. The two grammars
//! share almost every node kind that matters here (tree-sitter-typescript is
//! a superset of tree-sitter-javascript's grammar); `extract` takes an
//! `is_typescript` flag for the handful of TS-only constructs (interfaces,
//! type aliases, explicit type annotations, heritage `implements`).
//!
//! This module also supplies the two scan functions
//! [`crate::resolution::ProjectContext`] needs from raw source text (not a
//! parsed tree) to compute export maps without re-parsing every file in the
//! re-export chain.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use codegraph_core::{
    EntityAttrs, FunctionAttrs, InterfaceAttrs, Language, Location, Parameter, RefKind, RelationshipKind, Resolution,
    Scope, SymbolKind, TypeAliasAttrs, Visibility,
};
use codegraph_resolver::ReExportSpec;
use regex::Regex;
use tree_sitter::{Node, Parser};

use crate::extractor::{ExtractionContext, ExtractionResult};
use crate::support::{
    self, cyclomatic_complexity, last_segment, leading_docstring, location_of, rel_kind_label, structural_rel,
    symbol_entity, synthesize_directories, ComplexityKinds, RawRef,
};

const COMPLEXITY: ComplexityKinds = ComplexityKinds {
    conditionals: &["if_statement", "ternary_expression", "conditional_expression"],
    loops: &["for_statement", "for_in_statement", "while_statement", "do_statement"],
    case_clauses: &["switch_case", "switch_default"],
    ternaries: &["ternary_expression", "conditional_expression"],
};

const COMMENT_KINDS: &[&str] = &["comment"];

/// A file's own top-level bindings in scope for local call/reference
/// resolution, plus the members each class declares (for `this.x()` and
/// heritage/override lookups).
#[derive(Default)]
struct LocalScope {
    /// name -> symbol id, for every top-level function/class/variable and
    /// every method/property declared on a class in this file.
    names: HashMap<String, String>,
    /// class name -> (member name -> symbol id), for `this.`-qualified
    /// member resolution and override detection.
    class_members: HashMap<String, HashMap<String, String>>,
    /// class name -> heritage (extends, implements) as written in source.
    class_heritage: HashMap<String, (Vec<String>, Vec<String>)>,
}

struct ImportedName {
    target_file: Option<std::path::PathBuf>,
    /// The name to look up in the target file's export map (the original
    /// name before any local `as` rename).
    exported_name: String,
}

pub fn extract(
    path: &Path,
    source: &str,
    ctx: &ExtractionContext,
    ts_grammar: tree_sitter::Language,
    is_typescript: bool,
    language: Language,
) -> ExtractionResult {
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

    let (dirs, dir_rels) = synthesize_directories(file_rel);
    result.entities.extend(dirs);
    result.relationships.extend(dir_rels);

    // Pass 1: local scope (every declared symbol, independent of imports),
    // so later passes can resolve `(a) local same-file symbol` first.
    let mut scope = LocalScope::default();
    collect_local_scope(root, source, file_rel, &mut scope, is_typescript);

    // Pass 2: import map, used for resolution tier `(d) imported root +
    // member via export map`.
    let import_map = collect_imports(root, source, path, ctx);

    // Pass 3: symbol entities + DEFINES/CONTAINS/EXPORTS.
    let mut exported: Vec<String> = Vec::new();
    collect_symbols(root, source, &file_id, file_rel, language, is_typescript, &scope, &mut exported, &mut result);

    // Pass 4: references (calls, instantiations, identifiers, type deps,
    // reads/writes, heritage, overrides, throws, return/param types).
    let mut raw: Vec<RawRef> = Vec::new();
    walk_refs(root, source, &scope, &import_map, ctx, is_typescript, &mut raw);
    let aggregated = support::aggregate(&file_id, file_rel, raw, ctx.noise);
    result.relationships.extend(aggregated);

    // Heritage + overrides, emitted directly (not aggregated: each class
    // has at most one extends edge and a small fixed implements list).
    emit_heritage_and_overrides(&scope, &file_id, file_rel, ctx, &import_map, &mut result);

    result
}

// ---------------------------------------------------------------------
// Local scope collection
// ---------------------------------------------------------------------

fn collect_local_scope(root: Node, source: &str, file_rel: &str, scope: &mut LocalScope, is_typescript: bool) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        visit_for_scope(child, source, file_rel, scope, is_typescript, None);
    }
}

fn visit_for_scope(node: Node, source: &str, file_rel: &str, scope: &mut LocalScope, is_typescript: bool, class_ctx: Option<&str>) {
    match node.kind() {
        "export_statement" => {
            if let Some(decl) = node.child_by_field_name("declaration") {
                visit_for_scope(decl, source, file_rel, scope, is_typescript, class_ctx);
            }
        }
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) {
                let sig = signature_text(node, source);
                let id = codegraph_core::symbol_id(file_rel, &name, &sig);
                scope.names.insert(name, id);
            }
        }
        "class_declaration" | "abstract_class_declaration" => {
            let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) else { return };
            let sig = signature_text(node, source);
            let id = codegraph_core::symbol_id(file_rel, &name, &sig);
            scope.names.insert(name.clone(), id);

            let (extends, implements) = heritage_of(node, source);
            scope.class_heritage.insert(name.clone(), (extends, implements));

            if let Some(body) = node.child_by_field_name("body") {
                let mut bcursor = body.walk();
                for member in body.children(&mut bcursor) {
                    visit_for_scope(member, source, file_rel, scope, is_typescript, Some(&name));
                }
            }
        }
        "interface_declaration" => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) {
                let sig = signature_text(node, source);
                let id = codegraph_core::symbol_id(file_rel, &name, &sig);
                scope.names.insert(name, id);
            }
        }
        "type_alias_declaration" => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) {
                let sig = signature_text(node, source);
                let id = codegraph_core::symbol_id(file_rel, &name, &sig);
                scope.names.insert(name, id);
            }
        }
        "method_definition" | "method_signature" => {
            if let Some(name) = method_name(node, source) {
                let sig = signature_text(node, source);
                let id = codegraph_core::symbol_id(file_rel, &name, &sig);
                if let Some(class) = class_ctx {
                    scope.class_members.entry(class.to_string()).or_default().insert(name.clone(), id.clone());
                }
                scope.names.insert(name, id);
            }
        }
        "public_field_definition" | "field_definition" | "property_signature" => {
            if let Some(name) = node.child_by_field_name("property").or_else(|| node.child_by_field_name("name")).and_then(|n| text(n, source)) {
                let sig = signature_text(node, source);
                let id = codegraph_core::symbol_id(file_rel, &name, &sig);
                if let Some(class) = class_ctx {
                    scope.class_members.entry(class.to_string()).or_default().insert(name.clone(), id.clone());
                }
                scope.names.insert(name, id);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut vcursor = node.walk();
            for child in node.children(&mut vcursor) {
                if child.kind() == "variable_declarator" {
                    if let Some(name) = child.child_by_field_name("name").and_then(|n| text(n, source)) {
                        let sig = signature_text(child, source);
                        let id = codegraph_core::symbol_id(file_rel, &name, &sig);
                        scope.names.insert(name, id);
                    }
                }
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------
// Symbol entity emission
// ---------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn collect_symbols(
    root: Node,
    source: &str,
    file_id: &str,
    file_rel: &str,
    language: Language,
    is_typescript: bool,
    scope: &LocalScope,
    exported: &mut Vec<String>,
    result: &mut ExtractionResult,
) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        emit_symbol(child, source, file_id, file_rel, language, is_typescript, scope, None, exported, result);
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_symbol(
    node: Node,
    source: &str,
    file_id: &str,
    file_rel: &str,
    language: Language,
    is_typescript: bool,
    scope: &LocalScope,
    owning_class: Option<(&str, &str)>,
    exported: &mut Vec<String>,
    result: &mut ExtractionResult,
) {
    let is_exported = node.kind() == "export_statement";
    let is_default = is_exported && node.children(&mut node.walk()).any(|c| c.kind() == "default");

    if is_exported {
        if let Some(decl) = node.child_by_field_name("declaration") {
            emit_symbol(decl, source, file_id, file_rel, language, is_typescript, scope, owning_class, exported, result);
            if let Some(name) = decl.child_by_field_name("name").and_then(|n| text(n, source)) {
                exported.push(name);
            } else if is_default {
                exported.push("default".to_string());
            }
        }
        return;
    }

    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) {
                let sig = signature_text(node, source);
                let doc = leading_docstring(node, source, COMMENT_KINDS);
                let is_async = node.children(&mut node.walk()).any(|c| c.kind() == "async" || text(c, source).as_deref() == Some("async"));
                let is_generator = node.kind() == "generator_function_declaration" || sig.contains('*');
                let params = parse_parameters(node, source);
                let return_type = node.child_by_field_name("return_type").and_then(|n| text(n, source));
                let complexity = node.child_by_field_name("body").map(|b| cyclomatic_complexity(b, &COMPLEXITY)).unwrap_or(1);

                let attrs = EntityAttrs::Symbol {
                    name: name.clone(),
                    signature: sig.clone(),
                    docstring: doc,
                    visibility: Visibility::Public,
                    is_exported: exported.contains(&name),
                    is_deprecated: doc_has_deprecated(node, source),
                    function: Some(FunctionAttrs {
                        parameters: params,
                        return_type,
                        is_async,
                        is_generator,
                        cyclomatic_complexity: complexity,
                    }),
                    class: None,
                    interface: None,
                    type_alias: None,
                };
                let entity = symbol_entity(file_rel, &name, &sig, language, SymbolKind::Function, attrs);
                emit_defines(file_id, &entity.id, file_rel, node, result);
                result.entities.push(entity);
            }
        }
        "class_declaration" | "abstract_class_declaration" => {
            let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) else { return };
            let sig = signature_text(node, source);
            let doc = leading_docstring(node, source, COMMENT_KINDS);
            let (extends, implements) = heritage_of(node, source);
            let is_abstract = node.kind() == "abstract_class_declaration";

            let mut method_names = Vec::new();
            let mut property_names = Vec::new();
            if let Some(body) = node.child_by_field_name("body") {
                let mut bcursor = body.walk();
                for member in body.children(&mut bcursor) {
                    match member.kind() {
                        "method_definition" => {
                            if let Some(n) = method_name(member, source) {
                                method_names.push(n);
                            }
                        }
                        "public_field_definition" | "field_definition" => {
                            if let Some(n) = member.child_by_field_name("property").and_then(|n| text(n, source)) {
                                property_names.push(n);
                            }
                        }
                        _ => {}
                    }
                }
            }

            let attrs = EntityAttrs::Symbol {
                name: name.clone(),
                signature: sig.clone(),
                docstring: doc,
                visibility: Visibility::Public,
                is_exported: exported.contains(&name),
                is_deprecated: doc_has_deprecated(node, source),
                function: None,
                class: Some(codegraph_core::ClassAttrs {
                    extends,
                    implements,
                    is_abstract,
                    methods: method_names,
                    properties: property_names,
                }),
                interface: None,
                type_alias: None,
            };
            let class_entity = symbol_entity(file_rel, &name, &sig, language, SymbolKind::Class, attrs);
            emit_defines(file_id, &class_entity.id, file_rel, node, result);
            let class_id = class_entity.id.clone();
            result.entities.push(class_entity);

            if let Some(body) = node.child_by_field_name("body") {
                let mut bcursor = body.walk();
                for member in body.children(&mut bcursor) {
                    emit_symbol(member, source, file_id, file_rel, language, is_typescript, scope, Some((&name, &class_id)), exported, result);
                }
            }
        }
        "interface_declaration" if is_typescript => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) {
                let sig = signature_text(node, source);
                let doc = leading_docstring(node, source, COMMENT_KINDS);
                let extends = interface_extends(node, source);
                let mut methods = Vec::new();
                let mut properties = Vec::new();
                if let Some(body) = node.child_by_field_name("body") {
                    let mut bcursor = body.walk();
                    for member in body.children(&mut bcursor) {
                        match member.kind() {
                            "method_signature" => {
                                if let Some(n) = method_name(member, source) {
                                    methods.push(n);
                                }
                            }
                            "property_signature" => {
                                if let Some(n) = member.child_by_field_name("name").and_then(|n| text(n, source)) {
                                    properties.push(n);
                                }
                            }
                            _ => {}
                        }
                    }
                }
                let attrs = EntityAttrs::Symbol {
                    name: name.clone(),
                    signature: sig.clone(),
                    docstring: doc,
                    visibility: Visibility::Public,
                    is_exported: exported.contains(&name),
                    is_deprecated: doc_has_deprecated(node, source),
                    function: None,
                    class: None,
                    interface: Some(InterfaceAttrs { extends, methods, properties }),
                    type_alias: None,
                };
                let entity = symbol_entity(file_rel, &name, &sig, language, SymbolKind::Interface, attrs);
                emit_defines(file_id, &entity.id, file_rel, node, result);
                result.entities.push(entity);
            }
        }
        "type_alias_declaration" if is_typescript => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) {
                let sig = signature_text(node, source);
                let doc = leading_docstring(node, source, COMMENT_KINDS);
                let aliased = node.child_by_field_name("value").and_then(|n| text(n, source)).unwrap_or_default();
                let attrs = EntityAttrs::Symbol {
                    name: name.clone(),
                    signature: sig.clone(),
                    docstring: doc,
                    visibility: Visibility::Public,
                    is_exported: exported.contains(&name),
                    is_deprecated: doc_has_deprecated(node, source),
                    function: None,
                    class: None,
                    interface: None,
                    type_alias: Some(TypeAliasAttrs {
                        is_union: aliased.contains('|'),
                        is_intersection: aliased.contains('&'),
                        aliased_type: aliased,
                    }),
                };
                let entity = symbol_entity(file_rel, &name, &sig, language, SymbolKind::TypeAlias, attrs);
                emit_defines(file_id, &entity.id, file_rel, node, result);
                result.entities.push(entity);
            }
        }
        "method_definition" => {
            if let Some(name) = method_name(node, source) {
                let sig = signature_text(node, source);
                let doc = leading_docstring(node, source, COMMENT_KINDS);
                let is_async = node.children(&mut node.walk()).any(|c| text(c, source).as_deref() == Some("async"));
                let params = parse_parameters(node, source);
                let return_type = node.child_by_field_name("return_type").and_then(|n| text(n, source));
                let complexity = node.child_by_field_name("body").map(|b| cyclomatic_complexity(b, &COMPLEXITY)).unwrap_or(1);
                let visibility = method_visibility(node, source);

                let attrs = EntityAttrs::Symbol {
                    name: name.clone(),
                    signature: sig.clone(),
                    docstring: doc,
                    visibility,
                    is_exported: false,
                    is_deprecated: doc_has_deprecated(node, source),
                    function: Some(FunctionAttrs {
                        parameters: params,
                        return_type,
                        is_async,
                        is_generator: sig.contains('*'),
                        cyclomatic_complexity: complexity,
                    }),
                    class: None,
                    interface: None,
                    type_alias: None,
                };
                let kind = SymbolKind::Method;
                let entity = symbol_entity(file_rel, &name, &sig, language, kind, attrs);
                emit_defines(file_id, &entity.id, file_rel, node, result);
                if let Some((_, class_id)) = owning_class {
                    result.relationships.push(structural_rel(class_id, &entity.id, RelationshipKind::Contains, location_of(file_rel, node)));
                }
                result.entities.push(entity);
            }
        }
        "public_field_definition" | "field_definition" => {
            if let Some(name) = node.child_by_field_name("property").and_then(|n| text(n, source)) {
                let sig = signature_text(node, source);
                let doc = leading_docstring(node, source, COMMENT_KINDS);
                let visibility = method_visibility(node, source);
                let attrs = EntityAttrs::Symbol {
                    name: name.clone(),
                    signature: sig.clone(),
                    docstring: doc,
                    visibility,
                    is_exported: false,
                    is_deprecated: doc_has_deprecated(node, source),
                    function: None,
                    class: None,
                    interface: None,
                    type_alias: None,
                };
                let entity = symbol_entity(file_rel, &name, &sig, language, SymbolKind::Property, attrs);
                emit_defines(file_id, &entity.id, file_rel, node, result);
                if let Some((_, class_id)) = owning_class {
                    result.relationships.push(structural_rel(class_id, &entity.id, RelationshipKind::Contains, location_of(file_rel, node)));
                }
                result.entities.push(entity);
            }
        }
        "lexical_declaration" | "variable_declaration" if owning_class.is_none() => {
            let mut vcursor = node.walk();
            for child in node.children(&mut vcursor) {
                if child.kind() == "variable_declarator" {
                    if let Some(name) = child.child_by_field_name("name").and_then(|n| text(n, source)) {
                        let sig = signature_text(child, source);
                        let attrs = EntityAttrs::Symbol {
                            name: name.clone(),
                            signature: sig.clone(),
                            docstring: leading_docstring(node, source, COMMENT_KINDS),
                            visibility: Visibility::Public,
                            is_exported: exported.contains(&name),
                            is_deprecated: false,
                            function: None,
                            class: None,
                            interface: None,
                            type_alias: None,
                        };
                        let entity = symbol_entity(file_rel, &name, &sig, language, SymbolKind::Variable, attrs);
                        emit_defines(file_id, &entity.id, file_rel, node, result);
                        result.entities.push(entity);
                    }
                }
            }
        }
        _ => {}
    }
}

fn emit_defines(file_id: &str, symbol_id: &str, file_rel: &str, node: Node, result: &mut ExtractionResult) {
    let loc = location_of(file_rel, node);
    result.relationships.push(structural_rel(file_id, symbol_id, RelationshipKind::Defines, loc.clone()));
    result.relationships.push(structural_rel(file_id, symbol_id, RelationshipKind::Contains, loc));
}

// ---------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------

fn collect_imports(root: Node, source: &str, path: &Path, ctx: &ExtractionContext) -> HashMap<String, ImportedName> {
    let mut map = HashMap::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() != "import_statement" {
            continue;
        }
        let Some(specifier) = import_source(child, source) else { continue };
        let target_file = ctx.project.resolve_specifier(&specifier, path);

        if let Some(clause) = child.children(&mut child.walk()).find(|c| c.kind() == "import_clause") {
            let mut ccursor = clause.walk();
            for part in clause.children(&mut ccursor) {
                match part.kind() {
                    "identifier" => {
                        if let Some(local) = text(part, source) {
                            map.insert(local.clone(), ImportedName { target_file: target_file.clone(), exported_name: "default".to_string() });
                        }
                    }
                    "namespace_import" => {
                        if let Some(local) = part.children(&mut part.walk()).find(|c| c.kind() == "identifier").and_then(|n| text(n, source)) {
                            map.insert(local, ImportedName { target_file: target_file.clone(), exported_name: "*".to_string() });
                        }
                    }
                    "named_imports" => {
                        let mut ncursor = part.walk();
                        for spec in part.children(&mut ncursor) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let imported = spec.child_by_field_name("name").and_then(|n| text(n, source));
                            let alias = spec.child_by_field_name("alias").and_then(|n| text(n, source));
                            if let Some(imported) = imported {
                                let local = alias.unwrap_or_else(|| imported.clone());
                                map.insert(local, ImportedName { target_file: target_file.clone(), exported_name: imported });
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    map
}

fn import_source(import_stmt: Node, source: &str) -> Option<String> {
    import_stmt
        .child_by_field_name("source")
        .or_else(|| import_stmt.children(&mut import_stmt.walk()).find(|c| c.kind() == "string"))
        .and_then(|n| text(n, source))
        .map(|s| s.trim_matches('"').trim_matches('\'').to_string())
}

// ---------------------------------------------------------------------
// Reference walking
// ---------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn walk_refs(
    node: Node,
    source: &str,
    scope: &LocalScope,
    imports: &HashMap<String, ImportedName>,
    ctx: &ExtractionContext,
    is_typescript: bool,
    out: &mut Vec<RawRef>,
) {
    match node.kind() {
        "call_expression" => {
            if let Some(func) = node.child_by_field_name("function") {
                let awaited = node.parent().map(|p| p.kind() == "await_expression").unwrap_or(false);
                let arity = node.child_by_field_name("arguments").map(count_arguments).unwrap_or(0);
                if let Some((callee_name, access_path)) = callee_name_of(func, source) {
                    if !ctx.noise.is_noise(&callee_name) {
                        if let Some(r) = resolve_name(&callee_name, &access_path, scope, imports, ctx, node, RelationshipKind::Calls, Some(RefKind::Call), Some(arity), Some(awaited)) {
                            out.push(r);
                        }
                    }
                }
            }
        }
        "new_expression" => {
            if let Some(ctor) = node.child_by_field_name("constructor") {
                let arity = node.child_by_field_name("arguments").map(count_arguments).unwrap_or(0);
                if let Some((name, access_path)) = callee_name_of(ctor, source) {
                    if !ctx.noise.is_noise(&name) {
                        if let Some(r) = resolve_name(&name, &access_path, scope, imports, ctx, node, RelationshipKind::References, Some(RefKind::Instantiation), Some(arity), None) {
                            out.push(r);
                        }
                    }
                }
            }
        }
        "assignment_expression" => {
            if let Some(left) = node.child_by_field_name("left") {
                let operator = assignment_operator(node, source);
                if let Some(name) = simple_identifier(left, source) {
                    if !ctx.noise.is_noise(&name) {
                        if let Some(mut r) = resolve_name(&name, &None, scope, imports, ctx, left, RelationshipKind::Writes, Some(RefKind::Write), None, None) {
                            r.operator = operator.clone();
                            out.push(r);
                        }
                    }
                }
            }
            if let Some(right) = node.child_by_field_name("right") {
                collect_reads(right, source, scope, imports, ctx, out);
            }
        }
        "throw_statement" => {
            if let Some(new_expr) = node.children(&mut node.walk()).find(|c| c.kind() == "new_expression") {
                if let Some(ctor) = new_expr.child_by_field_name("constructor") {
                    if let Some(name) = simple_identifier(ctor, source) {
                        if !ctx.noise.is_noise(&name) {
                            let to_id = resolve_or_placeholder(&name, scope, imports, ctx, "class");
                            out.push(placeholder_ref(to_id, RelationshipKind::Throws, RefKind::Throw, node, &name, scope, imports));
                        }
                    }
                }
            }
        }
        "type_annotation" if is_typescript => {
            if let Some(type_node) = node.children(&mut node.walk()).last() {
                if let Some(name) = type_name(type_node, source) {
                    if !ctx.noise.is_noise(&name) {
                        if let Some(r) = resolve_name(&name, &None, scope, imports, ctx, node, RelationshipKind::DependsOn, Some(RefKind::Type), None, None) {
                            out.push(r);
                        }
                    }
                }
            }
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_refs(child, source, scope, imports, ctx, is_typescript, out);
    }
}

fn collect_reads(node: Node, source: &str, scope: &LocalScope, imports: &HashMap<String, ImportedName>, ctx: &ExtractionContext, out: &mut Vec<RawRef>) {
    match node.kind() {
        "identifier" => {
            if let Some(name) = text(node, source) {
                if !ctx.noise.is_noise(&name) {
                    if let Some(r) = resolve_name(&name, &None, scope, imports, ctx, node, RelationshipKind::Reads, Some(RefKind::Read), None, None) {
                        out.push(r);
                    }
                }
            }
        }
        "member_expression" => {
            if let Some(obj) = node.child_by_field_name("object") {
                collect_reads(obj, source, scope, imports, ctx, out);
            }
        }
        "call_expression" | "new_expression" => {
            // Calls inside an RHS are handled by the outer walk's dedicated
            // call_expression/new_expression arm; only descend into the
            // argument list here to catch reads of identifiers passed in.
            if let Some(args) = node.child_by_field_name("arguments") {
                let mut cursor = args.walk();
                for arg in args.children(&mut cursor) {
                    collect_reads(arg, source, scope, imports, ctx, out);
                }
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_reads(child, source, scope, imports, ctx, out);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_name(
    name: &str,
    access_path: &Option<String>,
    scope: &LocalScope,
    imports: &HashMap<String, ImportedName>,
    ctx: &ExtractionContext,
    node: Node,
    kind: RelationshipKind,
    ref_kind: Option<RefKind>,
    arity: Option<u32>,
    awaited: Option<bool>,
) -> Option<RawRef> {
    let loc = location_of(ctx.repo_relative_path, node);

    // (a) local same-file symbol (includes `this.<member>` resolved
    // earlier by the caller passing the bare member name).
    if let Some(id) = scope.names.get(name) {
        return Some(RawRef {
            to_id: id.clone(),
            kind,
            ref_kind,
            resolution: Resolution::Direct,
            scope: Scope::Local,
            location: loc,
            inferred: false,
            target_is_resolved_symbol: true,
            is_exported: false,
            import_depth: None,
            arity,
            awaited,
            operator: None,
            access_path: access_path.clone(),
            param_name: None,
            name_len: name.len(),
        });
    }

    // (d) imported root + member via export map.
    if let Some(imported) = imports.get(name) {
        let Some(target_file) = &imported.target_file else {
            return None;
        };
        let export_map = ctx.project.export_map(target_file);
        let lookup_name = if imported.exported_name == "*" { name } else { &imported.exported_name };
        if let Some(entry) = export_map.get(lookup_name) {
            let decl_rel = support::repo_relative(&ctx.project.repo_root, &entry.decl_file);
            let to_id = format!("file:{}:{}", decl_rel, entry.decl_name);
            return Some(RawRef {
                to_id,
                kind,
                ref_kind,
                resolution: Resolution::ViaImport,
                scope: Scope::Imported,
                location: loc,
                inferred: true,
                target_is_resolved_symbol: true,
                is_exported: true,
                import_depth: Some(entry.depth),
                arity,
                awaited,
                operator: None,
                access_path: access_path.clone(),
                param_name: None,
                name_len: name.len(),
            });
        }
        // Import resolved to a file but the name wasn't found in its
        // export map (e.g. resolution degraded); fall through to drop.
    }

    // (e) drop.
    None
}

fn resolve_or_placeholder(name: &str, scope: &LocalScope, imports: &HashMap<String, ImportedName>, ctx: &ExtractionContext, placeholder_prefix: &str) -> String {
    if let Some(id) = scope.names.get(name) {
        return id.clone();
    }
    if let Some(imported) = imports.get(name) {
        if let Some(target_file) = &imported.target_file {
            let export_map = ctx.project.export_map(target_file);
            let lookup_name = if imported.exported_name == "*" { name } else { &imported.exported_name };
            if let Some(entry) = export_map.get(lookup_name) {
                let decl_rel = support::repo_relative(&ctx.project.repo_root, &entry.decl_file);
                return format!("file:{}:{}", decl_rel, entry.decl_name);
            }
        }
    }
    format!("{}:{}", placeholder_prefix, name)
}

fn placeholder_ref(to_id: String, kind: RelationshipKind, ref_kind: RefKind, node: Node, name: &str, scope: &LocalScope, _imports: &HashMap<String, ImportedName>) -> RawRef {
    let resolved_locally = scope.names.contains_key(name);
    RawRef {
        to_id,
        kind,
        ref_kind: Some(ref_kind),
        resolution: if resolved_locally { Resolution::Direct } else { Resolution::Heuristic },
        scope: if resolved_locally { Scope::Local } else { Scope::Unknown },
        location: Location { path: String::new(), line: node.start_position().row as u32 + 1, column: node.start_position().column as u32 + 1 },
        inferred: !resolved_locally,
        target_is_resolved_symbol: resolved_locally,
        is_exported: false,
        import_depth: None,
        arity: None,
        awaited: None,
        operator: None,
        access_path: None,
        param_name: None,
        name_len: name.len(),
    }
}

// ---------------------------------------------------------------------
// Heritage + overrides
// ---------------------------------------------------------------------

fn emit_heritage_and_overrides(scope: &LocalScope, file_id: &str, file_rel: &str, ctx: &ExtractionContext, imports: &HashMap<String, ImportedName>, result: &mut ExtractionResult) {
    for (class_name, (extends, implements)) in &scope.class_heritage {
        let Some(class_id) = scope.names.get(class_name) else { continue };
        let loc = Location { path: file_rel.to_string(), line: 1, column: 1 };

        for parent in extends {
            let to_id = resolve_or_placeholder(parent, scope, imports, ctx, "class");
            result.relationships.push(direct_or_heuristic_rel(class_id, &to_id, RelationshipKind::Extends, loc.clone(), scope, parent));

            // Overrides: any member this class also declares that the
            // (locally-known) parent class declares too.
            if let Some(parent_members) = scope.class_members.get(parent) {
                if let Some(own_members) = scope.class_members.get(class_name) {
                    for (member_name, member_id) in own_members {
                        if let Some(parent_member_id) = parent_members.get(member_name) {
                            result.relationships.push(structural_rel(member_id, parent_member_id, RelationshipKind::Overrides, loc.clone()));
                        }
                    }
                }
            }
        }
        for iface in implements {
            let to_id = resolve_or_placeholder(iface, scope, imports, ctx, "interface");
            result.relationships.push(direct_or_heuristic_rel(class_id, &to_id, RelationshipKind::Implements, loc.clone(), scope, iface));
        }
        let _ = file_id;
    }
}

fn direct_or_heuristic_rel(from: &str, to: &str, kind: RelationshipKind, location: Location, scope: &LocalScope, target_name: &str) -> codegraph_core::Relationship {
    if scope.names.contains_key(target_name) {
        structural_rel(from, to, kind, location)
    } else {
        codegraph_core::Relationship {
            id: codegraph_core::rel_id(from, to, rel_kind_label(kind)),
            from_entity_id: from.to_string(),
            to_entity_id: to.to_string(),
            kind,
            source: codegraph_core::EdgeSource::Heuristic,
            resolution: Resolution::Heuristic,
            scope: Scope::Unknown,
            ref_kind: None,
            confidence: 1.0,
            occurrences: 1,
            inferred: false,
            resolved: false,
            used_type_checker: false,
            is_exported: false,
            import_depth: None,
            arity: None,
            awaited: None,
            operator: None,
            access_path: None,
            param_name: None,
            location: location.clone(),
            locations: vec![location.clone()],
            evidence: vec![codegraph_core::Evidence { source: codegraph_core::EdgeSource::Heuristic, confidence: 1.0, location, note: None }],
        }
    }
}

// ---------------------------------------------------------------------
// Small node-text helpers
// ---------------------------------------------------------------------

fn text(node: Node, source: &str) -> Option<String> {
    node.utf8_text(source.as_bytes()).ok().map(|s| s.to_string())
}

fn signature_text(node: Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or_default().to_string()
}

fn doc_has_deprecated(node: Node, source: &str) -> bool {
    leading_docstring(node, source, COMMENT_KINDS).map(|d| d.to_lowercase().contains("@deprecated")).unwrap_or(false)
}

fn method_name(node: Node, source: &str) -> Option<String> {
    node.child_by_field_name("name").and_then(|n| text(n, source))
}

fn method_visibility(node: Node, source: &str) -> Visibility {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match text(child, source).as_deref() {
            Some("private") => return Visibility::Private,
            Some("protected") => return Visibility::Protected,
            Some("public") => return Visibility::Public,
            _ => {}
        }
    }
    if method_name(node, source).map(|n| n.starts_with('#') || n.starts_with('_')).unwrap_or(false) {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

fn heritage_of(class_node: Node, source: &str) -> (Vec<String>, Vec<String>) {
    let mut extends = Vec::new();
    let mut implements = Vec::new();
    if let Some(heritage) = class_node.children(&mut class_node.walk()).find(|c| c.kind() == "class_heritage") {
        let mut cursor = heritage.walk();
        for clause in heritage.children(&mut cursor) {
            match clause.kind() {
                "extends_clause" => {
                    if let Some(value) = clause.child_by_field_name("value").and_then(|n| type_name(n, source)) {
                        extends.push(value);
                    }
                }
                "implements_clause" => {
                    let mut icursor = clause.walk();
                    for t in clause.children(&mut icursor) {
                        if let Some(name) = type_name(t, source) {
                            implements.push(name);
                        }
                    }
                }
                _ => {}
            }
        }
    }
    (extends, implements)
}

fn interface_extends(node: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind().contains("extends") {
            let mut icursor = child.walk();
            for t in child.children(&mut icursor) {
                if let Some(name) = type_name(t, source) {
                    out.push(name);
                }
            }
        }
    }
    out
}

fn type_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "type_identifier" | "identifier" => text(node, source),
        _ => {
            let mut cursor = node.walk();
            node.children(&mut cursor).find_map(|c| type_name(c, source)).or_else(|| text(node, source))
        }
    }
}

fn simple_identifier(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" => text(node, source),
        "member_expression" => node.child_by_field_name("property").and_then(|n| text(n, source)),
        _ => None,
    }
}

/// The simple callee name plus the full dotted access path, for a call or
/// constructor target expression.
fn callee_name_of(node: Node, source: &str) -> Option<(String, Option<String>)> {
    match node.kind() {
        "identifier" => text(node, source).map(|n| (n, None)),
        "member_expression" => {
            let full = text(node, source)?;
            let prop = node.child_by_field_name("property").and_then(|n| text(n, source))?;
            Some((last_segment(&prop).to_string(), Some(full)))
        }
        _ => None,
    }
}

fn assignment_operator(node: Node, source: &str) -> Option<String> {
    let left = node.child_by_field_name("left")?;
    let right = node.child_by_field_name("right")?;
    let between = &source.as_bytes()[left.end_byte()..right.start_byte()];
    let s = std::str::from_utf8(between).ok()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn count_arguments(args: Node) -> u32 {
    let mut count = 0;
    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        if child.is_named() {
            count += 1;
        }
    }
    count
}

fn parse_parameters(fn_node: Node, source: &str) -> Vec<Parameter> {
    let Some(params) = fn_node.child_by_field_name("parameters") else { return Vec::new() };
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                if let Some(name) = text(child, source) {
                    out.push(Parameter { name, r#type: None, default: None, optional: false });
                }
            }
            "required_parameter" | "optional_parameter" => {
                let name = child
                    .child_by_field_name("pattern")
                    .and_then(|n| text(n, source))
                    .unwrap_or_default();
                let ty = child.child_by_field_name("type").and_then(|n| text(n, source));
                let default = child.child_by_field_name("value").and_then(|n| text(n, source));
                out.push(Parameter { name, r#type: ty, default, optional: child.kind() == "optional_parameter" });
            }
            "assignment_pattern" => {
                let name = child.child_by_field_name("left").and_then(|n| text(n, source)).unwrap_or_default();
                let default = child.child_by_field_name("right").and_then(|n| text(n, source));
                out.push(Parameter { name, r#type: None, default, optional: true });
            }
            _ => {}
        }
    }
    out
}

// ---------------------------------------------------------------------
// Text-only export scanning, used by `resolution::ProjectContext` (no
// parsed tree available there — just the raw bytes off disk).
// ---------------------------------------------------------------------

fn export_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*export\s+(?:default\s+)?(?:abstract\s+)?(?:async\s+)?(?:function\*?|class|interface|type|const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap())
}

fn export_default_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*export\s+default\b").unwrap())
}

fn export_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?m)^\s*export\s+\*\s*(?:as\s+([A-Za-z_$][A-Za-z0-9_$]*)\s+)?from\s+['"]([^'"]+)['"]"#).unwrap())
}

fn export_named_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?m)^\s*export\s*\{([^}]*)\}\s*(?:from\s+['"]([^'"]+)['"])?"#).unwrap())
}

/// Best-effort regex scan of JS/TS source for exported names and
/// re-export specs — used only by the resolver's filesystem export
/// source, which has no parsed tree to walk.
pub fn scan_exports(text: &str) -> (Vec<String>, Vec<ReExportSpec>) {
    let mut direct = Vec::new();
    let mut re_exports = Vec::new();

    for cap in export_decl_re().captures_iter(text) {
        direct.push(cap[1].to_string());
    }
    if export_default_re().is_match(text) {
        direct.push("default".to_string());
    }
    for cap in export_star_re().captures_iter(text) {
        let from_specifier = cap[2].to_string();
        let exported_as = cap.get(1).map(|m| m.as_str().to_string());
        re_exports.push(ReExportSpec { imported_name: None, exported_as, from_specifier });
    }
    for cap in export_named_re().captures_iter(text) {
        let names = &cap[1];
        let from = cap.get(2).map(|m| m.as_str().to_string());
        for item in names.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (name, alias) = match item.split_once(" as ") {
                Some((n, a)) => (n.trim().to_string(), Some(a.trim().to_string())),
                None => (item.to_string(), None),
            };
            match &from {
                Some(specifier) => {
                    re_exports.push(ReExportSpec { imported_name: Some(name), exported_as: alias, from_specifier: specifier.clone() });
                }
                None => direct.push(alias.unwrap_or(name)),
            }
        }
    }

    direct.sort();
    direct.dedup();
    (direct, re_exports)
}

fn top_level_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:export\s+)?(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:def|fn|func|function|class|struct|interface|type|const|let|var)\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
    })
}

/// Generic fallback for non-JS/TS files: every top-level declaration name,
/// matched across common keywords (`def`, `fn`, `func`, `class`, `struct`,
/// ...). Good enough for the re-export resolver to terminate correctly
/// when a non-ECMA file is at the end of an import chain — those files
/// never carry re-exports of their own, so this only ever needs to supply
/// direct (depth-0) names.
pub fn scan_top_level_declarations(text: &str) -> Vec<String> {
    let mut names: Vec<String> = top_level_decl_re().captures_iter(text).map(|c| c[1].to_string()).collect();
    names.sort();
    names.dedup();
    names
}
