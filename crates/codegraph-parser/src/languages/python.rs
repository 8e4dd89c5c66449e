//! Python extraction. Functions, classes/methods, module-level variables,
//! imports, and same-file call/instantiation resolution; imports resolve
//! to a declaring file by bare-module/relative-dots heuristics rather than
//! the full `tsconfig`-style resolver `ecma.rs` uses, since Python's import
//! system has no equivalent path-alias config in scope here.

use std::collections::HashMap;
use std::path::Path;

use codegraph_core::{
    EntityAttrs, FunctionAttrs, Language, Location, Parameter, RefKind, RelationshipKind, Resolution, Scope,
    SymbolKind, Visibility,
};
use tree_sitter::{Node, Parser};

use crate::extractor::{ExtractionContext, ExtractionResult, LanguageExtractor};
use crate::support::{self, cyclomatic_complexity, location_of, structural_rel, symbol_entity, synthesize_directories, ComplexityKinds, RawRef};

const COMPLEXITY: ComplexityKinds = ComplexityKinds {
    conditionals: &["if_statement", "conditional_expression", "elif_clause"],
    loops: &["for_statement", "while_statement"],
    case_clauses: &["case_clause"],
    ternaries: &["conditional_expression"],
};

const COMMENT_KINDS: &[&str] = &["comment"];

#[derive(Default)]
struct LocalScope {
    names: HashMap<String, String>,
    class_members: HashMap<String, HashMap<String, String>>,
}

pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn extract(&self, path: &Path, source: &str, ctx: &ExtractionContext) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        let file_rel = ctx.repo_relative_path;
        let file_id = codegraph_core::file_id(file_rel);

        let mut parser = Parser::new();
        if parser.set_language(&tree_sitter_python::LANGUAGE.into()).is_err() {
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

        let mut scope = LocalScope::default();
        collect_scope(root, source, file_rel, &mut scope);

        let mut exported = Vec::new();
        collect_symbols(root, source, &file_id, file_rel, &scope, None, &mut exported, &mut result);

        let imports = collect_imports(root, source, path, ctx);

        let mut raw = Vec::new();
        walk_refs(root, source, &scope, &imports, ctx, &mut raw);
        result.relationships.extend(support::aggregate(&file_id, file_rel, raw, ctx.noise));

        result
    }
}

fn collect_scope(root: Node, source: &str, file_rel: &str, scope: &mut LocalScope) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        visit_scope(child, source, file_rel, scope, None);
    }
}

fn visit_scope(node: Node, source: &str, file_rel: &str, scope: &mut LocalScope, class_ctx: Option<&str>) {
    match node.kind() {
        "function_definition" => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) {
                let sig = signature(node, source);
                let id = codegraph_core::symbol_id(file_rel, &name, &sig);
                if let Some(class) = class_ctx {
                    scope.class_members.entry(class.to_string()).or_default().insert(name.clone(), id.clone());
                }
                scope.names.insert(name, id);
            }
        }
        "class_definition" => {
            let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) else { return };
            let sig = signature(node, source);
            let id = codegraph_core::symbol_id(file_rel, &name, &sig);
            scope.names.insert(name.clone(), id);
            if let Some(body) = node.child_by_field_name("body") {
                let mut bcursor = body.walk();
                for member in body.children(&mut bcursor) {
                    visit_scope(member, source, file_rel, scope, Some(&name));
                }
            }
        }
        "expression_statement" => {
            if let Some(assign) = node.children(&mut node.walk()).find(|c| c.kind() == "assignment") {
                if let Some(left) = assign.child_by_field_name("left") {
                    if let Some(name) = text(left, source) {
                        if class_ctx.is_none() {
                            let sig = signature(assign, source);
                            let id = codegraph_core::symbol_id(file_rel, &name, &sig);
                            scope.names.insert(name, id);
                        }
                    }
                }
            }
        }
        _ => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn collect_symbols(
    root: Node,
    source: &str,
    file_id: &str,
    file_rel: &str,
    scope: &LocalScope,
    owning_class: Option<(&str, &str)>,
    exported: &mut Vec<String>,
    result: &mut ExtractionResult,
) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        emit_symbol(child, source, file_id, file_rel, scope, owning_class, exported, result);
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_symbol(
    node: Node,
    source: &str,
    file_id: &str,
    file_rel: &str,
    scope: &LocalScope,
    owning_class: Option<(&str, &str)>,
    exported: &mut Vec<String>,
    result: &mut ExtractionResult,
) {
    match node.kind() {
        "function_definition" => {
            let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) else { return };
            let sig = signature(node, source);
            let doc = docstring(node, source);
            let is_async = node.children(&mut node.walk()).any(|c| text(c, source).as_deref() == Some("async"));
            let params = parse_parameters(node, source);
            let return_type = node.child_by_field_name("return_type").and_then(|n| text(n, source));
            let complexity = node.child_by_field_name("body").map(|b| cyclomatic_complexity(b, &COMPLEXITY)).unwrap_or(1);
            let is_exported = !name.starts_with('_');
            if is_exported {
                exported.push(name.clone());
            }

            let kind = if owning_class.is_some() { SymbolKind::Method } else { SymbolKind::Function };
            let visibility = if name.starts_with("__") && !name.ends_with("__") {
                Visibility::Private
            } else if name.starts_with('_') {
                Visibility::Protected
            } else {
                Visibility::Public
            };

            let attrs = EntityAttrs::Symbol {
                name: name.clone(),
                signature: sig.clone(),
                docstring: doc,
                visibility,
                is_exported,
                is_deprecated: has_deprecated_decorator(node, source),
                function: Some(FunctionAttrs { parameters: params, return_type, is_async, is_generator: contains_yield(node), cyclomatic_complexity: complexity }),
                class: None,
                interface: None,
                type_alias: None,
            };
            let entity = symbol_entity(file_rel, &name, &sig, Language::Python, kind, attrs);
            emit_defines(file_id, &entity.id, file_rel, node, result);
            if let Some((_, class_id)) = owning_class {
                result.relationships.push(structural_rel(class_id, &entity.id, RelationshipKind::Contains, location_of(file_rel, node)));
            }
            result.entities.push(entity);
        }
        "class_definition" => {
            let Some(name) = node.child_by_field_name("name").and_then(|n| text(n, source)) else { return };
            let sig = signature(node, source);
            let doc = docstring(node, source);
            let is_exported = !name.starts_with('_');
            if is_exported {
                exported.push(name.clone());
            }
            let bases = class_bases(node, source);

            let mut method_names = Vec::new();
            if let Some(body) = node.child_by_field_name("body") {
                let mut bcursor = body.walk();
                for member in body.children(&mut bcursor) {
                    if member.kind() == "function_definition" {
                        if let Some(n) = member.child_by_field_name("name").and_then(|n| text(n, source)) {
                            method_names.push(n);
                        }
                    }
                }
            }

            let attrs = EntityAttrs::Symbol {
                name: name.clone(),
                signature: sig.clone(),
                docstring: doc,
                visibility: Visibility::Public,
                is_exported,
                is_deprecated: has_deprecated_decorator(node, source),
                function: None,
                class: Some(codegraph_core::ClassAttrs { extends: bases, implements: Vec::new(), is_abstract: false, methods: method_names, properties: Vec::new() }),
                interface: None,
                type_alias: None,
            };
            let class_entity = symbol_entity(file_rel, &name, &sig, Language::Python, SymbolKind::Class, attrs);
            emit_defines(file_id, &class_entity.id, file_rel, node, result);
            let class_id = class_entity.id.clone();
            result.entities.push(class_entity);

            if let Some(body) = node.child_by_field_name("body") {
                let mut bcursor = body.walk();
                for member in body.children(&mut bcursor) {
                    emit_symbol(member, source, file_id, file_rel, scope, Some((&name, &class_id)), exported, result);
                }
            }

            // Extends edges: Python classes resolve local bases only; a
            // base name from another module rarely appears as a plain
            // identifier without a qualifying import alias, and chasing
            // that is out of scope for this extractor's fidelity tier.
            if let Some((extends_list, _)) = node
                .children(&mut node.walk())
                .find(|c| c.kind() == "argument_list")
                .map(|n| (class_bases_from(n, source), ()))
            {
                for base in extends_list {
                    if let Some(base_id) = scope.names.get(&base) {
                        result.relationships.push(structural_rel(&class_id, base_id, RelationshipKind::Extends, location_of(file_rel, node)));
                    }
                }
            }
        }
        "expression_statement" if owning_class.is_none() => {
            if let Some(assign) = node.children(&mut node.walk()).find(|c| c.kind() == "assignment") {
                if let Some(left) = assign.child_by_field_name("left") {
                    if let Some(name) = text(left, source) {
                        let sig = signature(assign, source);
                        let attrs = EntityAttrs::Symbol {
                            name: name.clone(),
                            signature: sig.clone(),
                            docstring: None,
                            visibility: if name.starts_with('_') { Visibility::Private } else { Visibility::Public },
                            is_exported: !name.starts_with('_'),
                            is_deprecated: false,
                            function: None,
                            class: None,
                            interface: None,
                            type_alias: None,
                        };
                        let entity = symbol_entity(file_rel, &name, &sig, Language::Python, SymbolKind::Variable, attrs);
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

struct ImportedModule {
    module: String,
}

fn collect_imports(root: Node, source: &str, _path: &Path, _ctx: &ExtractionContext) -> HashMap<String, ImportedModule> {
    let mut map = HashMap::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "import_statement" => {
                let mut icursor = child.walk();
                for part in child.children(&mut icursor) {
                    match part.kind() {
                        "dotted_name" => {
                            if let Some(module) = text(part, source) {
                                let local = module.split('.').next().unwrap_or(&module).to_string();
                                map.insert(local, ImportedModule { module });
                            }
                        }
                        "aliased_import" => {
                            let module = part.child_by_field_name("name").and_then(|n| text(n, source)).unwrap_or_default();
                            if let Some(alias) = part.child_by_field_name("alias").and_then(|n| text(n, source)) {
                                map.insert(alias, ImportedModule { module });
                            }
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                let module = child.child_by_field_name("module_name").and_then(|n| text(n, source)).unwrap_or_default();
                let mut icursor = child.walk();
                for part in child.children(&mut icursor) {
                    if part.kind() == "dotted_name" || part.kind() == "identifier" {
                        if let Some(name) = text(part, source) {
                            if name != module {
                                map.insert(name, ImportedModule { module: module.clone() });
                            }
                        }
                    } else if part.kind() == "aliased_import" {
                        if let Some(alias) = part.child_by_field_name("alias").and_then(|n| text(n, source)) {
                            map.insert(alias, ImportedModule { module: module.clone() });
                        }
                    }
                }
            }
            _ => {}
        }
    }
    map
}

fn walk_refs(node: Node, source: &str, scope: &LocalScope, imports: &HashMap<String, ImportedModule>, ctx: &ExtractionContext, out: &mut Vec<RawRef>) {
    match node.kind() {
        "call" => {
            if let Some(func) = node.child_by_field_name("function") {
                let arity = node.child_by_field_name("arguments").map(count_args).unwrap_or(0);
                if let Some(name) = callee_name(func, source) {
                    if !ctx.noise.is_noise(&name) {
                        if let Some(id) = scope.names.get(&name) {
                            out.push(local_ref(id.clone(), RelationshipKind::Calls, RefKind::Call, node, ctx, arity, name.len()));
                        } else if let Some(import) = imports.get(&name) {
                            let to_id = format!("module:{}:{}", import.module, name);
                            out.push(imported_ref(to_id, RelationshipKind::Calls, RefKind::Call, node, ctx, arity, name.len()));
                        }
                    }
                }
            }
        }
        "assignment" => {
            if let Some(left) = node.child_by_field_name("left") {
                if let Some(name) = text(left, source) {
                    if !ctx.noise.is_noise(&name) {
                        if let Some(id) = scope.names.get(&name) {
                            out.push(local_ref(id.clone(), RelationshipKind::Writes, RefKind::Write, left, ctx, None, name.len()));
                        }
                    }
                }
            }
        }
        "raise_statement" => {
            if let Some(name) = node
                .children(&mut node.walk())
                .find(|c| c.kind() == "call")
                .and_then(|c| c.child_by_field_name("function"))
                .and_then(|f| callee_name(f, source))
            {
                if !ctx.noise.is_noise(&name) {
                    if let Some(id) = scope.names.get(&name) {
                        out.push(local_ref(id.clone(), RelationshipKind::Throws, RefKind::Throw, node, ctx, None, name.len()));
                    } else {
                        let to_id = format!("class:{}", name);
                        out.push(imported_ref(to_id, RelationshipKind::Throws, RefKind::Throw, node, ctx, None, name.len()));
                    }
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_refs(child, source, scope, imports, ctx, out);
    }
}

fn local_ref(to_id: String, kind: RelationshipKind, ref_kind: RefKind, node: Node, ctx: &ExtractionContext, arity: Option<u32>, name_len: usize) -> RawRef {
    RawRef {
        to_id,
        kind,
        ref_kind: Some(ref_kind),
        resolution: Resolution::Direct,
        scope: Scope::Local,
        location: location_of(ctx.repo_relative_path, node),
        inferred: false,
        target_is_resolved_symbol: true,
        is_exported: false,
        import_depth: None,
        arity,
        awaited: None,
        operator: None,
        access_path: None,
        param_name: None,
        name_len,
    }
}

fn imported_ref(to_id: String, kind: RelationshipKind, ref_kind: RefKind, node: Node, ctx: &ExtractionContext, arity: Option<u32>, name_len: usize) -> RawRef {
    RawRef {
        to_id,
        kind,
        ref_kind: Some(ref_kind),
        resolution: Resolution::Heuristic,
        scope: Scope::Imported,
        location: location_of(ctx.repo_relative_path, node),
        inferred: true,
        target_is_resolved_symbol: false,
        is_exported: false,
        import_depth: Some(1),
        arity,
        awaited: None,
        operator: None,
        access_path: None,
        param_name: None,
        name_len,
    }
}

fn text(node: Node, source: &str) -> Option<String> {
    node.utf8_text(source.as_bytes()).ok().map(|s| s.to_string())
}

fn signature(node: Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or_default().to_string()
}

fn docstring(fn_or_class: Node, source: &str) -> Option<String> {
    let body = fn_or_class.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() == "expression_statement" {
        let string_node = first.named_child(0)?;
        if string_node.kind() == "string" {
            return text(string_node, source).map(|s| s.trim_matches(|c| c == '"' || c == '\'').trim().to_string());
        }
    }
    None
}

fn has_deprecated_decorator(node: Node, source: &str) -> bool {
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "decorator" {
            if let Some(text) = text(s, source) {
                if text.to_lowercase().contains("deprecated") {
                    return true;
                }
            }
            sibling = s.prev_sibling();
        } else {
            break;
        }
    }
    false
}

fn contains_yield(node: Node) -> bool {
    fn walk(n: Node) -> bool {
        if n.kind() == "yield" {
            return true;
        }
        if n.kind() == "function_definition" {
            return false;
        }
        let mut cursor = n.walk();
        n.children(&mut cursor).any(walk)
    }
    node.child_by_field_name("body").map(|b| {
        let mut cursor = b.walk();
        b.children(&mut cursor).any(walk)
    }).unwrap_or(false)
}

fn class_bases(node: Node, source: &str) -> Vec<String> {
    node.children(&mut node.walk())
        .find(|c| c.kind() == "argument_list")
        .map(|n| class_bases_from(n, source))
        .unwrap_or_default()
}

fn class_bases_from(arg_list: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = arg_list.walk();
    for child in arg_list.children(&mut cursor) {
        if child.kind() == "identifier" {
            if let Some(name) = text(child, source) {
                out.push(name);
            }
        }
    }
    out
}

fn callee_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" => text(node, source),
        "attribute" => node.child_by_field_name("attribute").and_then(|n| text(n, source)),
        _ => None,
    }
}

fn count_args(args: Node) -> u32 {
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
            "typed_parameter" => {
                let name = child.named_child(0).and_then(|n| text(n, source)).unwrap_or_default();
                let ty = child.child_by_field_name("type").and_then(|n| text(n, source));
                out.push(Parameter { name, r#type: ty, default: None, optional: false });
            }
            "default_parameter" => {
                let name = child.child_by_field_name("name").and_then(|n| text(n, source)).unwrap_or_default();
                let default = child.child_by_field_name("value").and_then(|n| text(n, source));
                out.push(Parameter { name, r#type: None, default, optional: true });
            }
            "typed_default_parameter" => {
                let name = child.child_by_field_name("name").and_then(|n| text(n, source)).unwrap_or_default();
                let ty = child.child_by_field_name("type").and_then(|n| text(n, source));
                let default = child.child_by_field_name("value").and_then(|n| text(n, source));
                out.push(Parameter { name, r#type: ty, default, optional: true });
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::NoiseConfig;
    use crate::resolution::ProjectContext;

    fn ctx<'a>(noise: &'a NoiseConfig, project: &'a ProjectContext) -> ExtractionContext<'a> {
        ExtractionContext { repo_relative_path: "pkg/mod.py", noise, project }
    }

    #[test]
    fn extracts_function_and_class_with_method() {
        let source = r#"
class Greeter:
    def __init__(self, name):
        self.name = name

    def greet(self):
        return hello(self.name)

def hello(name):
    return f"hi {name}"
"#;
        let noise = NoiseConfig::default();
        let project = ProjectContext::new(std::env::temp_dir(), 6);
        let ctx = ctx(&noise, &project);
        let extractor = PythonExtractor;
        let result = extractor.extract(Path::new("pkg/mod.py"), source, &ctx);

        let names: Vec<&str> = result
            .entities
            .iter()
            .filter_map(|e| if let EntityAttrs::Symbol { name, .. } = &e.attrs { Some(name.as_str()) } else { None })
            .collect();
        assert!(names.contains(&"Greeter"));
        assert!(names.contains(&"greet"));
        assert!(names.contains(&"hello"));
    }

    #[test]
    fn private_name_is_not_exported() {
        let source = "def _helper():\n    pass\n";
        let noise = NoiseConfig::default();
        let project = ProjectContext::new(std::env::temp_dir(), 6);
        let ctx = ctx(&noise, &project);
        let extractor = PythonExtractor;
        let result = extractor.extract(Path::new("pkg/mod.py"), source, &ctx);
        let helper = result
            .entities
            .iter()
            .find(|e| matches!(&e.attrs, EntityAttrs::Symbol { name, .. } if name == "_helper"))
            .unwrap();
        match &helper.attrs {
            EntityAttrs::Symbol { is_exported, .. } => assert!(!is_exported),
            _ => unreachable!(),
        }
    }
}
