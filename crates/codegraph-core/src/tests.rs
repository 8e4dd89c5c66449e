//! Cross-module integration tests for the graph store and its data model.

use std::collections::HashMap;

use chrono::Utc;

use crate::ids;
use crate::model::*;
use crate::Graph;

fn symbol_entity(file: &str, name: &str, signature: &str, is_exported: bool) -> Entity {
    let now = Utc::now();
    Entity {
        id: ids::symbol_id(file, name, signature),
        kind: EntityKind::Symbol(SymbolKind::Function),
        path: file.to_string(),
        content_hash: ids::sha256_hex(signature.as_bytes()),
        language: Some(Language::Rust),
        created: now,
        last_modified: now,
        metadata: HashMap::new(),
        attrs: EntityAttrs::Symbol {
            name: name.to_string(),
            signature: signature.to_string(),
            docstring: None,
            visibility: Visibility::Public,
            is_exported,
            is_deprecated: false,
            function: Some(FunctionAttrs {
                parameters: Vec::new(),
                return_type: None,
                is_async: false,
                is_generator: false,
                cyclomatic_complexity: 1,
            }),
            class: None,
            interface: None,
            type_alias: None,
        },
    }
}

fn relationship(from: &str, to: &str, kind: RelationshipKind, line: u32) -> Relationship {
    Relationship {
        id: ids::rel_id(from, to, &format!("{:?}", kind)),
        from_entity_id: from.to_string(),
        to_entity_id: to.to_string(),
        kind,
        source: EdgeSource::Ast,
        resolution: Resolution::Direct,
        scope: Scope::Local,
        ref_kind: Some(RefKind::Call),
        confidence: 1.0,
        occurrences: 1,
        inferred: false,
        resolved: true,
        used_type_checker: false,
        is_exported: false,
        import_depth: None,
        arity: None,
        awaited: None,
        operator: None,
        access_path: None,
        param_name: None,
        location: Location { path: from.to_string(), line, column: 0 },
        locations: vec![Location { path: from.to_string(), line, column: 0 }],
        evidence: Vec::new(),
    }
}

#[test]
fn entity_ids_are_stable_and_distinguish_signatures() {
    let a = ids::symbol_id("src/lib.rs", "foo", "fn foo()");
    let b = ids::symbol_id("src/lib.rs", "foo", "fn foo()");
    let c = ids::symbol_id("src/lib.rs", "foo", "fn foo(x: i32)");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn graph_upsert_entity_replaces_previous_value() {
    let mut graph = Graph::new();
    let first = symbol_entity("src/lib.rs", "foo", "fn foo()", false);
    let id = first.id.clone();
    graph.upsert_entity(first);
    assert_eq!(graph.entity_count(), 1);

    let mut updated = symbol_entity("src/lib.rs", "foo", "fn foo()", true);
    updated.id = id.clone();
    graph.upsert_entity(updated);
    assert_eq!(graph.entity_count(), 1);

    let stored = graph.entity(&id).unwrap();
    match stored.attrs {
        EntityAttrs::Symbol { is_exported, .. } => assert!(is_exported),
        _ => panic!("expected symbol"),
    }
}

#[test]
fn duplicate_relationship_emissions_fold_into_one_edge() {
    let mut graph = Graph::new();
    let a = symbol_entity("src/a.rs", "caller", "fn caller()", false);
    let b = symbol_entity("src/b.rs", "callee", "fn callee()", true);
    let (a_id, b_id) = (a.id.clone(), b.id.clone());
    graph.upsert_entity(a);
    graph.upsert_entity(b);

    graph.upsert_relationship(relationship(&a_id, &b_id, RelationshipKind::Calls, 10));
    graph.upsert_relationship(relationship(&a_id, &b_id, RelationshipKind::Calls, 12));

    assert_eq!(graph.relationship_count(), 1);
    let rels = graph.relationships_from(&a_id);
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].occurrences, 2);
    assert_eq!(rels[0].location.line, 10);
    assert_eq!(rels[0].locations.len(), 2);
}

#[test]
fn ancestors_follow_contains_edges_upward() {
    let mut graph = Graph::new();
    let dir = Entity {
        id: ids::dir_id("src"),
        kind: EntityKind::Directory,
        path: "src".to_string(),
        content_hash: String::new(),
        language: None,
        created: Utc::now(),
        last_modified: Utc::now(),
        metadata: HashMap::new(),
        attrs: EntityAttrs::Directory { depth: 0, children: Vec::new() },
    };
    let file = Entity {
        id: ids::file_id("src/lib.rs"),
        kind: EntityKind::File,
        path: "src/lib.rs".to_string(),
        content_hash: String::new(),
        language: Some(Language::Rust),
        created: Utc::now(),
        last_modified: Utc::now(),
        metadata: HashMap::new(),
        attrs: EntityAttrs::File {
            extension: "rs".to_string(),
            size_bytes: 0,
            line_count: 0,
            is_test: false,
            is_config: false,
            dependencies: Vec::new(),
        },
    };
    let (dir_id, file_id) = (dir.id.clone(), file.id.clone());
    graph.upsert_entity(dir);
    graph.upsert_entity(file);
    graph.upsert_relationship(relationship(&dir_id, &file_id, RelationshipKind::Contains, 0));

    let ancestors = graph.ancestors(&file_id);
    assert!(ancestors.contains(&dir_id));
}

#[test]
fn traverse_respects_depth_and_kind_filter() {
    let mut graph = Graph::new();
    let a = symbol_entity("a.rs", "a", "fn a()", false);
    let b = symbol_entity("b.rs", "b", "fn b()", false);
    let c = symbol_entity("c.rs", "c", "fn c()", false);
    let (a_id, b_id, c_id) = (a.id.clone(), b.id.clone(), c.id.clone());
    graph.upsert_entity(a);
    graph.upsert_entity(b);
    graph.upsert_entity(c);
    graph.upsert_relationship(relationship(&a_id, &b_id, RelationshipKind::Calls, 1));
    graph.upsert_relationship(relationship(&b_id, &c_id, RelationshipKind::Calls, 1));

    let one_hop = graph.traverse(&a_id, &[RelationshipKind::Calls], 1, 10);
    assert_eq!(one_hop, vec![b_id.clone()]);

    let two_hop = graph.traverse(&a_id, &[RelationshipKind::Calls], 2, 10);
    assert!(two_hop.contains(&c_id));
}

#[test]
fn language_detection_matches_extension_table() {
    use std::path::Path;
    let cases = [
        ("test.rs", Language::Rust),
        ("main.ts", Language::TypeScript),
        ("app.js", Language::JavaScript),
        ("lib.py", Language::Python),
        ("main.go", Language::Go),
        ("Main.java", Language::Java),
        ("main.c", Language::C),
        ("main.cpp", Language::Cpp),
        ("config.yml", Language::Yaml),
        ("config.toml", Language::Toml),
        ("package.json", Language::Json),
        ("unknown.xyz", Language::Other),
    ];
    for (path, expected) in cases {
        assert_eq!(Language::from_path(Path::new(path)), expected, "failed for {path}");
    }
}
