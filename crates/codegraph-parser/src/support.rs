//! Shared helpers used by every language extractor: deterministic entity
//! construction, raw-reference aggregation with confidence gating, and
//! directory synthesis. Factored out so each `languages/*.rs` walker only
//! has to produce observations, not re-derive the aggregation/id/scoring
//! rules the spec applies uniformly across languages.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use codegraph_core::{
    dir_id, file_id, rel_id, score_inferred_edge, sha256_hex, symbol_id, EdgeSource, Entity, EntityAttrs, EntityKind,
    Evidence, InferredEdgeInputs, Location, NoiseConfig, RefKind, Relationship, RelationshipKind, Resolution, Scope,
    SymbolKind,
};

/// One raw observation of a relationship, before same-parse aggregation
/// folds duplicate `(to, kind)` pairs into a single relationship with
/// summed `occurrences`. Structural edges (`CONTAINS`/`DEFINES`/`EXPORTS`)
/// skip this and go straight through [`structural_rel`] instead, since they
/// are never inferred and never repeat for the same pair within one file.
#[derive(Debug, Clone)]
pub struct RawRef {
    pub to_id: String,
    pub kind: RelationshipKind,
    pub ref_kind: Option<RefKind>,
    pub resolution: Resolution,
    pub scope: Scope,
    pub location: Location,
    /// Whether this observation's target was decided by static lookup
    /// (local symbol table) rather than a best-effort resolution chain.
    /// Determines whether confidence is pinned at 1.0 or run through
    /// [`score_inferred_edge`].
    pub inferred: bool,
    pub target_is_resolved_symbol: bool,
    pub is_exported: bool,
    pub import_depth: Option<u32>,
    pub arity: Option<u32>,
    pub awaited: Option<bool>,
    pub operator: Option<String>,
    pub access_path: Option<String>,
    pub param_name: Option<String>,
    pub name_len: usize,
}

impl RawRef {
    fn confidence(&self, from_file_rel: &str) -> f32 {
        if !self.inferred {
            return 1.0;
        }
        score_inferred_edge(&InferredEdgeInputs {
            used_type_checker: false,
            target_is_resolved_symbol: self.target_is_resolved_symbol,
            is_exported: self.is_exported,
            name_len: self.name_len,
            import_depth: self.import_depth.unwrap_or(0),
            from_file_rel,
        })
    }
}

/// Maps a [`RelationshipKind`] to the uppercase label used when minting
/// `rel_<sha1(from|to|type)>` ids (§3) — the same label any producer of
/// that kind must use, or folding across runs would silently break.
pub fn rel_kind_label(kind: RelationshipKind) -> &'static str {
    use RelationshipKind::*;
    match kind {
        Contains => "CONTAINS",
        Defines => "DEFINES",
        Exports => "EXPORTS",
        Imports => "IMPORTS",
        Calls => "CALLS",
        References => "REFERENCES",
        Reads => "READS",
        Writes => "WRITES",
        DependsOn => "DEPENDS_ON",
        Extends => "EXTENDS",
        Implements => "IMPLEMENTS",
        Overrides => "OVERRIDES",
        Throws => "THROWS",
        ReturnsType => "RETURNS_TYPE",
        ParamType => "PARAM_TYPE",
        CoverageProvides => "COVERAGE_PROVIDES",
        HasSecurityIssue => "HAS_SECURITY_ISSUE",
        DependsOnVulnerable => "DEPENDS_ON_VULNERABLE",
        SecurityImpacts => "SECURITY_IMPACTS",
    }
}

/// A structural edge (`CONTAINS`/`DEFINES`/`EXPORTS`): always direct,
/// local-scope, full confidence, emitted once per `(from, to)` pair.
pub fn structural_rel(from: &str, to: &str, kind: RelationshipKind, location: Location) -> Relationship {
    Relationship {
        id: rel_id(from, to, rel_kind_label(kind)),
        from_entity_id: from.to_string(),
        to_entity_id: to.to_string(),
        kind,
        source: EdgeSource::Ast,
        resolution: Resolution::Direct,
        scope: Scope::Local,
        ref_kind: None,
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
        location: location.clone(),
        locations: vec![location.clone()],
        evidence: vec![Evidence { source: EdgeSource::Ast, confidence: 1.0, location, note: None }],
    }
}

/// Fold raw observations from one file parse into aggregated relationships
/// per §4.4's "Aggregation" rule: group by `(to, kind)`, sum occurrences,
/// keep the earliest-seen location primary, append the rest to
/// `locations`/`evidence`. Edges whose scored confidence falls below
/// `noise.min_inferred_confidence` are dropped before aggregation, never
/// emitted (the confidence gate, §8 invariant 5).
pub fn aggregate(from_id: &str, from_file_rel: &str, raw: Vec<RawRef>, noise: &NoiseConfig) -> Vec<Relationship> {
    let mut folded: HashMap<(String, RelationshipKind), Relationship> = HashMap::new();

    for r in raw {
        let confidence = r.confidence(from_file_rel);
        if r.inferred && confidence < noise.min_inferred_confidence {
            continue;
        }
        let scope = r.scope;
        let resolution = r.resolution;
        let ref_kind = r.ref_kind;
        let rel = Relationship {
            id: rel_id(from_id, &r.to_id, rel_kind_label(r.kind)),
            from_entity_id: from_id.to_string(),
            to_entity_id: r.to_id.clone(),
            kind: r.kind,
            source: EdgeSource::Ast,
            resolution,
            scope,
            ref_kind,
            confidence,
            occurrences: 1,
            inferred: r.inferred,
            resolved: matches!(resolution, Resolution::Direct | Resolution::ViaImport | Resolution::TypeChecker),
            used_type_checker: false,
            is_exported: r.is_exported,
            import_depth: r.import_depth,
            arity: r.arity,
            awaited: r.awaited,
            operator: r.operator.clone(),
            access_path: r.access_path.clone(),
            param_name: r.param_name.clone(),
            location: r.location.clone(),
            locations: vec![r.location.clone()],
            evidence: vec![Evidence { source: EdgeSource::Ast, confidence, location: r.location, note: None }],
        };

        let key = (r.to_id, r.kind);
        folded.entry(key).and_modify(|existing| existing.fold(rel.clone())).or_insert(rel);
    }

    let mut out: Vec<Relationship> = folded.into_values().collect();
    out.sort_by(|a, b| (a.to_entity_id.as_str(), a.location.line).cmp(&(b.to_entity_id.as_str(), b.location.line)));
    out
}

/// Build a Symbol entity. `content_hash` is the sha256 of the signature
/// text, matching §3's "content hash of normalized representation" for a
/// declaration whose normalized form is its own source text.
pub fn symbol_entity(file_path: &str, name: &str, signature: &str, language: codegraph_core::Language, kind: SymbolKind, attrs: EntityAttrs) -> Entity {
    let now = Utc::now();
    Entity {
        id: symbol_id(file_path, name, signature),
        kind: EntityKind::Symbol(kind),
        path: file_path.to_string(),
        content_hash: sha256_hex(signature.as_bytes()),
        language: Some(language),
        created: now,
        last_modified: now,
        metadata: HashMap::new(),
        attrs,
    }
}

/// Generate `Directory` entities for every path prefix of `file_path`
/// (root-first) and `CONTAINS` edges parent→child and last-dir→file, per
/// §4.4 "Directory synthesis". Top-level directories have no parent edge —
/// each is the root of its own tree in the containment forest.
pub fn synthesize_directories(file_path: &str) -> (Vec<Entity>, Vec<Relationship>) {
    let now = Utc::now();
    let parts: Vec<&str> = file_path.split('/').filter(|s| !s.is_empty()).collect();
    if parts.len() <= 1 {
        return (Vec::new(), Vec::new());
    }

    let mut entities = Vec::new();
    let mut rels = Vec::new();
    let mut prefix = String::new();
    let mut parent_id: Option<String> = None;

    for (depth, part) in parts[..parts.len() - 1].iter().enumerate() {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(part);
        let id = dir_id(&prefix);
        entities.push(Entity {
            id: id.clone(),
            kind: EntityKind::Directory,
            path: prefix.clone(),
            content_hash: sha256_hex(prefix.as_bytes()),
            language: None,
            created: now,
            last_modified: now,
            metadata: HashMap::new(),
            attrs: EntityAttrs::Directory { depth: depth as u32, children: Vec::new() },
        });
        if let Some(parent) = &parent_id {
            rels.push(structural_rel(parent, &id, RelationshipKind::Contains, Location { path: prefix.clone(), line: 1, column: 1 }));
        }
        parent_id = Some(id);
    }

    if let Some(last_dir) = parent_id {
        rels.push(structural_rel(
            &last_dir,
            &file_id(file_path),
            RelationshipKind::Contains,
            Location { path: file_path.to_string(), line: 1, column: 1 },
        ));
    }

    (entities, rels)
}

/// Cyclomatic complexity, per §4.4: start at 1, +1 per conditional, loop,
/// switch-case clause, ternary — node kinds vary per grammar, so each
/// language module supplies its own [`ComplexityKinds`] table.
pub struct ComplexityKinds {
    pub conditionals: &'static [&'static str],
    pub loops: &'static [&'static str],
    pub case_clauses: &'static [&'static str],
    pub ternaries: &'static [&'static str],
}

pub fn cyclomatic_complexity(root: tree_sitter::Node, spec: &ComplexityKinds) -> u32 {
    fn walk(node: tree_sitter::Node, spec: &ComplexityKinds, count: &mut u32) {
        let kind = node.kind();
        if spec.conditionals.contains(&kind) || spec.loops.contains(&kind) || spec.case_clauses.contains(&kind) || spec.ternaries.contains(&kind) {
            *count += 1;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            walk(child, spec, count);
        }
    }
    let mut count = 1;
    walk(root, spec, &mut count);
    count
}

/// The leading run of comment siblings immediately before `node`, joined in
/// source order — a declaration's docstring, approximated as its doc
/// comment block.
pub fn leading_docstring(node: tree_sitter::Node, source: &str, comment_kinds: &[&str]) -> Option<String> {
    let mut comments = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(n) = current {
        if comment_kinds.contains(&n.kind()) {
            if let Ok(text) = n.utf8_text(source.as_bytes()) {
                comments.push(text.trim().to_string());
            }
            current = n.prev_sibling();
        } else {
            break;
        }
    }
    if comments.is_empty() {
        None
    } else {
        comments.reverse();
        Some(comments.join("\n"))
    }
}

/// 1-based `(line, column)` from a tree-sitter point.
pub fn point_to_line_col(point: tree_sitter::Point) -> (u32, u32) {
    (point.row as u32 + 1, point.column as u32 + 1)
}

pub fn location_of(path: &str, node: tree_sitter::Node) -> Location {
    let (line, column) = point_to_line_col(node.start_position());
    Location { path: path.to_string(), line, column }
}

/// The simple callee name of a call/instantiation target: the last
/// dot-separated segment of a property-access chain (`a.b.c` → `c`).
pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Normalize a path to repo-relative, forward-slash form.
pub fn repo_relative(repo_root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(repo_root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
