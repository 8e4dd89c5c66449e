//! The entity / relationship data model.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, RelationshipId};

/// Languages the parser pipeline is aware of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Java,
    C,
    Cpp,
    Yaml,
    Toml,
    Json,
    Sql,
    Dockerfile,
    Markdown,
    Other,
}

impl Language {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("rs") => Language::Rust,
            Some("ts") | Some("tsx") => Language::TypeScript,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("py") | Some("pyi") => Language::Python,
            Some("go") => Language::Go,
            Some("java") => Language::Java,
            Some("c") | Some("h") => Language::C,
            Some("cpp") | Some("cc") | Some("cxx") | Some("hpp") | Some("hh") => Language::Cpp,
            Some("yml") | Some("yaml") => Language::Yaml,
            Some("toml") => Language::Toml,
            Some("json") | Some("jsonc") => Language::Json,
            Some("sql") => Language::Sql,
            Some("md") | Some("mdx") => Language::Markdown,
            _ => {
                if path.file_name().is_some_and(|n| {
                    let s = n.to_string_lossy();
                    s == "Dockerfile" || s.starts_with("Dockerfile.")
                }) {
                    Language::Dockerfile
                } else {
                    Language::Other
                }
            }
        }
    }
}

/// Visibility modifier on a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

/// The shape of symbol an entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    TypeAlias,
    Variable,
    Property,
    Method,
}

/// Discriminates what an entity is, without carrying its attributes — used
/// for cheap filtering (`nodes_of_kind`, structural search).
///
/// `Documentation`, `BusinessDomain`, `SecurityIssue`, and `Vulnerability`
/// are populated by external collaborators (doc ingestion, the security
/// rule engine, OSV-style lookups) rather than the parser itself; the core
/// only owns the tagged shape and the edges that hang off them
/// (`HAS_SECURITY_ISSUE`, `DEPENDS_ON_VULNERABLE`, `SECURITY_IMPACTS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    File,
    Directory,
    Symbol(SymbolKind),
    Test,
    Documentation,
    BusinessDomain,
    SecurityIssue,
    Vulnerability,
}

/// Severity scale shared by security issues and vulnerabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Parameter {
    pub name: String,
    pub r#type: Option<String>,
    pub default: Option<String>,
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Coverage {
    pub lines: u32,
    pub branches: u32,
    pub functions: u32,
    pub statements: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestType {
    Unit,
    Integration,
    E2e,
}

/// Per-kind attribute payload. The active variant matches `EntityKind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityAttrs {
    File {
        extension: String,
        size_bytes: u64,
        line_count: u32,
        is_test: bool,
        is_config: bool,
        dependencies: Vec<String>,
    },
    Directory {
        depth: u32,
        children: Vec<EntityId>,
    },
    Symbol {
        name: String,
        signature: String,
        docstring: Option<String>,
        visibility: Visibility,
        is_exported: bool,
        is_deprecated: bool,
        function: Option<FunctionAttrs>,
        class: Option<ClassAttrs>,
        interface: Option<InterfaceAttrs>,
        type_alias: Option<TypeAliasAttrs>,
    },
    Test {
        test_type: TestType,
        framework: String,
        target_symbol: Option<EntityId>,
        coverage: Coverage,
        execution_history: Vec<TestExecution>,
        flaky_score: f32,
    },
    Documentation {
        title: String,
        format: String,
        covers_paths: Vec<String>,
    },
    BusinessDomain {
        name: String,
        description: Option<String>,
        owning_team: Option<String>,
    },
    SecurityIssue {
        rule_id: String,
        severity: IssueSeverity,
        confidence: f32,
        message: String,
        suppressed: bool,
    },
    Vulnerability {
        advisory_id: String,
        severity: IssueSeverity,
        package_name: String,
        affected_range: String,
        fixed_in: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionAttrs {
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub is_generator: bool,
    pub cyclomatic_complexity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAttrs {
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub is_abstract: bool,
    pub methods: Vec<String>,
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAttrs {
    pub extends: Vec<String>,
    pub methods: Vec<String>,
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAliasAttrs {
    pub aliased_type: String,
    pub is_union: bool,
    pub is_intersection: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestExecution {
    pub passed: bool,
    pub duration_ms: u64,
    pub ran_at: DateTime<Utc>,
}

/// A node in the code knowledge graph: a File, Directory, Symbol, or Test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub path: String,
    pub content_hash: String,
    pub language: Option<Language>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
    pub attrs: EntityAttrs,
}

impl Entity {
    /// Short display name: symbol/test name, or file/dir basename.
    pub fn display_name(&self) -> &str {
        match &self.attrs {
            EntityAttrs::Symbol { name, .. } => name,
            _ => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// Every relationship kind the graph can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    Contains,
    Defines,
    Exports,
    Imports,
    Calls,
    References,
    Reads,
    Writes,
    DependsOn,
    Extends,
    Implements,
    Overrides,
    Throws,
    ReturnsType,
    ParamType,
    CoverageProvides,
    HasSecurityIssue,
    DependsOnVulnerable,
    SecurityImpacts,
}

/// Where a relationship observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeSource {
    Ast,
    TypeChecker,
    Heuristic,
}

/// How a relationship's target was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Direct,
    ViaImport,
    TypeChecker,
    Heuristic,
}

/// The lexical scope a relationship's target lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    Local,
    Imported,
    External,
    Unknown,
}

/// The syntactic shape of a `CALLS`/`REFERENCES` observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefKind {
    Call,
    Instantiation,
    Identifier,
    Type,
    Read,
    Write,
    Override,
    Throw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: EdgeSource,
    pub confidence: f32,
    pub location: Location,
    pub note: Option<String>,
}

/// A directed, typed, confidence-scored edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub from_entity_id: EntityId,
    pub to_entity_id: EntityId,
    pub kind: RelationshipKind,
    pub source: EdgeSource,
    pub resolution: Resolution,
    pub scope: Scope,
    pub ref_kind: Option<RefKind>,
    pub confidence: f32,
    pub occurrences: u32,
    pub inferred: bool,
    pub resolved: bool,
    pub used_type_checker: bool,
    pub is_exported: bool,
    pub import_depth: Option<u32>,
    pub arity: Option<u32>,
    pub awaited: Option<bool>,
    pub operator: Option<String>,
    pub access_path: Option<String>,
    pub param_name: Option<String>,
    pub location: Location,
    pub locations: Vec<Location>,
    pub evidence: Vec<Evidence>,
}

impl Relationship {
    /// Fold `other` into `self` the way the graph service does on upsert:
    /// sum occurrences, keep the earlier primary location, append the rest.
    /// Every freshly built relationship seeds `locations` with its own
    /// primary (see `structural_rel`/`aggregate`), so `locations` always
    /// accounts for every observation, not just the non-primary ones —
    /// `locations.len() == occurrences` holds after any number of folds.
    pub fn fold(&mut self, other: Relationship) {
        self.occurrences += other.occurrences;
        self.locations.extend(other.locations);
        if other.location.line < self.location.line {
            self.location = other.location;
        }
        self.evidence.extend(other.evidence);
        if other.confidence > self.confidence {
            self.confidence = other.confidence;
        }
    }
}
