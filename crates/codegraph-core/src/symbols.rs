//! Project-wide symbol index, shared across parser workers for cross-file
//! reference resolution.

use dashmap::DashMap;

use crate::ids::EntityId;

/// Maps qualified names to entity ids, and file paths to the symbols they
/// define. Thread-safe for concurrent population by the parser pool.
pub struct SymbolTable {
    symbols: DashMap<String, EntityId>,
    file_symbols: DashMap<String, Vec<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: DashMap::new(),
            file_symbols: DashMap::new(),
        }
    }

    /// Insert a symbol, recording it under both the global name index and
    /// its owning file's entry.
    pub fn insert(&self, qualified_name: String, entity_id: EntityId, file_path: String) {
        self.symbols.insert(qualified_name.clone(), entity_id);
        self.file_symbols.entry(file_path).or_default().push(qualified_name);
    }

    pub fn lookup(&self, qualified_name: &str) -> Option<EntityId> {
        self.symbols.get(qualified_name).map(|r| r.value().clone())
    }

    /// All entity ids defined in `file_path`.
    pub fn symbols_in_file(&self, file_path: &str) -> Vec<EntityId> {
        self.file_symbols
            .get(file_path)
            .map(|r| {
                r.value()
                    .iter()
                    .filter_map(|name| self.symbols.get(name).map(|n| n.value().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop every symbol defined in `file_path` — the first step of
    /// re-indexing a changed file.
    pub fn remove_file(&self, file_path: &str) {
        if let Some((_, names)) = self.file_symbols.remove(file_path) {
            for name in names {
                self.symbols.remove(&name);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup_roundtrip() {
        let table = SymbolTable::new();
        table.insert("crate::foo".into(), "sym:src/lib.rs#foo@aaaaaaaa".into(), "src/lib.rs".into());
        assert_eq!(table.lookup("crate::foo"), Some("sym:src/lib.rs#foo@aaaaaaaa".to_string()));
        assert_eq!(table.symbols_in_file("src/lib.rs").len(), 1);
    }

    #[test]
    fn remove_file_drops_its_symbols() {
        let table = SymbolTable::new();
        table.insert("crate::foo".into(), "sym:a@1".into(), "a.rs".into());
        table.insert("crate::bar".into(), "sym:b@2".into(), "b.rs".into());
        table.remove_file("a.rs");
        assert!(table.lookup("crate::foo").is_none());
        assert!(table.lookup("crate::bar").is_some());
    }
}
