// Query execution engine

use serde::{Deserialize, Serialize};

use crate::index::{CallEdge, CodeIndex, Symbol, SymbolKind};

/// Query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub symbol_id: String,
    pub name: String,
    pub file: String,
    /// Call site line for caller/callee queries, declaration line otherwise
    pub line: usize,
    pub kind: String,
}

impl QueryResult {
    fn from_symbol(symbol: &Symbol, line: usize) -> Self {
        Self {
            symbol_id: symbol.id(),
            name: symbol.name.clone(),
            file: symbol.file.clone(),
            line,
            kind: symbol.kind.as_str().to_string(),
        }
    }
}

/// Read-only queries over a `CodeIndex`.
///
/// Call edges name their endpoints; edges whose endpoint matches no indexed
/// symbol are skipped.
pub struct QueryEngine<'a> {
    index: &'a CodeIndex,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a CodeIndex) -> Self {
        Self { index }
    }

    /// Symbols that call `target`
    pub fn find_callers(&self, target: &str) -> Vec<QueryResult> {
        self.index
            .find_callers(target)
            .into_iter()
            .filter_map(|edge| {
                let caller = self.resolve(&edge.caller, edge)?;
                Some(QueryResult::from_symbol(caller, edge.line))
            })
            .collect()
    }

    /// Symbols that `target` calls
    pub fn find_callees(&self, target: &str) -> Vec<QueryResult> {
        self.index
            .find_callees(target)
            .into_iter()
            .filter_map(|edge| {
                let callee = self.resolve(&edge.callee, edge)?;
                Some(QueryResult::from_symbol(callee, edge.line))
            })
            .collect()
    }

    /// Case-insensitive substring search over symbol names
    pub fn search_symbols(&self, query: &str, kind: Option<SymbolKind>, limit: usize) -> Vec<QueryResult> {
        let needle = query.to_lowercase();
        let mut found: Vec<&Symbol> = self
            .index
            .symbols()
            .iter()
            .filter(|s| kind.map_or(true, |k| s.kind == k))
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.file.cmp(&b.file)));

        found
            .into_iter()
            .take(limit)
            .map(|s| QueryResult::from_symbol(s, s.start_line))
            .collect()
    }

    /// Resolve an edge endpoint by name, preferring a symbol in the edge's file
    fn resolve(&self, name: &str, edge: &CallEdge) -> Option<&'a Symbol> {
        let candidates = self.index.find_all_symbols(name);
        candidates
            .iter()
            .find(|s| s.file == edge.file)
            .or_else(|| candidates.first())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test_support::method;

    fn index() -> CodeIndex {
        let symbols = vec![
            method("checkout", "src/Cart.java", 3, "void checkout() {}"),
            method("total", "src/Cart.java", 9, "int total() {}"),
            method("total", "src/Invoice.java", 2, "int total() {}"),
        ];
        let edges = vec![
            CallEdge {
                caller: "checkout".to_string(),
                callee: "total".to_string(),
                file: "src/Cart.java".to_string(),
                line: 4,
            },
            CallEdge {
                caller: "vanished".to_string(),
                callee: "total".to_string(),
                file: "src/Gone.java".to_string(),
                line: 1,
            },
        ];
        CodeIndex::from_parts(symbols, edges)
    }

    #[test]
    fn test_callers_skip_dangling_edges() {
        let index = index();
        let engine = QueryEngine::new(&index);

        let callers = engine.find_callers("total");
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].name, "checkout");
        assert_eq!(callers[0].line, 4);
    }

    #[test]
    fn test_callees_prefer_same_file() {
        let index = index();
        let engine = QueryEngine::new(&index);

        let callees = engine.find_callees("checkout");
        assert_eq!(callees.len(), 1);
        assert_eq!(callees[0].symbol_id, "src/Cart.java:total:9");
    }

    #[test]
    fn test_search_symbols() {
        let index = index();
        let engine = QueryEngine::new(&index);

        let found = engine.search_symbols("TOT", Some(SymbolKind::Method), 10);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].file, "src/Cart.java");

        assert_eq!(engine.search_symbols("o", None, 1).len(), 1);
        assert!(engine.search_symbols("total", Some(SymbolKind::Class), 10).is_empty());
    }
}
