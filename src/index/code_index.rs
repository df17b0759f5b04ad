// In-memory symbol table and call graph

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CallEdge, Symbol};

/// Aggregate index over every indexed file.
///
/// `symbols` and `call_graph` are append-only. `symbol_map` keeps only the
/// most recently indexed symbol per name; scan `symbols` to see all of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeIndex {
    symbols: Vec<Symbol>,
    call_graph: Vec<CallEdge>,
    file_map: HashMap<String, Vec<Symbol>>,
    symbol_map: HashMap<String, Symbol>,
}

impl CodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one file's symbols and call edges.
    ///
    /// Nothing is deduplicated: appending the same file twice stores its
    /// symbols and edges twice.
    pub fn append(&mut self, file_path: &str, symbols: Vec<Symbol>, calls: Vec<CallEdge>) {
        debug!(
            "Appending {} symbols and {} call edges for {}",
            symbols.len(),
            calls.len(),
            file_path
        );

        let entry = self.file_map.entry(file_path.to_string()).or_default();
        for symbol in &symbols {
            entry.push(symbol.clone());
            self.symbol_map.insert(symbol.name.clone(), symbol.clone());
        }
        self.symbols.extend(symbols);
        self.call_graph.extend(calls);
    }

    /// Remove every contribution of `file_path` from all four structures.
    ///
    /// Names whose `symbol_map` entry came from the evicted file fall back to
    /// the most recent remaining symbol with the same name.
    pub fn evict_file(&mut self, file_path: &str) -> usize {
        let before = self.symbols.len();
        self.symbols.retain(|s| s.file != file_path);
        self.call_graph.retain(|e| e.file != file_path);
        self.file_map.remove(file_path);

        let stale: Vec<String> = self
            .symbol_map
            .iter()
            .filter(|(_, s)| s.file == file_path)
            .map(|(name, _)| name.clone())
            .collect();

        for name in stale {
            match self.symbols.iter().rev().find(|s| s.name == name) {
                Some(replacement) => {
                    self.symbol_map.insert(name, replacement.clone());
                }
                None => {
                    self.symbol_map.remove(&name);
                }
            }
        }

        before - self.symbols.len()
    }

    /// Most recently indexed symbol with this name
    pub fn find_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbol_map.get(name)
    }

    /// Every indexed symbol with this name, in index order
    pub fn find_all_symbols(&self, name: &str) -> Vec<&Symbol> {
        self.symbols.iter().filter(|s| s.name == name).collect()
    }

    pub fn get_file_symbols(&self, file_path: &str) -> &[Symbol] {
        self.file_map
            .get(file_path)
            .map(|symbols| symbols.as_slice())
            .unwrap_or(&[])
    }

    /// Edges whose callee is `name`
    pub fn find_callers(&self, name: &str) -> Vec<&CallEdge> {
        self.call_graph.iter().filter(|e| e.callee == name).collect()
    }

    /// Edges whose caller is `name`
    pub fn find_callees(&self, name: &str) -> Vec<&CallEdge> {
        self.call_graph.iter().filter(|e| e.caller == name).collect()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn call_graph(&self) -> &[CallEdge] {
        &self.call_graph
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.file_map.keys().map(|k| k.as_str())
    }

    pub fn contains_file(&self, file_path: &str) -> bool {
        self.file_map.contains_key(file_path)
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.call_graph.is_empty()
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
        self.call_graph.clear();
        self.file_map.clear();
        self.symbol_map.clear();
    }

    /// Rebuild an index from persisted rows, preserving append order
    pub fn from_parts(symbols: Vec<Symbol>, call_graph: Vec<CallEdge>) -> Self {
        let mut index = Self::new();
        for symbol in symbols {
            index
                .file_map
                .entry(symbol.file.clone())
                .or_default()
                .push(symbol.clone());
            index.symbol_map.insert(symbol.name.clone(), symbol.clone());
            index.symbols.push(symbol);
        }
        index.call_graph = call_graph;
        index
    }

    pub fn stats(&self) -> IndexStats {
        let mut symbols_by_kind = BTreeMap::new();
        let mut files_by_language: BTreeMap<String, HashSet<&str>> = BTreeMap::new();

        for symbol in &self.symbols {
            *symbols_by_kind
                .entry(symbol.kind.as_str().to_string())
                .or_insert(0) += 1;
            files_by_language
                .entry(symbol.language.as_str().to_string())
                .or_default()
                .insert(symbol.file.as_str());
        }

        IndexStats {
            total_symbols: self.symbols.len(),
            total_files: self.file_map.len(),
            total_call_edges: self.call_graph.len(),
            symbols_by_kind,
            files_by_language: files_by_language
                .into_iter()
                .map(|(lang, files)| (lang, files.len()))
                .collect(),
        }
    }
}

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_symbols: usize,
    pub total_files: usize,
    pub total_call_edges: usize,
    pub symbols_by_kind: BTreeMap<String, usize>,
    pub files_by_language: BTreeMap<String, usize>,
}
