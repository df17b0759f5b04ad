// Source scanning, extraction and index building

pub mod calls;
pub mod engine;
pub mod extractor;
pub mod fallback;
pub mod structural;
pub mod syntax;
pub mod text;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::index::{CallEdge, CodeIndex, ParsedFile, Symbol};
use crate::language::{detect_language, Language};

pub use extractor::{ExtractionStrategy, SymbolExtractor};

/// A file to index: its index path and its text
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Counts added by one indexing call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub files: usize,
    pub symbols: usize,
    pub call_edges: usize,
}

impl IndexSummary {
    fn add(&mut self, symbols: usize, call_edges: usize) {
        self.files += 1;
        self.symbols += symbols;
        self.call_edges += call_edges;
    }
}

/// Builds a `CodeIndex` from source files
pub struct Indexer {
    extractor: SymbolExtractor,
    index: CodeIndex,
    threads: usize,
}

impl Indexer {
    pub fn new(extractor: SymbolExtractor, threads: usize) -> Self {
        Self::with_index(extractor, CodeIndex::new(), threads)
    }

    /// Continue from an existing index, e.g. one restored from a snapshot
    pub fn with_index(extractor: SymbolExtractor, index: CodeIndex, threads: usize) -> Self {
        Self {
            extractor,
            index,
            threads: threads.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let strategy = ExtractionStrategy::select(config.indexing.structural_parsing);
        info!("Using {} extraction", strategy.name());
        Self::new(SymbolExtractor::new(strategy), config.performance.threads)
    }

    pub fn extractor(&self) -> &SymbolExtractor {
        &self.extractor
    }

    pub fn index(&self) -> &CodeIndex {
        &self.index
    }

    pub fn into_index(self) -> CodeIndex {
        self.index
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }

    /// Extract one file and append it to the index.
    ///
    /// Calls resolve against everything already indexed plus the file's own
    /// symbols. Indexing the same path twice duplicates its entries; use
    /// `reindex_file` to replace them.
    pub fn index_file(&mut self, path: &str, source: &str) -> IndexSummary {
        let parsed = self.extractor.extract(source, path);

        let mut known: Vec<Symbol> = self.index.symbols().to_vec();
        known.extend(parsed.symbols.iter().cloned());
        let calls = self.extractor.extract_calls(source, &parsed, &known);

        let mut summary = IndexSummary::default();
        summary.add(parsed.symbols.len(), calls.len());
        self.index.append(path, parsed.symbols, calls);
        summary
    }

    /// Replace everything previously indexed for `path`
    pub fn reindex_file(&mut self, path: &str, source: &str) -> IndexSummary {
        let evicted = self.index.evict_file(path);
        if evicted > 0 {
            debug!("Evicted {} symbols of {}", evicted, path);
        }
        self.index_file(path, source)
    }

    /// Drop a file that no longer exists
    pub fn remove_file(&mut self, path: &str) -> usize {
        self.index.evict_file(path)
    }

    pub async fn index_files(&mut self, files: Vec<SourceFile>) -> IndexSummary {
        self.index_files_with(files, |_, _| {}).await
    }

    /// Index many files.
    ///
    /// Extraction runs on the blocking pool, at most `threads` files at a
    /// time. Symbols of every file are known before calls are resolved, and
    /// results are appended in input order. `on_indexed` sees each file as it
    /// is appended.
    pub async fn index_files_with<F>(&mut self, files: Vec<SourceFile>, mut on_indexed: F) -> IndexSummary
    where
        F: FnMut(&SourceFile, &ParsedFile),
    {
        let extractor = self.extractor.clone();
        let extracted: Vec<(Arc<SourceFile>, ParsedFile)> = stream::iter(files)
            .map(|file| {
                let extractor = extractor.clone();
                let file = Arc::new(file);
                tokio::task::spawn_blocking(move || {
                    let parsed = extractor.extract(&file.content, &file.path);
                    (file, parsed)
                })
            })
            .buffered(self.threads)
            .filter_map(|joined| async move {
                joined
                    .map_err(|e| warn!("Extraction task failed: {}", e))
                    .ok()
            })
            .collect()
            .await;

        let mut known: Vec<Symbol> = self.index.symbols().to_vec();
        for (_, parsed) in &extracted {
            known.extend(parsed.symbols.iter().cloned());
        }
        let known = Arc::new(known);

        let resolved: Vec<(Arc<SourceFile>, ParsedFile, Vec<CallEdge>)> = stream::iter(extracted)
            .map(|(file, parsed)| {
                let extractor = extractor.clone();
                let known = Arc::clone(&known);
                tokio::task::spawn_blocking(move || {
                    let calls = extractor.extract_calls(&file.content, &parsed, &known);
                    (file, parsed, calls)
                })
            })
            .buffered(self.threads)
            .filter_map(|joined| async move {
                joined
                    .map_err(|e| warn!("Call extraction task failed: {}", e))
                    .ok()
            })
            .collect()
            .await;

        let mut summary = IndexSummary::default();
        for (file, parsed, calls) in resolved {
            on_indexed(file.as_ref(), &parsed);
            summary.add(parsed.symbols.len(), calls.len());
            self.index.append(&file.path, parsed.symbols, calls);
        }

        info!(
            "Indexed {} files: {} symbols, {} call edges",
            summary.files, summary.symbols, summary.call_edges
        );
        summary
    }

    /// Index every eligible file under `root`
    pub async fn index_directory(&mut self, root: &Path, config: &Config) -> Result<IndexSummary> {
        let files = collect_source_files(root, config)?;
        Ok(self.index_files(files).await)
    }
}

/// Read the files under `root` that the configuration selects.
///
/// Paths are stored relative to `root` with `/` separators. Files in
/// languages that are not enabled, and files that cannot be read as UTF-8,
/// are skipped.
pub fn collect_source_files(root: &Path, config: &Config) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }
    let enabled = config.enabled_languages();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_path(root, entry.path());

        if !config.should_index_file(&relative) {
            continue;
        }
        let language = detect_language(&relative, None);
        if language == Language::Unknown || !enabled.contains(&language) {
            continue;
        }

        match std::fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))
        {
            Ok(content) => files.push(SourceFile::new(relative, content)),
            Err(e) => warn!("Skipping file: {:#}", e),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Collected {} source files under {}", files.len(), root.display());
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn indexer() -> Indexer {
        Indexer::new(SymbolExtractor::new(ExtractionStrategy::select(true)), 4)
    }

    const SERVICE: &str = "public class PaymentService {\n  public void pay(int cents) {\n    Ledger.record(cents);\n  }\n}\n";
    const LEDGER: &str = "public class Ledger {\n  public static void record(int cents) {\n  }\n}\n";

    #[test]
    fn test_index_file_appends() {
        let mut indexer = indexer();
        let summary = indexer.index_file("Ledger.java", LEDGER);
        assert_eq!(summary.symbols, 2);

        let summary = indexer.index_file("PaymentService.java", SERVICE);
        assert_eq!(summary.call_edges, 1);

        let callers = indexer.index().find_callers("record");
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].caller, "pay");
    }

    #[test]
    fn test_index_file_twice_duplicates() {
        let mut indexer = indexer();
        indexer.index_file("Ledger.java", LEDGER);
        indexer.index_file("Ledger.java", LEDGER);
        assert_eq!(indexer.index().find_all_symbols("record").len(), 2);
    }

    #[test]
    fn test_index_file_twice_grows_call_graph() {
        for structural in [true, false] {
            let mut indexer = Indexer::new(SymbolExtractor::new(ExtractionStrategy::select(structural)), 1);
            indexer.index_file("Ledger.java", LEDGER);

            indexer.index_file("PaymentService.java", SERVICE);
            assert_eq!(indexer.index().call_graph().len(), 1);

            indexer.index_file("PaymentService.java", SERVICE);
            assert_eq!(indexer.index().call_graph().len(), 2, "structural: {}", structural);
        }
    }

    #[test]
    fn test_reindex_file_replaces() {
        let mut indexer = indexer();
        indexer.index_file("Ledger.java", LEDGER);
        indexer.reindex_file("Ledger.java", LEDGER);
        assert_eq!(indexer.index().find_all_symbols("record").len(), 1);
        assert_eq!(indexer.index().get_file_symbols("Ledger.java").len(), 2);

        assert_eq!(indexer.remove_file("Ledger.java"), 2);
        assert!(indexer.index().is_empty());
    }

    #[tokio::test]
    async fn test_index_files_resolves_calls_across_files() {
        let mut indexer = indexer();
        // Caller first: its callee is only known once every file is extracted
        let files = vec![
            SourceFile::new("PaymentService.java", SERVICE),
            SourceFile::new("Ledger.java", LEDGER),
        ];

        let mut order = Vec::new();
        let summary = indexer
            .index_files_with(files, |file, _| order.push(file.path.clone()))
            .await;

        assert_eq!(summary.files, 2);
        assert_eq!(summary.call_edges, 1);
        assert_eq!(order, vec!["PaymentService.java", "Ledger.java"]);
        assert_eq!(indexer.index().symbols()[0].name, "PaymentService");
    }

    #[tokio::test]
    async fn test_index_directory_respects_config() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/lib")).unwrap();
        std::fs::write(dir.path().join("src/Ledger.java"), LEDGER).unwrap();
        std::fs::write(dir.path().join("src/util.py"), "def helper():\n    return 1\n").unwrap();
        std::fs::write(dir.path().join("node_modules/lib/index.js"), "function x() {}\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "# readme\n").unwrap();

        let mut config = Config::default();
        config.languages.enabled = vec!["java".to_string(), "javascript".to_string()];

        let files = collect_source_files(dir.path(), &config).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/Ledger.java"]);

        let mut indexer = indexer();
        let summary = indexer.index_directory(dir.path(), &config).await.unwrap();
        assert_eq!(summary.files, 1);
        assert!(indexer.index().contains_file("src/Ledger.java"));
    }

    #[test]
    fn test_collect_rejects_missing_root() {
        let config = Config::default();
        assert!(collect_source_files(Path::new("/definitely/not/here"), &config).is_err());
    }
}
