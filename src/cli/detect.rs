use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::io::Read;
use tracing::warn;

use reviewgraph::diff::{parse_unified_diff, symbols_touching, FileDiff};
use reviewgraph::duplicates::{DuplicateDetector, DuplicateMatch};
use reviewgraph::index::Symbol;
use reviewgraph::indexer::{ExtractionStrategy, SymbolExtractor};
use reviewgraph::vector::FlatVectorStore;

use super::Project;

pub async fn detect_duplicates(
    project: String,
    diff: Option<String>,
    files: Vec<String>,
    cross: bool,
    format: String,
) -> Result<()> {
    if format != "json" && format != "text" {
        bail!("Unknown format: {}", format);
    }
    let project = Project::load(&project);

    let changes: Vec<FileDiff> = match diff {
        Some(source) => parse_unified_diff(&read_diff(&source)?),
        None => files
            .into_iter()
            .map(|path| FileDiff {
                path,
                hunks: Vec::new(),
            })
            .collect(),
    };
    if changes.is_empty() {
        bail!("No changed files given");
    }

    let extractor = SymbolExtractor::new(ExtractionStrategy::select(
        project.config.indexing.structural_parsing,
    ));
    let mut changed_symbols: Vec<Symbol> = Vec::new();
    for change in &changes {
        let full_path = project.root.join(&change.path);
        let content = match std::fs::read_to_string(&full_path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping {}: {}", full_path.display(), e);
                continue;
            }
        };

        let parsed = extractor.extract(&content, &change.path);
        if change.hunks.is_empty() {
            changed_symbols.extend(parsed.symbols);
        } else {
            changed_symbols.extend(symbols_touching(&parsed.symbols, &change.hunks).into_iter().cloned());
        }
    }

    let detector = DuplicateDetector::from_config(&project.config);
    let mut matches = detector.find_within_change(&changed_symbols).await;

    if cross {
        let snapshot = project.load_snapshot()?;
        let changed_paths: HashSet<&str> = changes.iter().map(|c| c.path.as_str()).collect();

        // Compare against the codebase as it was, minus the files under review
        let mut reference = snapshot.index;
        for path in &changed_paths {
            reference.evict_file(path);
        }
        let store = FlatVectorStore::with_embeddings(
            snapshot
                .embeddings
                .into_iter()
                .filter(|e| !changed_paths.contains(e.symbol.file.as_str()))
                .collect(),
        );

        matches.extend(
            detector
                .find_cross_repository(&changed_symbols, &reference, &store)
                .await,
        );
    }

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&matches)?),
        _ => print_text(&changed_symbols, &matches),
    }

    Ok(())
}

fn read_diff(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read diff from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read diff {}", source))
    }
}

fn print_text(changed: &[Symbol], matches: &[DuplicateMatch]) {
    println!("Checked {} changed symbols", changed.len());
    if matches.is_empty() {
        println!("No duplicates found");
        return;
    }

    println!("Found {} duplicates:", matches.len());
    for m in matches {
        println!(
            "  [{} {:.2}] {}:{} {} <-> {}:{} {}",
            m.match_type.as_str(),
            m.similarity,
            m.symbol1.file,
            m.symbol1.start_line,
            m.symbol1.name,
            m.symbol2.file,
            m.symbol2.start_line,
            m.symbol2.name
        );
        println!("      {}", m.reason);
    }
}
