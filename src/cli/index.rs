use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use reviewgraph::duplicates::filters::is_comparable;
use reviewgraph::embedding::EmbeddingGenerator;
use reviewgraph::index::db::{content_hash, FileRecord, Snapshot};
use reviewgraph::index::Symbol;
use reviewgraph::indexer::{collect_source_files, ExtractionStrategy, Indexer, SourceFile, SymbolExtractor};
use reviewgraph::language::detect_language;

use super::Project;

pub async fn index_project(
    project: String,
    languages: Option<String>,
    rebuild: bool,
    regex_only: bool,
) -> Result<()> {
    let mut project = Project::load(&project);

    // CLI overrides
    if let Some(langs) = languages {
        project.config.languages.enabled = langs
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        project.config.validate()?;
    }
    if regex_only {
        project.config.indexing.structural_parsing = false;
    }
    let config = &project.config;

    println!("reviewgraph indexer v0.1.0");
    println!("Project: {}", project.root.display());
    println!("Config: {}", project.config_status());
    println!("Languages: {}", config.languages.enabled.join(", "));
    println!("Snapshot: {}", project.snapshot_path().display());

    let store = project.open_snapshot()?;
    let Snapshot {
        index,
        embeddings: previous_embeddings,
        files: previous_files,
        ..
    } = if rebuild {
        store.clear()?;
        Snapshot::default()
    } else {
        store.load()?
    };

    let strategy = ExtractionStrategy::select(config.indexing.structural_parsing);
    println!("Extraction: {}", strategy.name());
    let mut indexer = Indexer::with_index(SymbolExtractor::new(strategy), index, config.performance.threads);

    println!("\nScanning project files...");
    let files = collect_source_files(&project.root, config)?;
    let mut records: HashMap<String, FileRecord> = previous_files
        .into_iter()
        .map(|record| (record.path.clone(), record))
        .collect();

    // Files gone from disk
    let present: HashSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
    let removed: Vec<String> = records
        .keys()
        .filter(|path| !present.contains(path.as_str()))
        .cloned()
        .collect();
    for path in &removed {
        indexer.remove_file(path);
        records.remove(path);
    }

    let mut changed: Vec<SourceFile> = Vec::new();
    let mut added: Vec<SourceFile> = Vec::new();
    let mut unchanged = 0usize;
    for file in files {
        match records.get(&file.path) {
            Some(record) if record.content_hash == content_hash(&file.content) => unchanged += 1,
            Some(_) => changed.push(file),
            None => added.push(file),
        }
    }
    println!(
        "Found {} new, {} changed, {} unchanged, {} removed files",
        added.len(),
        changed.len(),
        unchanged,
        removed.len()
    );

    let mut touched: HashSet<String> = removed.into_iter().collect();
    touched.extend(changed.iter().map(|f| f.path.clone()));
    touched.extend(added.iter().map(|f| f.path.clone()));

    let pb = ProgressBar::new((changed.len() + added.len()) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message("Extracting...");

    for file in &changed {
        let summary = indexer.reindex_file(&file.path, &file.content);
        let language = detect_language(&file.path, Some(file.content.as_str()));
        records.insert(
            file.path.clone(),
            FileRecord::new(&file.path, language, &file.content, summary.symbols),
        );
        pb.inc(1);
    }

    indexer
        .index_files_with(added, |file, parsed| {
            records.insert(
                file.path.clone(),
                FileRecord::new(&file.path, parsed.language, &file.content, parsed.symbols.len()),
            );
            pb.inc(1);
        })
        .await;
    pb.finish_with_message("Extraction complete");

    // Reuse embeddings of untouched files, embed the rest
    let index = indexer.into_index();
    let generator = EmbeddingGenerator::from_config(&config.embedding);
    let mut embeddings: Vec<_> = previous_embeddings
        .into_iter()
        .filter(|e| !touched.contains(&e.symbol.file))
        .collect();
    let to_embed: Vec<Symbol> = index
        .symbols()
        .iter()
        .filter(|s| is_comparable(s) && touched.contains(&s.file))
        .cloned()
        .collect();
    debug!("Reusing {} embeddings, computing {}", embeddings.len(), to_embed.len());
    embeddings.extend(generator.embed_symbols(&to_embed).await);

    let records: Vec<FileRecord> = records.into_values().collect();
    store.save(&index, &embeddings, &records)?;
    info!("Saved snapshot to {}", store.path().display());

    let stats = index.stats();
    println!("\nIndexing complete!");
    println!("Total files: {}", stats.total_files);
    println!("Total symbols: {}", stats.total_symbols);
    println!("Total call edges: {}", stats.total_call_edges);
    println!("Embeddings: {} ({})", embeddings.len(), generator.provider_name());

    Ok(())
}
