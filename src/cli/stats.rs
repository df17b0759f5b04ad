use anyhow::Result;
use chrono::{TimeZone, Utc};

use super::{file_size_mb, Project};

pub fn show_stats(project: String, detailed: bool) -> Result<()> {
    let project = Project::load(&project);

    println!("reviewgraph statistics v0.1.0");
    println!("Project: {}", project.root.display());
    println!("Config: {}", project.config_status());

    let snapshot = project.load_snapshot()?;
    let stats = snapshot.index.stats();

    println!("\nIndex Statistics:");
    println!("  Total files: {}", stats.total_files);
    println!("  Total symbols: {}", stats.total_symbols);
    println!("  Total call edges: {}", stats.total_call_edges);
    println!("  Embeddings: {}", snapshot.embeddings.len());
    println!("  Index size: {:.2} MB", file_size_mb(&project.snapshot_path())?);
    if let Some(saved) = snapshot.saved_at.and_then(|ts| Utc.timestamp_opt(ts, 0).single()) {
        println!("  Last indexed: {}", saved.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    if detailed {
        println!("\nDetailed Statistics:");

        if !stats.symbols_by_kind.is_empty() {
            println!("  Symbols by kind:");
            for (kind, count) in &stats.symbols_by_kind {
                println!("    {}: {}", kind, count);
            }
        }

        if !stats.files_by_language.is_empty() {
            println!("  Languages:");
            for (language, count) in &stats.files_by_language {
                println!("    {}: {} files", language, count);
            }
        }
    }

    Ok(())
}
