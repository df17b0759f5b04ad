use anyhow::{bail, Result};

use reviewgraph::query::{QueryEngine, QueryResult};

use super::Project;

const SEARCH_LIMIT: usize = 50;

pub fn query_index(query_type: String, target: String, project: String, format: String) -> Result<()> {
    let project = Project::load(&project);

    println!("reviewgraph query v0.1.0");
    println!("Query type: {}", query_type);
    println!("Target: {}", target);
    println!("Project: {}", project.root.display());
    println!("Config: {}", project.config_status());

    let snapshot = project.load_snapshot()?;
    let engine = QueryEngine::new(&snapshot.index);

    let results = match query_type.as_str() {
        "callers" => engine.find_callers(&target),
        "callees" => engine.find_callees(&target),
        "search" => engine.search_symbols(&target, None, SEARCH_LIMIT),
        _ => bail!("Unknown query type: {}", query_type),
    };

    if results.is_empty() {
        println!("\nNo results found for {} of '{}'", query_type, target);
        return Ok(());
    }

    println!("\nFound {} results:", results.len());
    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&results)?),
        "text" => print_text(&results),
        _ => bail!("Unknown format: {}", format),
    }

    Ok(())
}

fn print_text(results: &[QueryResult]) {
    for result in results {
        println!("  {}:{} - {} ({})", result.file, result.line, result.name, result.kind);
    }
}
