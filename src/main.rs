use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reviewgraph::config::{Config, LoggingConfig, CONFIG_FILE_NAME};

mod cli;

#[derive(Parser)]
#[command(name = "reviewgraph")]
#[command(author = "Intent Project Team")]
#[command(version = "0.1.0")]
#[command(about = "Symbol index and duplicate detection for code review", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a project into its snapshot
    Index {
        /// Project directory to index
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Languages to index (comma-separated)
        #[arg(short, long)]
        languages: Option<String>,

        /// Discard the existing snapshot first
        #[arg(short, long)]
        rebuild: bool,

        /// Use regex extraction only
        #[arg(long)]
        regex_only: bool,
    },

    /// Find duplicated code in a change
    Detect {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Unified diff of the change; `-` reads stdin
        #[arg(long)]
        diff: Option<String>,

        /// Changed files, compared whole (ignored with --diff)
        files: Vec<String>,

        /// Also compare against the indexed snapshot
        #[arg(short, long)]
        cross: bool,

        /// Output format: json, text
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Query the index
    Query {
        /// Query type: callers, callees, search
        query_type: String,

        /// Target symbol name
        target: String,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Output format: json, text
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show index statistics
    Stats {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Verbose output
        #[arg(long)]
        detailed: bool,
    },

    /// List supported languages
    Languages,
}

impl Commands {
    fn project(&self) -> &str {
        match self {
            Commands::Index { project, .. }
            | Commands::Detect { project, .. }
            | Commands::Query { project, .. }
            | Commands::Stats { project, .. } => project,
            Commands::Languages => ".",
        }
    }
}

/// Flags win over the project's `logging` section; `RUST_LOG` wins over both
fn init_logging(debug: bool, verbose: bool, logging: &LoggingConfig) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.init(),
    }
}

/// Logging settings from the project config, before logging exists to
/// report problems with it
fn project_logging(project: &str) -> LoggingConfig {
    let path: PathBuf = Path::new(project).join(CONFIG_FILE_NAME);
    Config::from_file(&path)
        .map(|config| config.logging)
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug, cli.verbose, &project_logging(cli.command.project()));

    info!("reviewgraph v0.1.0 starting...");

    match cli.command {
        Commands::Index {
            project,
            languages,
            rebuild,
            regex_only,
        } => {
            info!("Indexing project: {}", project);
            cli::index::index_project(project, languages, rebuild, regex_only).await?;
        }

        Commands::Detect {
            project,
            diff,
            files,
            cross,
            format,
        } => {
            cli::detect::detect_duplicates(project, diff, files, cross, format).await?;
        }

        Commands::Query {
            query_type,
            target,
            project,
            format,
        } => {
            cli::query::query_index(query_type, target, project, format)?;
        }

        Commands::Stats { project, detailed } => {
            cli::stats::show_stats(project, detailed)?;
        }

        Commands::Languages => {
            cli::languages::list_languages();
        }
    }

    Ok(())
}
