use clap::{Parser, Subcommand};
use docent_retriever::{DocRetriever, RetrieverConfig, logging};
use serde::Serialize;
use std::path::PathBuf;
use std::process;

/// Maintain and query a docent documentation index.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the markdown documents
    #[arg(short, long)]
    docs_dir: Option<PathBuf>,

    /// Directory containing the .docent.db database file
    #[arg(short, long)]
    index_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index documents that changed since the last run
    Index,
    /// Clear the index and index every document again
    Rebuild {
        /// Documents directory, overriding the configured one
        dir: Option<PathBuf>,
    },
    /// Answer a question from the documentation
    Search {
        query: String,
        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Output format
        #[arg(short, long, default_value = "answer")]
        format: OutputFormat,
    },
    /// Show index statistics
    Stats {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum OutputFormat {
    /// Text exactly as an agent would receive it
    Answer,
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "answer" => Ok(OutputFormat::Answer),
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct StatsOutput {
    docs_dir: PathBuf,
    database: PathBuf,
    #[serde(flatten)]
    stats: docent_retriever::IndexStats,
}

#[tokio::main]
async fn main() {
    logging::init("info");
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RetrieverConfig::load(path)?,
        None => RetrieverConfig::default(),
    };
    if let Some(docs_dir) = args.docs_dir {
        config.docs_dir = docs_dir;
    }
    if let Some(index_dir) = args.index_dir {
        config.index_dir = index_dir;
    }
    if let Commands::Search {
        top_k: Some(top_k), ..
    } = &args.command
    {
        config.search.top_k = *top_k;
    }

    let retriever = DocRetriever::new(config);
    let result = tokio::select! {
        result = execute(&retriever, args.command) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, closing index");
            Ok(())
        }
    };
    retriever.close().await;
    result
}

async fn execute(retriever: &DocRetriever, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Index => {
            let report = retriever.sync().await?;
            println!(
                "Scanned {} documents: {} indexed, {} unchanged, {} removed, {} failed",
                report.files_scanned,
                report.files_indexed,
                report.files_unchanged,
                report.files_removed,
                report.files_failed
            );
            println!(
                "Chunks written: {} ({} skipped after embedding errors)",
                report.chunks_written, report.chunks_failed
            );
        }
        Commands::Rebuild { dir } => {
            let report = retriever.refresh_index(dir.as_deref()).await?;
            println!(
                "Rebuilt index: {}/{} documents, {} chunks written, {} chunks skipped",
                report.files_indexed, report.files_total, report.chunks_written, report.chunks_failed
            );
            if report.files_failed > 0 {
                println!("{} documents failed, see log for details", report.files_failed);
            }
        }
        Commands::Search { query, format, .. } => match format {
            OutputFormat::Answer => println!("{}", retriever.retrieve(&query).await),
            OutputFormat::Summary | OutputFormat::Json => {
                retriever.sync().await?;
                let results = retriever
                    .search(&query, retriever.config().search.top_k)
                    .await?;
                if format == OutputFormat::Json {
                    println!("{}", serde_json::to_string_pretty(&results)?);
                } else {
                    println!("Found {} results:", results.len());
                    for result in results {
                        println!(
                            "  {:.3} | {} #{} | {}",
                            result.score,
                            result.metadata.file_path,
                            result.metadata.chunk_index,
                            result.text.lines().next().unwrap_or_default()
                        );
                    }
                }
            }
        },
        Commands::Stats { format } => {
            let config = retriever.config();
            let output = StatsOutput {
                docs_dir: config.docs_dir.clone(),
                database: config.index_dir.join(docent_retriever::storage::DATABASE_FILE),
                stats: retriever.stats().await?,
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
                _ => {
                    println!("Documents: {}", output.docs_dir.display());
                    println!("Database:  {}", output.database.display());
                    println!("Files:     {}", output.stats.files_count);
                    println!("Chunks:    {}", output.stats.chunks_count);
                    match output.stats.last_indexed_at {
                        Some(at) => println!("Indexed:   {}", at.to_rfc3339()),
                        None => println!("Indexed:   never"),
                    }
                }
            }
        }
    }
    Ok(())
}
