use clap::Parser;
use docent_mcp::{ServerConfig, run_server};
use docent_retriever::logging;
use std::path::PathBuf;

/// Serve documentation retrieval to MCP clients over stdio.
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

    /// Refresh the index before accepting requests
    #[arg(long)]
    sync_on_start: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("info");
    let args = Args::parse();

    run_server(ServerConfig {
        config_path: args.config,
        docs_dir: args.docs_dir,
        index_dir: args.index_dir,
        sync_on_start: args.sync_on_start,
    })
    .await
}
