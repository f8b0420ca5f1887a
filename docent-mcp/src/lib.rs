//! # docent-mcp
//!
//! A Model Context Protocol (MCP) server that lets a conversational agent
//! ground its answers in a project's documentation. The server wraps a
//! [`DocRetriever`] and talks MCP over stdio.
//!
//! ## MCP Tools
//!
//! ### `search_docs`
//! Answers a free-text question with the most relevant documentation
//! excerpts. When semantic search is unavailable the answer comes from a
//! keyword scan of the documents instead, so the tool always returns text.
//!
//! ### `refresh_index`
//! Clears the index and re-indexes every document, optionally from another
//! directory. Reports only success or failure.
//!
//! ## Quick Start
//!
//! ```bash
//! docent-mcp --docs-dir ./docs --index-dir .
//! ```
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "docs": {
//!       "command": "docent-mcp",
//!       "args": ["--docs-dir", "/path/to/project/docs"]
//!     }
//!   }
//! }
//! ```
//!
//! The index is refreshed lazily on the first question, so no separate
//! indexing step is needed. Pass `--sync-on-start` to refresh before serving.

mod server;
pub mod tools;

pub use server::DocentMcpServer;

use anyhow::Result;
use docent_retriever::{DocRetriever, RetrieverConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// TOML configuration file for the retriever
    pub config_path: Option<PathBuf>,
    /// Overrides the configured documents directory
    pub docs_dir: Option<PathBuf>,
    /// Overrides the configured index directory
    pub index_dir: Option<PathBuf>,
    /// Refresh the index before accepting requests
    pub sync_on_start: bool,
}

impl ServerConfig {
    /// Resolve the retriever configuration: the file if given, then the
    /// directory overrides.
    pub fn retriever_config(&self) -> Result<RetrieverConfig> {
        let mut config = match &self.config_path {
            Some(path) => RetrieverConfig::load(path)?,
            None => RetrieverConfig::default(),
        };
        if let Some(docs_dir) = &self.docs_dir {
            config.docs_dir = docs_dir.clone();
        }
        if let Some(index_dir) = &self.index_dir {
            config.index_dir = index_dir.clone();
        }
        Ok(config)
    }
}

/// Run the MCP server over stdio until the client disconnects or the
/// process is interrupted. The index is closed on both paths.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let retriever_config = config.retriever_config()?;
    info!(
        "Starting docent MCP server for {}",
        retriever_config.docs_dir.display()
    );

    let retriever = Arc::new(DocRetriever::new(retriever_config));
    if config.sync_on_start {
        match retriever.sync().await {
            Ok(report) => info!(
                "Startup refresh: {} indexed, {} unchanged, {} removed",
                report.files_indexed, report.files_unchanged, report.files_removed
            ),
            Err(e) => warn!("Startup refresh failed: {:#}", e),
        }
    }

    DocentMcpServer::new(retriever).serve_stdio().await
}
