//! docent-retriever: documentation indexing and retrieval
//!
//! This crate indexes a directory of markdown documents into a SQLite store of
//! embedded chunks and answers natural-language questions with the most
//! similar chunks. When semantic search cannot run, a keyword scan of the raw
//! documents answers instead.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: chunking, indexing, change detection, search and the
//!   [`DocRetriever`] facade
//! - **[`storage`]**: chunk store abstraction with a SQLite implementation
//! - **[`config`]**: TOML-loadable configuration
//! - **[`logging`]**: tracing subscriber setup for the binaries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docent_retriever::{DocRetriever, RetrieverConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let retriever = DocRetriever::new(RetrieverConfig::new("docs"));
//!
//! // Indexes changed documents on first use, then searches
//! let answer = retriever.retrieve("How do I install Rust?").await;
//! println!("{answer}");
//!
//! retriever.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! docs/*.md → ChangeDetector → Chunker → EmbeddingProvider → SQLite
//!                                                              ↓
//! query → EmbeddingProvider → SearchEngine → ResultAssembler → answer
//!   └──────────────(vector search unavailable)→ FallbackSearcher ┘
//! ```

pub mod config;
pub mod logging;
pub mod retrieval;
pub mod storage;

pub use config::RetrieverConfig;
pub use retrieval::assembler::{NO_RELEVANT_INFORMATION, ResultAssembler};
pub use retrieval::chunker::{Chunker, ChunkingConfig};
pub use retrieval::fallback::{
    DEGRADED_SERVICE_MESSAGE, FallbackConfig, FallbackSearcher, SEARCH_FAILED_MESSAGE,
};
pub use retrieval::hasher::{Blake3Hasher, ContentHasher, FnvHasher, HasherKind};
pub use retrieval::indexer::{IndexOutcome, Indexer, IndexingConfig, RebuildReport, RefreshReport};
pub use retrieval::retriever::DocRetriever;
pub use retrieval::search::{SearchConfig, SearchEngine, SearchResult, cosine_similarity};
pub use storage::{ChunkStore, IndexStats, SqliteStore, StoreHandle, StoredChunk};
