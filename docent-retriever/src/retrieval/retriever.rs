//! The retrieval entry point used by the CLI and the MCP server.
//!
//! [`DocRetriever`] owns the store handle, the embedding provider and the
//! search pipeline. Both the store and the provider are acquired lazily, on
//! the first call that needs them, and the store is released by
//! [`DocRetriever::close`].
//!
//! [`DocRetriever::retrieve`] never fails. When the vector path is not
//! available (the provider cannot load or the store cannot open) or a search
//! fails, the keyword fallback answers instead.

use super::assembler::ResultAssembler;
use super::fallback::FallbackSearcher;
use super::hasher::ContentHasher;
use super::indexer::{Indexer, RebuildReport, RefreshReport};
use super::search::{SearchEngine, SearchResult};
use crate::config::RetrieverConfig;
use crate::storage::{ChunkStore, IndexStats, StoreHandle};
use anyhow::Result;
use docent_embed::{EmbeddingProvider, LazyProvider};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

struct Pipeline {
    store: Arc<dyn ChunkStore>,
    indexer: Indexer,
    search: SearchEngine,
}

pub struct DocRetriever {
    config: RetrieverConfig,
    store: StoreHandle,
    provider: Arc<dyn EmbeddingProvider>,
    hasher: Arc<dyn ContentHasher>,
    pipeline: OnceCell<Pipeline>,
    startup_sync: OnceCell<()>,
    writer: Mutex<()>,
    assembler: ResultAssembler,
    fallback: FallbackSearcher,
}

impl DocRetriever {
    /// Retriever with a persistent index in `config.index_dir` and a lazily
    /// loaded provider built from `config.embedding`.
    pub fn new(config: RetrieverConfig) -> Self {
        let store = StoreHandle::persistent(&config.index_dir);
        let provider = Arc::new(LazyProvider::from_config(config.embedding.clone()));
        Self::with_parts(config, store, provider)
    }

    /// Retriever over an explicit store handle and provider.
    pub fn with_parts(
        config: RetrieverConfig,
        store: StoreHandle,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let fallback = FallbackSearcher::new(
            config.docs_dir.clone(),
            config.extensions.clone(),
            config.fallback.clone(),
        );
        Self {
            hasher: config.hasher.build(),
            assembler: ResultAssembler::new(config.search.assembly_threshold),
            fallback,
            store,
            provider,
            pipeline: OnceCell::new(),
            startup_sync: OnceCell::new(),
            writer: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    async fn pipeline(&self) -> Result<&Pipeline> {
        self.pipeline
            .get_or_try_init(|| async {
                let store: Arc<dyn ChunkStore> = self.store.get().await?;
                let indexer = Indexer::new(
                    Arc::clone(&store),
                    Arc::clone(&self.provider),
                    Arc::clone(&self.hasher),
                    self.config.chunking.clone(),
                    self.config.extensions.clone(),
                    self.config.indexing.clone(),
                );
                let search = SearchEngine::new(
                    Arc::clone(&store),
                    Arc::clone(&self.provider),
                    self.config.search.clone(),
                );
                Ok::<_, anyhow::Error>(Pipeline {
                    store,
                    indexer,
                    search,
                })
            })
            .await
    }

    /// Whether the provider loads and the store answers.
    pub async fn vector_search_available(&self) -> bool {
        if let Err(e) = self.provider.ready().await {
            warn!("Embedding provider unavailable: {}", e);
            return false;
        }
        let pipeline = match self.pipeline().await {
            Ok(pipeline) => pipeline,
            Err(e) => {
                warn!("Index store unavailable: {:#}", e);
                return false;
            }
        };
        match pipeline.store.health_check().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Index store unavailable: {:#}", e);
                false
            }
        }
    }

    /// Answer `query` with assembled search results, or keyword matches when
    /// vector search is unavailable or fails.
    pub async fn retrieve(&self, query: &str) -> String {
        if !self.vector_search_available().await {
            info!("Vector search unavailable, answering with keyword fallback");
            return self.fallback.search(query).await;
        }

        self.startup_sync
            .get_or_init(|| async {
                if let Err(e) = self.sync().await {
                    warn!("Startup index refresh failed: {:#}", e);
                }
            })
            .await;

        match self.search(query, self.config.search.top_k).await {
            Ok(results) => self.assembler.assemble(&results),
            Err(e) => {
                warn!("Vector search failed, answering with keyword fallback: {:#}", e);
                self.fallback.search(query).await
            }
        }
    }

    /// Ranked results for `query`, without assembly or fallback.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.pipeline().await?.search.search(query, top_k).await
    }

    /// Index documents that changed since the last run.
    pub async fn sync(&self) -> Result<RefreshReport> {
        let pipeline = self.pipeline().await?;
        let _writer = self.writer.lock().await;
        let report = pipeline.indexer.refresh(&self.config.docs_dir).await?;
        let _ = self.startup_sync.set(());
        Ok(report)
    }

    /// Rebuild the whole index from `dir`, or from the configured documents
    /// directory.
    pub async fn refresh_index(&self, dir: Option<&Path>) -> Result<RebuildReport> {
        let dir = dir.unwrap_or(self.config.docs_dir.as_path());
        let pipeline = self.pipeline().await?;
        let _writer = self.writer.lock().await;
        let report = pipeline.indexer.rebuild(dir).await?;
        let _ = self.startup_sync.set(());
        Ok(report)
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        self.pipeline().await?.store.stats().await
    }

    /// Release the index store.
    pub async fn close(&self) {
        self.store.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::assembler::NO_RELEVANT_INFORMATION;
    use docent_embed::{EmbedConfig, EmbedError, HashingProvider};

    fn config(docs_dir: &Path) -> RetrieverConfig {
        RetrieverConfig::new(docs_dir).with_embedding(EmbedConfig::hashing(256))
    }

    fn retriever(docs_dir: &Path) -> DocRetriever {
        DocRetriever::with_parts(
            config(docs_dir),
            StoreHandle::in_memory(),
            Arc::new(HashingProvider::new(256, true)),
        )
    }

    #[tokio::test]
    async fn test_retrieve_indexes_lazily() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::write(
            temp_dir.path().join("setup.md"),
            "Install Node.js. Then install Rust.",
        )?;

        let retriever = retriever(temp_dir.path());
        let answer = retriever.retrieve("How to install Rust").await;

        assert!(answer.starts_with("[1] setup.md (relevance: "));
        assert!(answer.contains("Install Node.js. Then install Rust."));
        assert_eq!(retriever.stats().await?.chunks_count, 1);
        retriever.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_directory_gives_sentinel() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let retriever = retriever(temp_dir.path());

        assert_eq!(retriever.retrieve("anything at all").await, NO_RELEVANT_INFORMATION);
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_provider_uses_fallback() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::write(temp_dir.path().join("setup.md"), "Install Rust with rustup.")?;

        let provider = LazyProvider::new("offline", 256, || {
            Box::pin(async { Err(EmbedError::embedding_gen("model unavailable")) })
        });
        let retriever = DocRetriever::with_parts(
            config(temp_dir.path()),
            StoreHandle::in_memory(),
            Arc::new(provider),
        );

        assert!(!retriever.vector_search_available().await);
        let answer = retriever.retrieve("install rust").await;
        assert!(answer.contains("setup.md: Install Rust with rustup."));
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_store_uses_fallback() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::write(temp_dir.path().join("setup.md"), "Install Rust with rustup.")?;

        let retriever = retriever(temp_dir.path());
        assert!(retriever.vector_search_available().await);
        retriever.close().await;

        assert!(!retriever.vector_search_available().await);
        assert!(retriever.retrieve("install rust").await.contains("setup.md:"));
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_index_with_override_dir() -> Result<()> {
        let docs = tempfile::tempdir()?;
        let other = tempfile::tempdir()?;
        std::fs::write(other.path().join("a.md"), "Alpha paragraph with enough text.")?;
        std::fs::write(other.path().join("b.md"), "Beta paragraph with enough text.")?;

        let retriever = retriever(docs.path());
        let report = retriever.refresh_index(Some(other.path())).await?;

        assert_eq!(report.files_total, 2);
        assert_eq!(report.files_indexed, 2);
        assert_eq!(retriever.stats().await?.files_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_rebuild_then_sync_with_other_spelling_keeps_one_copy() -> Result<()> {
        let docs = tempfile::tempdir()?;
        std::fs::write(
            docs.path().join("setup.md"),
            "Install Node.js. Then install Rust.",
        )?;
        let retriever = retriever(docs.path());

        retriever.refresh_index(Some(&docs.path().join("."))).await?;
        let report = retriever.sync().await?;
        assert_eq!(report.files_indexed, 0);
        assert_eq!(report.files_unchanged, 1);
        assert_eq!(report.files_removed, 0);

        let stats = retriever.stats().await?;
        assert_eq!(stats.files_count, 1);
        assert_eq!(stats.chunks_count, 1);

        let answer = retriever.retrieve("How to install Rust").await;
        assert!(answer.starts_with("[1] setup.md"));
        assert!(!answer.contains("[2]"));
        Ok(())
    }
}
