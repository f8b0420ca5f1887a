//! End-to-end scenarios for indexing and retrieval.
//!
//! Every test uses an in-memory store and the deterministic hashing provider,
//! so nothing is downloaded and nothing touches a shared database.

use anyhow::Result;
use async_trait::async_trait;
use docent_embed::{EmbedConfig, EmbedError, EmbeddingProvider, HashingProvider};
use docent_retriever::{
    Blake3Hasher, ChunkStore, ChunkingConfig, ContentHasher, DocRetriever, IndexOutcome, Indexer,
    IndexingConfig, NO_RELEVANT_INFORMATION, RetrieverConfig, SearchConfig, SearchEngine,
    SqliteStore, StoreHandle,
};
use half::f16;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const DIMENSION: usize = 256;

fn provider() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashingProvider::new(DIMENSION, true))
}

fn indexer(store: Arc<SqliteStore>) -> Indexer {
    Indexer::new(
        store,
        provider(),
        Arc::new(Blake3Hasher),
        ChunkingConfig::default(),
        vec!["md".to_string(), "markdown".to_string()],
        IndexingConfig::default(),
    )
}

fn retriever_config(docs_dir: &Path) -> RetrieverConfig {
    RetrieverConfig::new(docs_dir).with_embedding(EmbedConfig::hashing(DIMENSION))
}

/// Embeds documents normally but fails on questions starting with "How".
struct QueryFailingProvider {
    inner: HashingProvider,
}

#[async_trait]
impl EmbeddingProvider for QueryFailingProvider {
    async fn embed_text(&self, text: &str) -> docent_embed::Result<Vec<f16>> {
        if text.starts_with("How") {
            return Err(EmbedError::embedding_gen("embedding service timed out"));
        }
        self.inner.embed_text(text).await
    }

    fn embedding_dimension(&self) -> usize {
        DIMENSION
    }

    fn provider_name(&self) -> &str {
        "query-failing"
    }
}

/// Scenario A: a question finds the document that answers it.
#[tokio::test]
async fn test_query_finds_matching_document() -> Result<()> {
    let store = Arc::new(SqliteStore::open_memory().await?);
    let indexer = indexer(Arc::clone(&store));
    indexer
        .index_document(Path::new("docs/setup.md"), "Install Node.js. Then install Rust.")
        .await?;
    indexer
        .index_document(
            Path::new("docs/billing.md"),
            "Invoices are emailed monthly to the account owner.",
        )
        .await?;

    let engine = SearchEngine::new(store, provider(), SearchConfig::default());
    let results = engine.search("How to install Rust", 3).await?;

    let top = results.first().expect("at least one result");
    assert_eq!(top.metadata.file_name, "setup.md");
    assert_eq!(top.metadata.file_path, "docs/setup.md");
    assert!(top.score > 0.1);
    Ok(())
}

/// Scenario B: re-indexing unchanged content is a no-op.
#[tokio::test]
async fn test_reindexing_unchanged_document_is_noop() -> Result<()> {
    let store = Arc::new(SqliteStore::open_memory().await?);
    let indexer = indexer(Arc::clone(&store));
    let path = Path::new("docs/guide.md");
    let content = "First paragraph of the guide.\n\nSecond paragraph of the guide.";

    indexer.index_document(path, content).await?;
    let before = store.get_file_chunks("docs/guide.md").await?;

    let outcome = indexer.index_document(path, content).await?;
    let after = store.get_file_chunks("docs/guide.md").await?;

    assert_eq!(outcome, IndexOutcome::Unchanged);
    assert_eq!(before.len(), 2);
    assert_eq!(before, after);
    Ok(())
}

/// Scenario C: changed content replaces every chunk of the old version.
#[tokio::test]
async fn test_modified_document_replaces_old_chunks() -> Result<()> {
    let store = Arc::new(SqliteStore::open_memory().await?);
    let indexer = indexer(Arc::clone(&store));
    let path = Path::new("docs/guide.md");
    let original = "Old paragraph number one.\n\nOld paragraph number two.\n\nOld paragraph three.";
    let modified = "A completely rewritten guide in one paragraph.";
    let h1 = Blake3Hasher.hash(original);
    let h2 = Blake3Hasher.hash(modified);

    indexer.index_document(path, original).await?;
    assert_eq!(store.count_chunks("docs/guide.md", &h1).await?, 3);

    indexer.index_document(path, modified).await?;

    assert_eq!(store.count_chunks("docs/guide.md", &h1).await?, 0);
    assert_eq!(store.count_chunks("docs/guide.md", &h2).await?, 1);
    let chunks = store.get_file_chunks("docs/guide.md").await?;
    assert!(chunks.iter().all(|chunk| chunk.file_hash == h2));
    Ok(())
}

/// Scenario D: a failing query embedding falls back to keyword search.
#[tokio::test]
async fn test_query_embedding_failure_falls_back() -> Result<()> {
    let docs = tempdir()?;
    std::fs::write(
        docs.path().join("setup.md"),
        "# Setup\n\nInstall Node.js.\nThen install Rust.",
    )?;

    let retriever = DocRetriever::with_parts(
        retriever_config(docs.path()),
        StoreHandle::in_memory(),
        Arc::new(QueryFailingProvider {
            inner: HashingProvider::new(DIMENSION, true),
        }),
    );

    assert!(retriever.vector_search_available().await);
    let answer = retriever.retrieve("How to install Rust").await;

    assert!(answer.contains("setup.md: Install Node.js."));
    assert!(answer.contains("setup.md: Then install Rust."));
    retriever.close().await;
    Ok(())
}

/// Scenario E: an empty documents directory yields the sentinel.
#[tokio::test]
async fn test_empty_directory_returns_sentinel() -> Result<()> {
    let docs = tempdir()?;
    let retriever = DocRetriever::with_parts(
        retriever_config(docs.path()),
        StoreHandle::in_memory(),
        provider(),
    );

    let report = retriever.sync().await?;
    assert_eq!(report.files_scanned, 0);
    assert_eq!(retriever.retrieve("How do I deploy?").await, NO_RELEVANT_INFORMATION);
    Ok(())
}

#[tokio::test]
async fn test_index_survives_reopen() -> Result<()> {
    let docs = tempdir()?;
    let index = tempdir()?;
    std::fs::write(docs.path().join("setup.md"), "Install Node.js. Then install Rust.")?;
    let config = retriever_config(docs.path()).with_index_dir(index.path());

    let first = DocRetriever::with_parts(
        config.clone(),
        StoreHandle::persistent(index.path()),
        provider(),
    );
    let report = first.sync().await?;
    assert_eq!(report.files_indexed, 1);
    first.close().await;

    let second = DocRetriever::with_parts(config, StoreHandle::persistent(index.path()), provider());
    let report = second.sync().await?;
    assert_eq!(report.files_indexed, 0);
    assert_eq!(report.files_unchanged, 1);
    assert!(second.retrieve("How to install Rust").await.contains("setup.md"));
    second.close().await;
    Ok(())
}

#[tokio::test]
async fn test_rebuild_counts_failures_per_document() -> Result<()> {
    let docs = tempdir()?;
    std::fs::write(docs.path().join("good.md"), "A perfectly readable document.")?;
    std::fs::write(docs.path().join("bad.md"), [0xff, 0xfe, 0xfd])?;

    let retriever = DocRetriever::with_parts(
        retriever_config(docs.path()),
        StoreHandle::in_memory(),
        provider(),
    );
    let report = retriever.refresh_index(None).await?;

    assert_eq!(report.files_total, 2);
    assert_eq!(report.files_indexed, 1);
    assert_eq!(report.files_failed, 1);
    assert_eq!(retriever.stats().await?.files_count, 1);
    Ok(())
}
