//! Indexing pipeline: hash, chunk, embed, persist.
//!
//! ## Pipeline Flow
//!
//! ```text
//! document → ContentHasher → (unchanged? stop) → Chunker → EmbeddingProvider → ChunkStore
//! ```
//!
//! ## Failure Containment
//!
//! - A chunk whose embedding fails is logged and skipped; the rest of the
//!   document is still written.
//! - A document fails as a whole only when it cannot be read or the store
//!   write fails. During a refresh or rebuild such failures are logged and
//!   counted, other documents are unaffected.
//!
//! ## Backpressure
//!
//! Every embedding call holds a permit from a semaphore shared by all
//! documents, so at most `max_in_flight` calls reach the provider at once.
//! Within one document batches run one after another.

use super::change_detector::{ChangeDetector, path_key};
use super::chunker::{Chunker, ChunkingConfig};
use super::hasher::ContentHasher;
use crate::storage::{ChunkStore, IndexStats, StoredChunk, chunk_id};
use anyhow::{Context, Result};
use chrono::Utc;
use docent_embed::EmbeddingProvider;
use futures::StreamExt;
use futures::future::join_all;
use half::f16;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Configuration for the indexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Chunks embedded together before moving to the next batch
    pub batch_size: usize,
    /// Upper bound on concurrent embedding calls across all documents
    pub max_in_flight: usize,
    /// Documents indexed concurrently during a rebuild
    pub rebuild_parallelism: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            max_in_flight: 3,
            rebuild_parallelism: 2,
        }
    }
}

impl IndexingConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn with_rebuild_parallelism(mut self, parallelism: usize) -> Self {
        self.rebuild_parallelism = parallelism;
        self
    }
}

/// What happened to one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The stored chunks already match this content
    Unchanged,
    Indexed {
        chunks_written: usize,
        chunks_failed: usize,
    },
}

/// Result of an incremental refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_removed: usize,
    pub files_failed: usize,
    pub chunks_written: usize,
    pub chunks_failed: usize,
}

/// Result of a full rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub files_total: usize,
    pub files_indexed: usize,
    pub files_failed: usize,
    pub chunks_written: usize,
    pub chunks_failed: usize,
}

pub struct Indexer {
    store: Arc<dyn ChunkStore>,
    provider: Arc<dyn EmbeddingProvider>,
    hasher: Arc<dyn ContentHasher>,
    chunker: Chunker,
    detector: ChangeDetector,
    config: IndexingConfig,
    permits: Arc<Semaphore>,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        provider: Arc<dyn EmbeddingProvider>,
        hasher: Arc<dyn ContentHasher>,
        chunking: ChunkingConfig,
        extensions: Vec<String>,
        config: IndexingConfig,
    ) -> Self {
        let detector = ChangeDetector::new(Arc::clone(&store), Arc::clone(&hasher), extensions);
        Self {
            permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            store,
            provider,
            hasher,
            chunker: Chunker::new(chunking),
            detector,
            config,
        }
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// Index `content` as the document at `path`.
    ///
    /// A (path, content) pair that is already indexed is left alone. Otherwise
    /// the document's previous chunks are replaced by the new ones in a single
    /// store transaction, after all embeddings are computed.
    pub async fn index_document(&self, path: &Path, content: &str) -> Result<IndexOutcome> {
        let file_path = path_key(path);
        let file_hash = self.hasher.hash(content);

        if self.store.count_chunks(&file_path, &file_hash).await? > 0 {
            debug!("Skipping unchanged document {}", file_path);
            return Ok(IndexOutcome::Unchanged);
        }

        let texts = self.chunker.chunk(content);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.clone());
        let file_type = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let created_at = Utc::now();

        let batch_size = self.config.batch_size.max(1);
        let mut chunks = Vec::with_capacity(texts.len());
        let mut chunks_failed = 0;

        for (batch_number, batch) in texts.chunks(batch_size).enumerate() {
            let embeddings = join_all(batch.iter().map(|text| self.embed_chunk(text))).await;

            for (offset, (text, embedding)) in batch.iter().zip(embeddings).enumerate() {
                let chunk_index = batch_number * batch_size + offset;
                match embedding {
                    Ok(embedding) => chunks.push(StoredChunk {
                        id: chunk_id(&file_path, chunk_index),
                        text: text.clone(),
                        embedding,
                        file_name: file_name.clone(),
                        file_path: file_path.clone(),
                        file_type: file_type.clone(),
                        chunk_index,
                        created_at,
                        file_hash: file_hash.clone(),
                    }),
                    Err(e) => {
                        warn!("Skipping chunk {} of {}: {:#}", chunk_index, file_path, e);
                        chunks_failed += 1;
                    }
                }
            }
        }

        let chunks_written = self
            .store
            .replace_file_chunks(&file_path, &chunks)
            .await
            .with_context(|| format!("Failed to store chunks for {file_path}"))?;

        debug!(
            "Indexed {}: {} chunks written, {} failed",
            file_path, chunks_written, chunks_failed
        );
        Ok(IndexOutcome::Indexed {
            chunks_written,
            chunks_failed,
        })
    }

    /// Read the file at `path` and index it.
    pub async fn index_path(&self, path: &Path) -> Result<IndexOutcome> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read document {}", path.display()))?;
        self.index_document(path, &content).await
    }

    async fn embed_chunk(&self, text: &str) -> Result<Vec<f16>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .context("Embedding permits closed")?;
        let embedding = self.provider.embed_text(text).await?;
        if embedding.is_empty() {
            anyhow::bail!("provider {} returned an empty vector", self.provider.provider_name());
        }
        Ok(embedding)
    }

    /// Bring the index in line with `dir`: index new and changed documents
    /// and drop the chunks of documents that no longer exist.
    pub async fn refresh(&self, dir: &Path) -> Result<RefreshReport> {
        let changes = self.detector.scan(dir).await?;
        if changes.is_clean() {
            debug!("Index up to date for {}", dir.display());
        }
        let mut report = RefreshReport {
            files_scanned: changes.all_files.len(),
            files_unchanged: changes.unchanged_files.len(),
            ..RefreshReport::default()
        };

        for file_path in &changes.removed_files {
            let removed = self.store.delete_file_chunks(file_path).await?;
            debug!("Removed {} chunks of deleted document {}", removed, file_path);
            report.files_removed += 1;
        }

        for path in changes.pending() {
            match self.index_path(path).await {
                Ok(IndexOutcome::Indexed {
                    chunks_written,
                    chunks_failed,
                }) => {
                    report.files_indexed += 1;
                    report.chunks_written += chunks_written;
                    report.chunks_failed += chunks_failed;
                }
                Ok(IndexOutcome::Unchanged) => report.files_unchanged += 1,
                Err(e) => {
                    error!("Failed to index {}: {:#}", path.display(), e);
                    report.files_failed += 1;
                }
            }
        }

        info!(
            "Refreshed {}: {} indexed, {} unchanged, {} removed, {} failed",
            dir.display(),
            report.files_indexed,
            report.files_unchanged,
            report.files_removed,
            report.files_failed
        );
        Ok(report)
    }

    /// Clear the index and index every document under `dir`.
    pub async fn rebuild(&self, dir: &Path) -> Result<RebuildReport> {
        let files = self.detector.list_documents(dir)?;
        let cleared = self.store.clear().await.context("Failed to clear index")?;
        info!(
            "Rebuilding index from {} ({} documents, {} old chunks cleared)",
            dir.display(),
            files.len(),
            cleared
        );

        let outcomes: Vec<(PathBuf, Result<IndexOutcome>)> = futures::stream::iter(files)
            .map(|path| async move {
                let outcome = self.index_path(&path).await;
                (path, outcome)
            })
            .buffer_unordered(self.config.rebuild_parallelism.max(1))
            .collect()
            .await;

        let mut report = RebuildReport {
            files_total: outcomes.len(),
            ..RebuildReport::default()
        };
        for (path, outcome) in outcomes {
            match outcome {
                Ok(IndexOutcome::Indexed {
                    chunks_written,
                    chunks_failed,
                }) => {
                    report.files_indexed += 1;
                    report.chunks_written += chunks_written;
                    report.chunks_failed += chunks_failed;
                }
                Ok(IndexOutcome::Unchanged) => report.files_indexed += 1,
                Err(e) => {
                    error!("Failed to index {}: {:#}", path.display(), e);
                    report.files_failed += 1;
                }
            }
        }

        let stats: IndexStats = self.store.stats().await?;
        info!(
            "Rebuild complete: {}/{} documents, {} chunks stored",
            report.files_indexed, report.files_total, stats.chunks_count
        );
        Ok(report)
    }
}
