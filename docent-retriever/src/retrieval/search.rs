//! Brute-force cosine similarity search over the most recent chunks.

use crate::storage::{ChunkCandidate, ChunkStore, decode_embedding};
use anyhow::{Context, Result};
use docent_embed::EmbeddingProvider;
use half::f16;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Search tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned per query
    pub top_k: usize,
    /// Candidates scoring at or below this are discarded
    pub relevance_floor: f32,
    /// How many of the most recent chunks are scored
    pub candidate_limit: usize,
    /// Results below this are left out of the assembled answer
    pub assembly_threshold: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            relevance_floor: 0.1,
            candidate_limit: 1000,
            assembly_threshold: 0.2,
        }
    }
}

/// Where a result came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetadata {
    pub file_name: String,
    pub file_path: String,
    pub chunk_index: usize,
}

/// A ranked chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub text: String,
    /// Cosine similarity, clamped to 0..=1
    pub score: f32,
    pub metadata: ResultMetadata,
}

/// Cosine similarity of two vectors, computed in f32.
///
/// Returns 0 for mismatched dimensions, zero-magnitude inputs and non-finite
/// results.
pub fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        let x = x.to_f32();
        let y = y.to_f32();
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    let similarity = dot_product / denominator;
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

pub struct SearchEngine {
    store: Arc<dyn ChunkStore>,
    provider: Arc<dyn EmbeddingProvider>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        provider: Arc<dyn EmbeddingProvider>,
        config: SearchConfig,
    ) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Rank stored chunks against `query`.
    ///
    /// Fails only when the query cannot be embedded or the candidates cannot
    /// be loaded. A candidate that cannot be scored gets 0.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self
            .provider
            .embed_text(query)
            .await
            .context("Failed to embed query")?;

        let candidates = self
            .store
            .recent_candidates(self.config.candidate_limit)
            .await
            .context("Failed to load search candidates")?;

        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let score = match score_candidate(&query_embedding, &candidate) {
                    Ok(score) => score,
                    Err(e) => {
                        warn!("Scoring chunk {} failed: {}", candidate.id, e);
                        0.0
                    }
                };
                (score > self.config.relevance_floor).then(|| SearchResult {
                    text: candidate.text,
                    score: score.clamp(0.0, 1.0),
                    metadata: ResultMetadata {
                        file_name: candidate.file_name,
                        file_path: candidate.file_path,
                        chunk_index: candidate.chunk_index,
                    },
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        debug!("Query {:?} matched {} chunks", query, results.len());
        Ok(results)
    }
}

fn score_candidate(query: &[f16], candidate: &ChunkCandidate) -> Result<f32> {
    let embedding = decode_embedding(&candidate.embedding)?;
    if embedding.len() != query.len() {
        anyhow::bail!(
            "dimension mismatch: stored {} vs query {}",
            embedding.len(),
            query.len()
        );
    }
    Ok(cosine_similarity(query, &embedding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStore, StoredChunk, chunk_id};
    use async_trait::async_trait;
    use chrono::Utc;
    use docent_embed::{EmbedError, HashingProvider};

    fn vector(values: &[f32]) -> Vec<f16> {
        values.iter().copied().map(f16::from_f32).collect()
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vector(&[1.0, 2.0, 3.0]);
        let orthogonal = vector(&[0.0, 3.0, -2.0]);
        let zero = vector(&[0.0, 0.0, 0.0]);

        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-3);
        assert!(cosine_similarity(&a, &orthogonal).abs() < 1e-3);
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&a, &vector(&[1.0, 2.0])), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_non_finite() {
        let inf = vector(&[f32::INFINITY, 1.0]);
        let score = cosine_similarity(&inf, &vector(&[1.0, 1.0]));
        assert_eq!(score, 0.0);
        assert!(!cosine_similarity(&vector(&[f32::NAN, 1.0]), &vector(&[1.0, 1.0])).is_nan());
    }

    async fn store_with(texts: &[(&str, &str)], provider: &HashingProvider) -> Arc<SqliteStore> {
        let store = Arc::new(SqliteStore::open_memory().await.unwrap());
        for (path, text) in texts {
            let chunk = StoredChunk {
                id: chunk_id(path, 0),
                text: text.to_string(),
                embedding: provider.embed_text(text).await.unwrap(),
                file_name: path.to_string(),
                file_path: path.to_string(),
                file_type: "md".to_string(),
                chunk_index: 0,
                created_at: Utc::now(),
                file_hash: "h".to_string(),
            };
            store.replace_file_chunks(path, &[chunk]).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_ranking_is_sorted_and_bounded() -> Result<()> {
        let provider = HashingProvider::new(256, true);
        let store = store_with(
            &[
                ("rust.md", "Install Rust with rustup"),
                ("node.md", "Install Node.js with nvm"),
                ("both.md", "Install Node.js. Then install Rust."),
                ("other.md", "Quarterly revenue spreadsheet"),
            ],
            &provider,
        )
        .await;
        let engine = SearchEngine::new(store, Arc::new(provider), SearchConfig::default());

        let results = engine.search("How to install Rust", 2).await?;
        assert!(results.len() <= 2);
        assert!(!results.is_empty());
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(results.iter().all(|r| r.score > 0.1 && r.score <= 1.0));
        assert!(results.iter().all(|r| r.metadata.file_name != "other.md"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() -> Result<()> {
        let store = Arc::new(SqliteStore::open_memory().await?);
        let engine = SearchEngine::new(
            store,
            Arc::new(HashingProvider::new(64, true)),
            SearchConfig::default(),
        );
        assert!(engine.search("anything", 3).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_mismatched_dimension_scores_zero() -> Result<()> {
        let store = store_with(
            &[("a.md", "install rust")],
            &HashingProvider::new(32, true),
        )
        .await;
        let engine = SearchEngine::new(
            store,
            Arc::new(HashingProvider::new(64, true)),
            SearchConfig::default(),
        );
        assert!(engine.search("install rust", 3).await?.is_empty());
        Ok(())
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed_text(&self, _text: &str) -> docent_embed::Result<Vec<f16>> {
            Err(EmbedError::embedding_gen("provider offline"))
        }

        fn embedding_dimension(&self) -> usize {
            64
        }

        fn provider_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_query_embedding_failure_is_an_error() -> Result<()> {
        let store = Arc::new(SqliteStore::open_memory().await?);
        let engine = SearchEngine::new(store, Arc::new(FailingProvider), SearchConfig::default());
        assert!(engine.search("install rust", 3).await.is_err());
        Ok(())
    }
}
