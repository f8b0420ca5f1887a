//! Deterministic feature-hashing embedder.
//!
//! Each lowercase alphanumeric token is hashed with FNV-1a into one of
//! `dimension` buckets. Texts sharing vocabulary get a positive cosine
//! similarity, which is enough for offline operation and for tests that must
//! not download a model.

use crate::error::Result;
use crate::provider::EmbeddingProvider;
use async_trait::async_trait;
use fnv::FnvHasher;
use half::f16;
use std::hash::Hasher;

/// Embedding provider backed by feature hashing instead of a neural model
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
    normalize: bool,
}

impl HashingProvider {
    pub fn new(dimension: usize, normalize: bool) -> Self {
        Self {
            dimension: dimension.max(1),
            normalize,
        }
    }

    /// Compute the f32 vector for `text` without async overhead.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];
        for token in tokenize(text) {
            let mut hasher = FnvHasher::default();
            hasher.write(token.as_bytes());
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        if self.normalize {
            let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in &mut vector {
                    *value /= norm;
                }
            }
        }
        vector
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        Ok(self
            .embed_sync(text)
            .into_iter()
            .map(f16::from_f32)
            .collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic_and_normalized() {
        let provider = HashingProvider::new(128, true);
        let a = provider.embed_sync("Install Node.js. Then install Rust.");
        let b = provider.embed_sync("Install Node.js. Then install Rust.");

        assert_eq!(a, b);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let provider = HashingProvider::new(256, true);
        let doc = provider.embed_sync("Install Node.js. Then install Rust.");
        let related = provider.embed_sync("How to install Rust");
        let unrelated = provider.embed_sync("quarterly revenue spreadsheet");

        assert!(dot(&doc, &related) > 0.3);
        assert!(dot(&doc, &related) > dot(&doc, &unrelated));
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let provider = HashingProvider::new(64, true);
        assert_eq!(provider.embed_sync("Rust."), provider.embed_sync("rust"));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = HashingProvider::new(16, true);
        let embedding = provider.embed_text("   ").await.unwrap();

        assert_eq!(embedding.len(), 16);
        assert!(embedding.iter().all(|x| x.to_f32() == 0.0));
    }
}
