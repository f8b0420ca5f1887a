//! Embedding provider implementations

use crate::config::{EmbedConfig, ProviderKind};
use crate::error::{EmbedError, Result};
use crate::hashing::HashingProvider;
use async_trait::async_trait;
use fastembed::{InitOptions, TextEmbedding};
use half::f16;
use std::sync::{Arc, Mutex};

/// Result of embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text
    pub embeddings: Vec<Vec<f16>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result; the dimension is taken from the first vector.
    pub fn new(embeddings: Vec<Vec<f16>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Returns the number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>>;

    /// Generate embeddings for multiple texts (batch processing)
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_text(text).await?);
        }
        Ok(EmbeddingResult::new(embeddings))
    }

    /// Get the dimension of embeddings produced by this provider
    fn embedding_dimension(&self) -> usize;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;

    /// Check that the provider can serve requests, loading it if needed
    async fn ready(&self) -> Result<()> {
        Ok(())
    }
}

/// Build and initialize the provider described by `config`.
pub async fn create_provider(config: EmbedConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    config.validate()?;
    match config.provider {
        ProviderKind::Fastembed => Ok(Arc::new(FastEmbedProvider::create(config).await?)),
        ProviderKind::Hashing => Ok(Arc::new(HashingProvider::new(
            config.dimension,
            config.normalize,
        ))),
    }
}

/// FastEmbed-based embedding provider using real ONNX models
#[derive(Clone)]
pub struct FastEmbedProvider {
    config: EmbedConfig,
    model: Option<Arc<Mutex<TextEmbedding>>>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("config", &self.config)
            .field("model", &self.model.is_some())
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedProvider {
    /// Creates a new uninitialized provider. Call [`initialize`](Self::initialize) before use.
    pub fn new(config: EmbedConfig) -> Self {
        let dimension = config.dimension;
        Self {
            config,
            model: None,
            dimension,
        }
    }

    /// Downloads (if needed) and loads the embedding model.
    pub async fn initialize(&mut self) -> Result<()> {
        let model_kind = self.config.fastembed_model()?;
        tracing::info!(
            "Initializing FastEmbed provider for model: {}",
            self.config.model_name
        );

        let mut init_options =
            InitOptions::new(model_kind).with_show_download_progress(false);
        if let Some(cache_dir) = &self.config.cache_dir {
            tokio::fs::create_dir_all(cache_dir).await?;
            init_options = init_options.with_cache_dir(cache_dir.clone());
        }

        // Model loading is CPU and disk bound
        let model_name = self.config.model_name.clone();
        let (model, dimension) =
            tokio::task::spawn_blocking(move || -> Result<(TextEmbedding, usize)> {
                let mut model = TextEmbedding::try_new(init_options).map_err(|e| {
                    EmbedError::ModelInitialization { source: e.into() }
                })?;

                // Probe the output dimension
                let probe = model.embed(vec!["dimension probe".to_string()], None)?;
                let dimension = probe.first().map(|emb| emb.len()).unwrap_or(0);
                if dimension == 0 {
                    return Err(EmbedError::invalid_config(format!(
                        "Model {model_name} produced an empty embedding"
                    )));
                }

                tracing::info!("Model {} loaded. Dimension: {}", model_name, dimension);
                Ok((model, dimension))
            })
            .await??;

        self.model = Some(Arc::new(Mutex::new(model)));
        self.dimension = dimension;
        Ok(())
    }

    /// Creates and initializes a provider in one step.
    pub async fn create(config: EmbedConfig) -> Result<Self> {
        let mut provider = Self::new(config);
        provider.initialize().await?;
        Ok(provider)
    }

    fn convert_to_f16(&self, embeddings: Vec<Vec<f32>>) -> Vec<Vec<f16>> {
        embeddings
            .into_iter()
            .map(|embedding| {
                let norm = if self.config.normalize {
                    embedding.iter().map(|x| x * x).sum::<f32>().sqrt()
                } else {
                    0.0
                };
                embedding
                    .into_iter()
                    .map(|value| {
                        if norm > 0.0 {
                            f16::from_f32(value / norm)
                        } else {
                            f16::from_f32(value)
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        let texts = vec![text.to_string()];
        let result = self.embed_texts(&texts).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::embedding_gen("No embedding generated for text"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }

        let model = self.model.as_ref().ok_or_else(|| {
            EmbedError::invalid_config("Model not initialized. Call initialize() first.")
        })?;

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            let batch = batch.to_vec();
            let model = Arc::clone(model);

            let batch_embeddings =
                tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
                    let mut guard = model
                        .lock()
                        .map_err(|_| EmbedError::embedding_gen("Embedding model lock poisoned"))?;
                    Ok(guard.embed(batch, None)?)
                })
                .await??;

            all_embeddings.extend(self.convert_to_f16(batch_embeddings));
        }

        Ok(EmbeddingResult::new(all_embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }
}
