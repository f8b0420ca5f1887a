//! Configuration for embedding providers

use crate::error::{EmbedError, Result};
use fastembed::EmbeddingModel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which embedding backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local ONNX model through fastembed
    #[default]
    Fastembed,
    /// Deterministic feature-hashing embedder, no model download
    Hashing,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Fastembed => write!(f, "fastembed"),
            ProviderKind::Hashing => write!(f, "hashing"),
        }
    }
}

/// Configuration for embedding models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Backend used to produce vectors
    pub provider: ProviderKind,
    /// Name of the built-in fastembed model
    pub model_name: String,
    /// Where fastembed keeps downloaded model files (fastembed default when unset)
    pub cache_dir: Option<PathBuf>,
    /// Maximum number of texts sent to the model in one call
    pub batch_size: usize,
    /// Whether to L2-normalize vectors
    pub normalize: bool,
    /// Vector dimension of the hashing provider
    pub dimension: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Fastembed,
            model_name: "all-MiniLM-L6-v2".to_string(),
            cache_dir: None,
            batch_size: 16,
            normalize: true,
            dimension: 384,
        }
    }
}

impl EmbedConfig {
    /// Configuration for a named built-in fastembed model.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    /// Configuration for the deterministic hashing provider.
    pub fn hashing(dimension: usize) -> Self {
        Self {
            provider: ProviderKind::Hashing,
            model_name: "feature-hashing".to_string(),
            dimension,
            ..Self::default()
        }
    }

    /// Set the batch size for embedding generation (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set whether to normalize embeddings (builder style)
    pub fn with_normalize(self, normalize: bool) -> Self {
        Self { normalize, ..self }
    }

    /// Set the model cache directory (builder style)
    pub fn with_cache_dir<P: AsRef<Path>>(self, cache_dir: P) -> Self {
        Self {
            cache_dir: Some(cache_dir.as_ref().to_path_buf()),
            ..self
        }
    }

    /// Resolve `model_name` to a fastembed model.
    pub fn fastembed_model(&self) -> Result<EmbeddingModel> {
        match self.model_name.to_lowercase().as_str() {
            "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
            "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
            "nomic-embed-text-v1.5" => Ok(EmbeddingModel::NomicEmbedTextV15),
            "snowflake-arctic-embed-xs" => Ok(EmbeddingModel::SnowflakeArcticEmbedXS),
            other => Err(EmbedError::invalid_config(format!(
                "Unknown fastembed model: {other}"
            ))),
        }
    }

    /// Check the configuration before a provider is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EmbedError::invalid_config("batch_size must be positive"));
        }
        match self.provider {
            ProviderKind::Fastembed => {
                self.fastembed_model()?;
            }
            ProviderKind::Hashing => {
                if self.dimension == 0 {
                    return Err(EmbedError::invalid_config(
                        "dimension must be positive for the hashing provider",
                    ));
                }
            }
        }
        tracing::debug!("Embedding configuration valid for: {}", self.model_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EmbedConfig::default();

        assert_eq!(config.provider, ProviderKind::Fastembed);
        assert_eq!(config.model_name, "all-MiniLM-L6-v2");
        assert_eq!(config.batch_size, 16);
        assert!(config.normalize);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_methods() {
        let temp_dir = tempdir().unwrap();
        let config = EmbedConfig::new("bge-small-en-v1.5")
            .with_batch_size(64)
            .with_normalize(false)
            .with_cache_dir(temp_dir.path());

        assert_eq!(config.batch_size, 64);
        assert!(!config.normalize);
        assert_eq!(config.cache_dir.as_deref(), Some(temp_dir.path()));
        assert!(matches!(
            config.fastembed_model(),
            Ok(EmbeddingModel::BGESmallENV15)
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(EmbedConfig::new("no-such-model").validate().is_err());
        assert!(EmbedConfig::default().with_batch_size(0).validate().is_err());
        assert!(EmbedConfig::hashing(0).validate().is_err());
        assert!(EmbedConfig::hashing(64).validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EmbedConfig = serde_json::from_str(r#"{"provider": "hashing"}"#).unwrap();

        assert_eq!(config.provider, ProviderKind::Hashing);
        assert_eq!(config.dimension, 384);
        assert_eq!(config.batch_size, 16);
    }
}
