//! Retriever configuration, loadable from a TOML file.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! docs_dir = "docs"
//! index_dir = "."
//! extensions = ["md", "markdown"]
//! hasher = "blake3"
//!
//! [search]
//! top_k = 3
//!
//! [embedding]
//! provider = "hashing"
//! dimension = 256
//! ```

use crate::retrieval::chunker::ChunkingConfig;
use crate::retrieval::fallback::FallbackConfig;
use crate::retrieval::hasher::HasherKind;
use crate::retrieval::indexer::IndexingConfig;
use crate::retrieval::search::SearchConfig;
use anyhow::{Context, Result};
use docent_embed::EmbedConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Directory scanned for documents
    pub docs_dir: PathBuf,
    /// Directory holding the index database
    pub index_dir: PathBuf,
    /// File extensions treated as documents, without the dot
    pub extensions: Vec<String>,
    pub hasher: HasherKind,
    pub chunking: ChunkingConfig,
    pub indexing: IndexingConfig,
    pub search: SearchConfig,
    pub fallback: FallbackConfig,
    pub embedding: EmbedConfig,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            index_dir: PathBuf::from("."),
            extensions: vec!["md".to_string(), "markdown".to_string()],
            hasher: HasherKind::default(),
            chunking: ChunkingConfig::default(),
            indexing: IndexingConfig::default(),
            search: SearchConfig::default(),
            fallback: FallbackConfig::default(),
            embedding: EmbedConfig::default(),
        }
    }
}

impl RetrieverConfig {
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_index_dir(mut self, index_dir: impl Into<PathBuf>) -> Self {
        self.index_dir = index_dir.into();
        self
    }

    pub fn with_embedding(mut self, embedding: EmbedConfig) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_hasher(mut self, hasher: HasherKind) -> Self {
        self.hasher = hasher;
        self
    }
}
