//! Storage abstraction layer for docent-retriever
//!
//! The index is a single table of chunks. Each row carries the chunk text, its
//! embedding, the metadata of the source document and the content hash of that
//! document at the time it was indexed.
//!
//! ## Key Components
//!
//! - **ChunkStore**: the operations the indexer (only writer) and the search
//!   engine (read-only) need
//! - **SqliteStore**: concrete SQLite implementation
//! - **StoreHandle**: lazily opened, explicitly closed owner of the store
//!
//! ## Invariant
//!
//! All chunks of one `file_path` carry the same `file_hash`. Implementations
//! must replace a file's chunk set atomically so stale chunks of a superseded
//! hash are never visible next to the current ones.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use half::f16;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

pub mod sqlite_store;

pub use sqlite_store::SqliteStore;

/// Stable chunk identifier, derived from source path and ordinal.
pub type ChunkId = String;

/// Name of the database file created inside the index directory.
pub const DATABASE_FILE: &str = ".docent.db";

/// Build the stable id of the `chunk_index`-th chunk of `file_path`.
pub fn chunk_id(file_path: &str, chunk_index: usize) -> ChunkId {
    format!("{file_path}#{chunk_index}")
}

/// Serialize an embedding for the `embedding` BLOB column as little-endian
/// f16 values.
pub fn encode_embedding(embedding: &[f16]) -> Vec<u8> {
    embedding.iter().flat_map(|value| value.to_le_bytes()).collect()
}

/// Decode an `embedding` BLOB back into a vector.
pub fn decode_embedding(bytes: &[u8]) -> Result<Vec<f16>> {
    if bytes.len() % 2 != 0 {
        anyhow::bail!(
            "Embedding blob has odd length {}, not a sequence of f16 values",
            bytes.len()
        );
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| f16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// A persisted chunk with its embedding and source metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub id: ChunkId,
    pub text: String,
    pub embedding: Vec<f16>,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub chunk_index: usize,
    pub created_at: DateTime<Utc>,
    /// Content hash of the parent document
    pub file_hash: String,
}

/// Chunk as loaded for similarity scoring; the embedding is left undecoded
/// so a malformed row only affects its own score.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub id: ChunkId,
    pub text: String,
    pub file_name: String,
    pub file_path: String,
    pub chunk_index: usize,
    pub embedding: Vec<u8>,
}

/// Summary of the stored index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub files_count: usize,
    pub chunks_count: usize,
    pub last_indexed_at: Option<DateTime<Utc>>,
}

/// Chunk storage operations.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Number of chunks stored for `file_path` under `file_hash`
    async fn count_chunks(&self, file_path: &str, file_hash: &str) -> Result<usize>;

    /// Atomically replace every chunk of `file_path` with `chunks`
    async fn replace_file_chunks(&self, file_path: &str, chunks: &[StoredChunk]) -> Result<usize>;

    /// Delete all chunks of `file_path`
    async fn delete_file_chunks(&self, file_path: &str) -> Result<usize>;

    /// All chunks of `file_path`, ordered by chunk index
    async fn get_file_chunks(&self, file_path: &str) -> Result<Vec<StoredChunk>>;

    /// Indexed file paths mapped to the content hash stored for them
    async fn indexed_files(&self) -> Result<HashMap<String, String>>;

    /// The `limit` most recently created chunks
    async fn recent_candidates(&self, limit: usize) -> Result<Vec<ChunkCandidate>>;

    /// Remove every chunk
    async fn clear(&self) -> Result<usize>;

    /// Counts for diagnostics
    async fn stats(&self) -> Result<IndexStats>;

    /// Cheap round trip proving the store is usable
    async fn health_check(&self) -> Result<()>;
}

/// Single acquisition point for the index store.
///
/// The store is opened on the first [`get`](Self::get) and stays open until
/// [`close`](Self::close) is awaited. Owners are expected to close the handle
/// on shutdown so the SQLite WAL is checkpointed.
#[derive(Debug)]
pub struct StoreHandle {
    location: StoreLocation,
    store: OnceCell<Arc<SqliteStore>>,
}

#[derive(Debug, Clone)]
enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl StoreHandle {
    /// Handle for the database file inside `index_dir`.
    pub fn persistent(index_dir: &Path) -> Self {
        Self {
            location: StoreLocation::File(index_dir.join(DATABASE_FILE)),
            store: OnceCell::new(),
        }
    }

    /// Handle for a private in-memory database, used by tests.
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            store: OnceCell::new(),
        }
    }

    /// Open the store on first use and return it.
    pub async fn get(&self) -> Result<Arc<SqliteStore>> {
        let store = self
            .store
            .get_or_try_init(|| async {
                let store = match &self.location {
                    StoreLocation::File(path) => SqliteStore::open(path).await?,
                    StoreLocation::Memory => SqliteStore::open_memory().await?,
                };
                Ok::<_, anyhow::Error>(Arc::new(store))
            })
            .await?;
        Ok(Arc::clone(store))
    }

    /// Whether the store has been opened and not closed since.
    pub fn is_open(&self) -> bool {
        self.store.get().is_some_and(|store| !store.is_closed())
    }

    /// Close the store if it is open. Later calls to `get` return the
    /// closed store, whose operations fail.
    pub async fn close(&self) {
        if let Some(store) = self.store.get().filter(|store| !store.is_closed()) {
            store.close().await;
            info!("Index store closed");
        }
    }
}
