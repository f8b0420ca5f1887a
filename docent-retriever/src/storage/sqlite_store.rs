//! SQLite implementation of [`ChunkStore`].
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE chunks (
//!     id TEXT PRIMARY KEY,          -- "{file_path}#{chunk_index}"
//!     text TEXT NOT NULL,
//!     embedding BLOB NOT NULL,      -- little-endian f16 values
//!     file_name TEXT NOT NULL,
//!     file_path TEXT NOT NULL,
//!     file_type TEXT NOT NULL,
//!     chunk_index INTEGER NOT NULL,
//!     created_at TIMESTAMP NOT NULL,
//!     file_hash TEXT NOT NULL       -- content hash of the parent document
//! );
//! ```
//!
//! ## SQLite Optimizations
//!
//! - **WAL mode**: readers are not blocked by the indexer
//! - **Large page size** (64KB): suits embedding blobs
//! - **Auto-vacuum**: file shrinks after a rebuild
//! - **Indexes** on `file_hash`, `file_name` and `file_path`

use super::{
    ChunkCandidate, ChunkStore, IndexStats, StoredChunk, decode_embedding, encode_embedding,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// SQLite-backed chunk store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create index directory {}", parent.display())
                })?;
            }
        }

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .create_if_missing(true)
                .auto_vacuum(sqlx::sqlite::SqliteAutoVacuum::Full)
                .page_size(1 << 16)
                .optimize_on_close(true, 1 << 10),
        )
        .await
        .with_context(|| format!("Failed to open index database {}", db_path.display()))?;

        debug!("Opened index database at {}", db_path.display());
        Self::new_with_pool(pool).await
    }

    /// Open a private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` is a separate database, so the
    /// pool is pinned to a single connection that never expires.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::new_with_pool(pool).await
    }

    async fn new_with_pool(pool: SqlitePool) -> Result<Self> {
        Self::create_tables(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_tables(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                file_name TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_type TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL,
                file_hash TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_file_hash ON chunks(file_hash)")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_file_name ON chunks(file_name)")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_file_path ON chunks(file_path)")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Close the connection pool, checkpointing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    fn row_to_chunk(row: &SqliteRow) -> Result<StoredChunk> {
        let embedding: Vec<u8> = row.try_get("embedding")?;
        let chunk_index: i64 = row.try_get("chunk_index")?;
        Ok(StoredChunk {
            id: row.try_get("id")?,
            text: row.try_get("text")?,
            embedding: decode_embedding(&embedding)?,
            file_name: row.try_get("file_name")?,
            file_path: row.try_get("file_path")?,
            file_type: row.try_get("file_type")?,
            chunk_index: chunk_index as usize,
            created_at: row.try_get("created_at")?,
            file_hash: row.try_get("file_hash")?,
        })
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn count_chunks(&self, file_path: &str, file_hash: &str) -> Result<usize> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE file_path = ?1 AND file_hash = ?2")
                .bind(file_path)
                .bind(file_hash)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as usize)
    }

    async fn replace_file_chunks(&self, file_path: &str, chunks: &[StoredChunk]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM chunks WHERE file_path = ?1")
            .bind(file_path)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, text, embedding, file_name, file_path, file_type, chunk_index, created_at, file_hash)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.text)
            .bind(encode_embedding(&chunk.embedding))
            .bind(&chunk.file_name)
            .bind(file_path)
            .bind(&chunk.file_type)
            .bind(chunk.chunk_index as i64)
            .bind(chunk.created_at)
            .bind(&chunk.file_hash)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert chunk {}", chunk.id))?;
        }

        tx.commit().await?;
        debug!(
            "Replaced chunks of {}: {} removed, {} written",
            file_path,
            removed,
            chunks.len()
        );
        Ok(chunks.len())
    }

    async fn delete_file_chunks(&self, file_path: &str) -> Result<usize> {
        let result = sqlx::query("DELETE FROM chunks WHERE file_path = ?1")
            .bind(file_path)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn get_file_chunks(&self, file_path: &str) -> Result<Vec<StoredChunk>> {
        let rows = sqlx::query(
            "SELECT id, text, embedding, file_name, file_path, file_type, chunk_index, created_at, file_hash
             FROM chunks WHERE file_path = ?1 ORDER BY chunk_index",
        )
        .bind(file_path)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_chunk).collect()
    }

    async fn indexed_files(&self) -> Result<HashMap<String, String>> {
        let rows = sqlx::query("SELECT DISTINCT file_path, file_hash FROM chunks")
            .fetch_all(&self.pool)
            .await?;

        let mut files = HashMap::with_capacity(rows.len());
        for row in rows {
            files.insert(row.try_get("file_path")?, row.try_get("file_hash")?);
        }
        Ok(files)
    }

    async fn recent_candidates(&self, limit: usize) -> Result<Vec<ChunkCandidate>> {
        let rows = sqlx::query(
            "SELECT id, text, embedding, file_name, file_path, chunk_index
             FROM chunks ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let chunk_index: i64 = row.try_get("chunk_index")?;
            candidates.push(ChunkCandidate {
                id: row.try_get("id")?,
                text: row.try_get("text")?,
                file_name: row.try_get("file_name")?,
                file_path: row.try_get("file_path")?,
                chunk_index: chunk_index as usize,
                embedding: row.try_get("embedding")?,
            });
        }
        Ok(candidates)
    }

    async fn clear(&self) -> Result<usize> {
        let result = sqlx::query("DELETE FROM chunks")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let row = sqlx::query("SELECT COUNT(DISTINCT file_path) AS files, COUNT(*) AS chunks FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        let files: i64 = row.try_get("files")?;
        let chunks: i64 = row.try_get("chunks")?;

        let last_indexed_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT created_at FROM chunks ORDER BY created_at DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(IndexStats {
            files_count: files as usize,
            chunks_count: chunks as usize,
            last_indexed_at,
        })
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
