//! Paragraph-first text chunking.
//!
//! Documents are split on blank lines. Paragraphs that are too short to carry
//! meaning are dropped, paragraphs longer than the target size are sliced with
//! an overlapping fixed window, and text without any paragraph break is sliced
//! the same way. If nothing survives, the start of the document becomes the
//! only chunk so that every non-empty document stays searchable.
//!
//! All sizes are measured in chars, not bytes.

use serde::{Deserialize, Serialize};

/// Configuration for chunking documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Preferred chunk size in characters
    pub target_size: usize,
    /// Characters shared by consecutive windows
    pub overlap: usize,
    /// Paragraphs shorter than this are dropped
    pub min_paragraph_len: usize,
    /// Chunks shorter than this are dropped
    pub min_chunk_len: usize,
    /// Chunks longer than this are clamped
    pub max_chunk_len: usize,
    /// Upper bound on chunks per document
    pub max_chunks: usize,
    /// Documents longer than this are truncated before chunking...
    pub truncate_threshold: usize,
    /// ...to this many characters
    pub truncate_to: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: 600,
            overlap: 50,
            min_paragraph_len: 20,
            min_chunk_len: 10,
            max_chunk_len: 2000,
            max_chunks: 500,
            truncate_threshold: 100_000,
            truncate_to: 50_000,
        }
    }
}

impl ChunkingConfig {
    pub fn new(target_size: usize, overlap: usize) -> Self {
        Self {
            target_size,
            overlap,
            ..Self::default()
        }
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn with_truncation(mut self, threshold: usize, truncate_to: usize) -> Self {
        self.truncate_threshold = threshold;
        self.truncate_to = truncate_to;
        self
    }

    /// Distance between the starts of consecutive windows.
    fn step(&self) -> usize {
        self.target_size.saturating_sub(self.overlap).max(1)
    }
}

/// Splits document text into embeddable chunks
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let config = &self.config;
        let text = if text.chars().count() > config.truncate_threshold {
            tracing::debug!(
                "Truncating document to {} characters before chunking",
                config.truncate_to
            );
            take_chars(text, config.truncate_to)
        } else {
            text
        };

        let paragraphs = split_paragraphs(text);
        let pieces: Vec<String> = if paragraphs.len() > 1 {
            paragraphs
                .into_iter()
                .filter(|paragraph| paragraph.chars().count() >= config.min_paragraph_len)
                .flat_map(|paragraph| {
                    if paragraph.chars().count() > config.target_size {
                        self.window(paragraph)
                    } else {
                        vec![paragraph.to_string()]
                    }
                })
                .collect()
        } else {
            self.window(text.trim())
        };

        let mut chunks: Vec<String> = pieces
            .into_iter()
            .filter_map(|piece| self.bound(&piece))
            .take(config.max_chunks)
            .collect();

        if chunks.is_empty() {
            let limit = config.target_size.min(config.max_chunk_len);
            let fallback = take_chars(text.trim(), limit).trim();
            if !fallback.is_empty() {
                chunks.push(fallback.to_string());
            }
        }
        chunks
    }

    /// Fixed-size windows advancing by `target_size - overlap`.
    fn window(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let size = self.config.target_size.max(1);
        let mut windows = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + size).min(chars.len());
            windows.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += self.config.step();
        }
        windows
    }

    /// Trim, drop too-short pieces, clamp too-long ones.
    fn bound(&self, piece: &str) -> Option<String> {
        let trimmed = piece.trim();
        let len = trimmed.chars().count();
        if len < self.config.min_chunk_len {
            None
        } else if len > self.config.max_chunk_len {
            Some(take_chars(trimmed, self.config.max_chunk_len).to_string())
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Blank-line separated blocks, trimmed, empty blocks removed.
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(begin) = start.take() {
                paragraphs.push(text[begin..end].trim());
            }
        } else {
            if start.is_none() {
                start = Some(offset);
            }
            end = offset + line.len();
        }
        offset += line.len();
    }
    if let Some(begin) = start {
        paragraphs.push(text[begin..end].trim());
    }
    paragraphs
}

/// The first `n` chars of `text`.
fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
