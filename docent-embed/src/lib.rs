//! # docent-embed
//!
//! Text embedding providers for the docent documentation retriever.
//!
//! The retriever only depends on the [`EmbeddingProvider`] capability: text in,
//! fixed-dimension `f16` vector out. This crate supplies the implementations:
//!
//! - [`FastEmbedProvider`]: local ONNX models through fastembed
//! - [`HashingProvider`]: deterministic feature hashing, no model download
//! - [`LazyProvider`]: memoized wrapper that builds a provider on first use
//!
//! ## Quick Start
//!
//! ```no_run
//! use docent_embed::{EmbedConfig, EmbeddingProvider, LazyProvider};
//!
//! # async fn example() -> docent_embed::Result<()> {
//! let provider = LazyProvider::from_config(EmbedConfig::default());
//!
//! // The model is loaded here, on the first request
//! let vector = provider.embed_text("How do I install Rust?").await?;
//! println!("dimension {}", vector.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Memory Usage
//!
//! Vectors are returned as half-precision floats; the retriever stores them
//! as-is, halving the size of the on-disk index.

pub mod config;
pub mod error;
pub mod hashing;
pub mod lazy;
pub mod provider;

pub use config::{EmbedConfig, ProviderKind};
pub use error::{EmbedError, Result};
pub use hashing::HashingProvider;
pub use lazy::LazyProvider;
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider, create_provider};
