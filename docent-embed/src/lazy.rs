//! Memoized, lazily initialized embedding provider.
//!
//! Loading a model is slow, so callers hold a [`LazyProvider`] and the real
//! provider is built by its factory the first time a vector is requested.
//! Concurrent first calls share one initialization. A failed initialization
//! is not cached; the next call retries the factory.

use crate::config::EmbedConfig;
use crate::error::Result;
use crate::provider::{EmbeddingProvider, EmbeddingResult, create_provider};
use async_trait::async_trait;
use futures::future::BoxFuture;
use half::f16;
use std::sync::Arc;
use tokio::sync::OnceCell;

type ProviderFactory =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn EmbeddingProvider>>> + Send + Sync>;

/// Provider wrapper that defers construction until first use
pub struct LazyProvider {
    name: String,
    dimension_hint: usize,
    factory: ProviderFactory,
    inner: OnceCell<Arc<dyn EmbeddingProvider>>,
}

impl std::fmt::Debug for LazyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyProvider")
            .field("name", &self.name)
            .field("initialized", &self.inner.initialized())
            .finish()
    }
}

impl LazyProvider {
    /// Wrap an arbitrary async factory.
    pub fn new<F>(name: impl Into<String>, dimension_hint: usize, factory: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Arc<dyn EmbeddingProvider>>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            dimension_hint,
            factory: Box::new(factory),
            inner: OnceCell::new(),
        }
    }

    /// Lazily build the provider described by `config`.
    pub fn from_config(config: EmbedConfig) -> Self {
        let name = config.provider.to_string();
        let dimension_hint = config.dimension;
        Self::new(name, dimension_hint, move || {
            let config = config.clone();
            Box::pin(create_provider(config))
        })
    }

    /// Return the initialized provider, running the factory on first use.
    pub async fn get(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let provider = self
            .inner
            .get_or_try_init(|| async {
                tracing::info!("Initializing embedding provider: {}", self.name);
                (self.factory)().await
            })
            .await?;
        Ok(Arc::clone(provider))
    }

    /// Whether the underlying provider has been built.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized()
    }
}

#[async_trait]
impl EmbeddingProvider for LazyProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        self.get().await?.embed_text(text).await
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        self.get().await?.embed_texts(texts).await
    }

    async fn ready(&self) -> Result<()> {
        self.get().await?.ready().await
    }

    fn embedding_dimension(&self) -> usize {
        self.inner
            .get()
            .map(|provider| provider.embedding_dimension())
            .unwrap_or(self.dimension_hint)
    }

    fn provider_name(&self) -> &str {
        self.inner
            .get()
            .map(|provider| provider.provider_name())
            .unwrap_or(&self.name)
    }
}
