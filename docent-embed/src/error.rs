//! Error types for the embedding system

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type for all embedding operations.
///
/// Covers configuration problems, model start-up failures and failures while
/// turning text into vectors. Callers in the retriever treat a failure of a
/// single `embed_text` call as recoverable (the chunk or candidate is skipped),
/// while a failure to initialize the provider disables the vector path.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Error when the provider configuration is invalid
    #[error("Invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// Error during model initialization
    #[error("Model initialization failed: {source}")]
    ModelInitialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error during embedding generation
    #[error("Embedding generation failed: {message}")]
    EmbeddingGeneration { message: String },

    /// IO errors when preparing the model cache
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Async task join errors
    #[error("Async task failed: {source}")]
    AsyncTask {
        #[from]
        source: tokio::task::JoinError,
    },

    /// Generic errors from other libraries
    #[error("External error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl EmbedError {
    /// Create an embedding generation error with a custom message.
    pub fn embedding_gen<S: Into<String>>(message: S) -> Self {
        Self::EmbeddingGeneration {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error with a custom message.
    ///
    /// # Example
    /// ```
    /// use docent_embed::EmbedError;
    ///
    /// let err = EmbedError::invalid_config("batch_size must be positive");
    /// assert!(err.to_string().contains("batch_size"));
    /// ```
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
