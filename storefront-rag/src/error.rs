//! Error types for the `storefront-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The knowledge base could not be loaded.
    #[error("Loader error ({path}): {message}")]
    Loader {
        /// Path of the source that failed to load.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The generator (hosted LLM) failed to produce a completion.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The LLM provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl RagError {
    /// A short, stable tag naming the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Loader { .. } => "loader",
            Self::Embedding { .. } => "embedding",
            Self::VectorStore { .. } => "vector_store",
            Self::Generation { .. } => "generation",
            Self::Config(_) => "configuration",
            Self::Pipeline(_) => "pipeline",
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
