//! RAG query pipeline.
//!
//! The [`RagPipeline`] runs the per-request workflow: embed the query, search
//! the index, assemble the prompt, and ask the generator for a completion.
//! The index is built beforehand (see [`crate::indexer`]) and injected.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_rag::{RagPipeline, RagConfig, RecursiveChunker, indexer};
//!
//! let index = indexer::ingest(&documents, &RecursiveChunker::default(), embedder.as_ref()).await?;
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(embedder)
//!     .index(Arc::new(index))
//!     .generator(Arc::new(generator))
//!     .build()?;
//!
//! let answer = pipeline.answer("What is your return policy?").await?;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::Generator;
use crate::prompt::PromptTemplate;
use crate::vectorstore::VectorIndex;

/// The outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RagAnswer {
    /// The generator's completion.
    pub reply: String,
    /// IDs of the chunks used as context, nearest first.
    pub sources: Vec<String>,
}

/// The RAG query pipeline.
///
/// Holds only read-only state, so one instance can serve concurrent requests
/// behind an `Arc`. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the similarity index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Embed `query` and return up to `top_k` nearest chunks, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] or [`RagError::VectorStore`] unchanged
    /// from the failing collaborator.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        let results =
            self.index.search(&query_embedding, self.config.top_k).await.inspect_err(|e| {
                error!(error = %e, "index search failed");
            })?;

        for result in &results {
            debug!(chunk.id = %result.chunk.id, distance = result.distance, "retrieved chunk");
        }
        Ok(results)
    }

    /// Build the generator prompt from retrieval results.
    pub fn assemble_prompt(&self, results: &[SearchResult], query: &str) -> String {
        self.template.assemble(results, query)
    }

    /// Run the whole query pipeline: retrieve → assemble → generate.
    ///
    /// # Errors
    ///
    /// Propagates the first failing stage's error; nothing is retried.
    pub async fn answer(&self, query: &str) -> Result<RagAnswer> {
        let results = self.retrieve(query).await?;
        let prompt = self.assemble_prompt(&results, query);
        debug!(context_found = !results.is_empty(), prompt = %prompt, "assembled prompt");

        let reply = self.generator.complete(&prompt).await.inspect_err(|e| {
            error!(generator = self.generator.name(), error = %e, "generation failed");
        })?;

        let sources = results.into_iter().map(|r| r.chunk.id).collect();
        info!(reply_len = reply.len(), "query answered");
        Ok(RagAnswer { reply, sources })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config` and `template` fall back to their defaults; the embedding
/// provider, index and generator are required.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    generator: Option<Arc<dyn Generator>>,
    template: Option<PromptTemplate>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider used for queries.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the similarity index built at ingestion.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the completion backend.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Replace the default prompt template.
    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let index = self.index.ok_or_else(|| RagError::Config("index is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| RagError::Config("generator is required".to_string()))?;

        Ok(RagPipeline {
            config: self.config.unwrap_or_default(),
            embedding_provider,
            index,
            generator,
            template: self.template.unwrap_or_default(),
        })
    }
}
