//! # storefront-rag
//!
//! Retrieval-augmented generation for the storefront assistant.
//!
//! ## Overview
//!
//! Ingestion runs once: a [`TextLoader`] reads the knowledge base, a
//! [`RecursiveChunker`] splits it, and [`indexer::ingest`] embeds every chunk
//! into an [`InMemoryIndex`]. Each query then goes through [`RagPipeline`]:
//! embed the query, fetch the nearest chunks, fill the [`PromptTemplate`], and
//! ask the [`Generator`] for a reply.
//!
//! ## Providers
//!
//! - `openai` feature: [`openai::OpenAIEmbeddingProvider`]
//! - `together` feature: [`together::TogetherGenerator`]
//!
//! Any other backend plugs in through the [`EmbeddingProvider`],
//! [`VectorIndex`] and [`Generator`] traits.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod indexer;
pub mod inmemory;
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;
#[cfg(feature = "together")]
pub mod together;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::Generator;
pub use inmemory::InMemoryIndex;
pub use loader::TextLoader;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{RagAnswer, RagPipeline, RagPipelineBuilder};
pub use prompt::{NO_CONTEXT_PLACEHOLDER, PromptTemplate};
#[cfg(feature = "together")]
pub use together::TogetherGenerator;
pub use vectorstore::VectorIndex;
