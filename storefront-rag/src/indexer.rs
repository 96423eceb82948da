//! Ingestion: chunk → embed → index.

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::document::{Chunk, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryIndex;

/// Split every document and build an [`InMemoryIndex`] over the resulting chunks.
///
/// Documents that produce no chunks (empty text) are skipped; zero documents
/// yield an empty index.
///
/// # Errors
///
/// Returns [`RagError::Pipeline`] if embedding fails for any chunk. No partial
/// index is ever returned.
pub async fn ingest(
    documents: &[Document],
    chunker: &dyn Chunker,
    embedder: &dyn EmbeddingProvider,
) -> Result<InMemoryIndex> {
    let chunks: Vec<Chunk> = documents.iter().flat_map(|document| chunker.chunk(document)).collect();
    info!(document_count = documents.len(), chunk_count = chunks.len(), "split knowledge base");
    build_index(chunks, embedder).await
}

/// Embed each chunk and build an [`InMemoryIndex`] from them.
///
/// # Errors
///
/// Returns [`RagError::Pipeline`] if the provider fails or returns a different
/// number of vectors than chunks, and [`RagError::VectorStore`] if the vectors
/// disagree in dimension.
pub async fn build_index(
    mut chunks: Vec<Chunk>,
    embedder: &dyn EmbeddingProvider,
) -> Result<InMemoryIndex> {
    if chunks.is_empty() {
        info!(chunk_count = 0, "built empty index");
        return InMemoryIndex::build(chunks);
    }

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts).await.map_err(|e| {
        error!(error = %e, "embedding failed during ingestion");
        RagError::Pipeline(format!("embedding failed during ingestion: {e}"))
    })?;

    if embeddings.len() != chunks.len() {
        error!(expected = chunks.len(), received = embeddings.len(), "embedding count mismatch");
        return Err(RagError::Pipeline(format!(
            "embedding provider returned {} vectors for {} chunks",
            embeddings.len(),
            chunks.len()
        )));
    }

    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
        chunk.embedding = embedding;
    }

    let index = InMemoryIndex::build(chunks)?;
    info!(chunk_count = index.chunks().len(), dimensions = index.dimensions(), "built index");
    Ok(index)
}
