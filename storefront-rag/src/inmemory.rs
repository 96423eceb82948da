//! In-memory similarity index using cosine distance.
//!
//! [`InMemoryIndex`] keeps every embedded chunk in a `Vec` and scans it on each
//! search. It is immutable once built, so it can be shared between concurrent
//! requests behind an `Arc` without any locking.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

const BACKEND: &str = "InMemory";

/// An exhaustive-scan index ranking chunks by cosine distance.
///
/// Chunks keep their ingestion order, and ties in distance are broken by that
/// order, so repeated searches are deterministic.
#[derive(Debug, Default, Clone)]
pub struct InMemoryIndex {
    chunks: Vec<Chunk>,
    dimensions: usize,
}

impl InMemoryIndex {
    /// Build an index from chunks that already carry embeddings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStore`] if any chunk has an empty embedding or
    /// if embeddings disagree in dimension.
    pub fn build(chunks: Vec<Chunk>) -> Result<Self> {
        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);

        for chunk in &chunks {
            if chunk.embedding.is_empty() {
                return Err(RagError::VectorStore {
                    backend: BACKEND.to_string(),
                    message: format!("chunk '{}' has no embedding", chunk.id),
                });
            }
            if chunk.embedding.len() != dimensions {
                return Err(RagError::VectorStore {
                    backend: BACKEND.to_string(),
                    message: format!(
                        "chunk '{}' has dimension {}, expected {dimensions}",
                        chunk.id,
                        chunk.embedding.len()
                    ),
                });
            }
        }

        Ok(Self { chunks, dimensions })
    }

    /// Dimensionality of the stored embeddings, or 0 for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The indexed chunks in ingestion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}

/// Compute cosine distance (`1 - cosine similarity`) between two vectors.
///
/// Returns 1.0 if either vector has zero magnitude.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }
        if embedding.len() != self.dimensions {
            return Err(RagError::VectorStore {
                backend: BACKEND.to_string(),
                message: format!(
                    "query has dimension {}, index expects {}",
                    embedding.len(),
                    self.dimensions
                ),
            });
        }

        let mut scored: Vec<SearchResult> = self
            .chunks
            .iter()
            .map(|chunk| SearchResult {
                chunk: chunk.clone(),
                distance: cosine_distance(&chunk.embedding, embedding),
            })
            .collect();

        // Stable sort keeps ingestion order among equal distances.
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}
