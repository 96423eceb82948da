//! Read-only similarity index trait.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// A similarity index over embedded chunks.
///
/// Indexes are built once during ingestion and only ever read afterwards, so
/// the trait exposes no insert, update or delete operations.
///
/// # Example
///
/// ```rust,ignore
/// use storefront_rag::{InMemoryIndex, VectorIndex};
///
/// let index = InMemoryIndex::build(embedded_chunks)?;
/// let results = index.search(&query_embedding, 2).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `top_k` chunks nearest to `embedding`.
    ///
    /// Results are ordered by ascending distance. An empty index yields an
    /// empty `Vec`, and `top_k` larger than the index returns every chunk.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Number of chunks held by the index.
    fn len(&self) -> usize;

    /// Whether the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
