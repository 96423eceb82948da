//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits text on a hierarchy of natural boundaries (paragraphs, lines,
//! sentences, words, then single characters) and merges the pieces back into
//! chunks of bounded size.
//!
//! All sizes are measured in characters, so multi-byte text is never cut
//! inside a code point.

use std::collections::VecDeque;

use crate::config::RagConfig;
use crate::document::{Chunk, Document};

/// Boundaries tried in order, coarsest first. Characters are the implicit last level.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the indexer.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// A segment longer than `chunk_size` is split with the next boundary down;
/// the resulting pieces are then merged greedily into chunks of at most
/// `chunk_size` characters. With a non-zero `chunk_overlap`, each chunk starts
/// with trailing pieces of the previous one totalling at most `chunk_overlap`
/// characters. Chunks are trimmed of surrounding whitespace.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus a `chunk_index` field.
///
/// # Example
///
/// ```rust,ignore
/// use storefront_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(500, 0);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk (at least 1)
    /// * `chunk_overlap` - characters shared between consecutive chunks, capped at `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size) }
    }

    /// Create a chunker using the sizes from a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split raw text into trimmed, non-empty chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let pieces = split_into_pieces(text, self.chunk_size, &SEPARATORS);
        merge_pieces(&pieces, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .filter_map(|chunk| {
                let trimmed = chunk.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect()
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), i.to_string());
                Chunk {
                    id: format!("{}_{i}", document.id),
                    text,
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Break `text` into pieces no longer than `chunk_size`, descending through
/// `separators` only for segments that are still too long.
fn split_into_pieces<'a>(text: &'a str, chunk_size: usize, separators: &[&str]) -> Vec<&'a str> {
    if char_len(text) <= chunk_size {
        return vec![text];
    }

    let Some((separator, remaining)) = separators.split_first() else {
        return split_chars(text);
    };

    if !text.contains(separator) {
        return split_into_pieces(text, chunk_size, remaining);
    }

    split_keeping_separator(text, separator)
        .into_iter()
        .flat_map(|segment| split_into_pieces(segment, chunk_size, remaining))
        .collect()
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

fn split_chars(text: &str) -> Vec<&str> {
    text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
}

/// Greedily merge pieces into chunks of at most `chunk_size` characters,
/// carrying up to `chunk_overlap` trailing characters into the next chunk.
fn merge_pieces(pieces: &[&str], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut window_len = 0;

    for &piece in pieces {
        let piece_len = char_len(piece);
        if piece_len == 0 {
            continue;
        }

        if !window.is_empty() && window_len + piece_len > chunk_size {
            chunks.push(window.iter().copied().collect::<String>());

            // Keep at most `chunk_overlap` characters, and always leave room for the piece.
            while window_len > chunk_overlap || (window_len > 0 && window_len + piece_len > chunk_size)
            {
                match window.pop_front() {
                    Some(front) => window_len -= char_len(front),
                    None => break,
                }
            }
        }

        window.push_back(piece);
        window_len += piece_len;
    }

    if !window.is_empty() {
        chunks.push(window.iter().copied().collect::<String>());
    }

    chunks
}
