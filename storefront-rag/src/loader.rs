//! Plain-text knowledge base loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::document::Document;
use crate::error::{RagError, Result};

/// Loads a single UTF-8 text file as one [`Document`].
///
/// The document id is the file stem and both `source_uri` and the `source`
/// metadata entry hold the path the file was read from.
///
/// # Example
///
/// ```rust,ignore
/// use storefront_rag::TextLoader;
///
/// let documents = TextLoader::new("knowledge_base.txt").load()?;
/// ```
#[derive(Debug, Clone)]
pub struct TextLoader {
    path: PathBuf,
}

impl TextLoader {
    /// Create a loader for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the path this loader reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file into a single document.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Loader`] if the file is missing, unreadable, or not
    /// valid UTF-8.
    pub fn load(&self) -> Result<Vec<Document>> {
        let source = self.path.display().to_string();
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            error!(path = %source, error = %e, "failed to read knowledge base");
            RagError::Loader { path: source.clone(), message: e.to_string() }
        })?;

        let id = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        info!(path = %source, bytes = text.len(), "knowledge base loaded");

        Ok(vec![Document {
            id,
            text,
            metadata: HashMap::from([("source".to_string(), source.clone())]),
            source_uri: Some(source),
        }])
    }
}
