//! Generator trait for hosted LLM completions.

use async_trait::async_trait;

use crate::error::Result;

/// A text-completion backend.
///
/// The pipeline hands it a fully assembled prompt and returns whatever it
/// produces. Timeouts, retries and rate limiting are the backend's concern;
/// errors are propagated unchanged.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete `prompt` and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Human-readable name of the backing model.
    fn name(&self) -> &str;
}
