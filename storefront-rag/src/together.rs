//! Together AI completion provider.
//!
//! This module is only available when the `together` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::generation::Generator;

/// The default Together API base URL.
pub const TOGETHER_API_BASE: &str = "https://api.together.xyz";

/// The default completion model.
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1-Distill-Llama-70B-free";

/// The default completion length limit.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

const PROVIDER: &str = "Together";

/// A [`Generator`] backed by the Together `/v1/completions` endpoint.
///
/// Reasoning models such as DeepSeek-R1 prefix their answer with reasoning
/// ending in `</think>`. It is removed from the returned text unless
/// [`with_strip_reasoning(false)`](TogetherGenerator::with_strip_reasoning)
/// is set.
///
/// # Example
///
/// ```rust,ignore
/// use storefront_rag::together::TogetherGenerator;
///
/// let generator = TogetherGenerator::new(api_key)?.with_max_tokens(512);
/// let reply = generator.complete("Say hello.").await?;
/// ```
pub struct TogetherGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    strip_reasoning: bool,
}

impl TogetherGenerator {
    /// Create a generator with the default model and token limit.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Config("Together API key must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: TOGETHER_API_BASE.into(),
            model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            strip_reasoning: true,
        })
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Point the generator at a different API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether to drop reasoning up to the last `</think>` from completions.
    pub fn with_strip_reasoning(mut self, strip: bool) -> Self {
        self.strip_reasoning = strip;
        self
    }

    /// The configured token limit.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Drop everything up to the last `</think>` and trim the rest.
///
/// The opening `<think>` tag is optional. Text without `</think>` is only trimmed.
pub fn strip_reasoning(text: &str) -> &str {
    text.rsplit_once("</think>").map_or(text, |(_, answer)| answer).trim()
}

#[async_trait]
impl Generator for TogetherGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let request_body =
            CompletionRequest { model: &self.model, prompt, max_tokens: self.max_tokens };

        let response = self
            .client
            .post(format!("{}/v1/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::Generation {
                    provider: PROVIDER.into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::Generation {
                provider: PROVIDER.into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::Generation {
                provider: PROVIDER.into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let text = completion.choices.into_iter().next().map(|c| c.text).ok_or_else(|| {
            RagError::Generation {
                provider: PROVIDER.into(),
                message: "API returned no choices".into(),
            }
        })?;

        if self.strip_reasoning {
            Ok(strip_reasoning(&text).to_string())
        } else {
            Ok(text)
        }
    }

    fn name(&self) -> &str {
        &self.model
    }
}
