//! Prompt assembly from retrieved context.

use crate::document::SearchResult;
use crate::error::{RagError, Result};

/// Context text used when retrieval returns nothing.
pub const NO_CONTEXT_PLACEHOLDER: &str = "No relevant context found.";

/// The default instruction template.
pub const DEFAULT_TEMPLATE: &str =
    "Use only the given context to answer briefly.\nContext: {context}\nUser: {query}\nAssistant:";

const CONTEXT_SLOT: &str = "{context}";
const QUERY_SLOT: &str = "{query}";

/// An instruction template with `{context}` and `{query}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    /// Create a template, checking that both placeholders are present.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `{context}` or `{query}` is missing.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for slot in [CONTEXT_SLOT, QUERY_SLOT] {
            if !template.contains(slot) {
                return Err(RagError::Config(format!("prompt template is missing {slot}")));
            }
        }
        Ok(Self { template })
    }

    /// Raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute `context` and `query` in a single pass.
    ///
    /// Placeholder-like text inside the substituted values is left as is.
    pub fn render(&self, context: &str, query: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + query.len());
        let mut rest = self.template.as_str();

        loop {
            let next = [(CONTEXT_SLOT, context), (QUERY_SLOT, query)]
                .into_iter()
                .filter_map(|(slot, value)| rest.find(slot).map(|pos| (pos, slot, value)))
                .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, slot, value)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(value);
                    rest = &rest[pos + slot.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }

    /// Build the prompt for `query` from ordered retrieval results.
    pub fn assemble(&self, results: &[SearchResult], query: &str) -> String {
        self.render(&join_context(results), query)
    }
}

/// Join retrieved chunk texts with single spaces, or return the placeholder.
pub fn join_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_CONTEXT_PLACEHOLDER.to_string();
    }
    results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    fn result(text: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: "kb_0".to_string(),
                text: text.to_string(),
                embedding: Vec::new(),
                metadata: HashMap::new(),
                document_id: "kb".to_string(),
            },
            distance: 0.0,
        }
    }

    #[test]
    fn joins_chunks_with_single_space() {
        let results = [result("Returns within 30 days."), result("Refunds take a week.")];
        assert_eq!(join_context(&results), "Returns within 30 days. Refunds take a week.");
    }

    #[test]
    fn empty_retrieval_uses_placeholder() {
        let prompt = PromptTemplate::default().assemble(&[], "Where is my order?");
        assert_eq!(
            prompt,
            "Use only the given context to answer briefly.\n\
             Context: No relevant context found.\n\
             User: Where is my order?\n\
             Assistant:"
        );
    }

    #[test]
    fn values_are_not_re_expanded() {
        let template = PromptTemplate::default();
        let prompt = template.render("see {query}", "what is {context}?");
        assert!(prompt.contains("Context: see {query}\n"));
        assert!(prompt.contains("User: what is {context}?\n"));
    }

    #[test]
    fn custom_template_requires_both_slots() {
        assert!(PromptTemplate::new("Q: {query}").is_err());
        assert!(PromptTemplate::new("C: {context}").is_err());

        let template = PromptTemplate::new("{query} | {context} | {query}").unwrap();
        assert_eq!(template.render("ctx", "q"), "q | ctx | q");
    }
}
