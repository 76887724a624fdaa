// file: src/llm/mod.rs
// version: 1.0.0
// guid: 0f6c2b84-e93d-4a17-b5c0-8d2e7a41f936

//! Page and README generation through a language model

pub mod gemini;
pub mod prompts;

pub use gemini::GeminiClient;

use crate::error::AgentError;
use crate::task::DecodedAttachment;
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// A text-in, text-out model endpoint
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Produces the files of a generated app
#[async_trait::async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate a fresh `index.html` from a brief
    async fn generate_page(&self, brief: &str, attachments: &[DecodedAttachment]) -> Result<String>;

    /// Rewrite an existing `index.html` for a change request
    async fn revise_page(&self, existing_html: &str, brief: &str) -> Result<String>;

    /// README for the repository; never fails
    async fn generate_readme(&self, brief: &str, repo_name: &str) -> String;
}

/// Strip a markdown code fence the model wrapped its answer in.
///
/// When the text contains a fence, everything after the first line up to the
/// last fence is kept. If that leaves nothing, the whole text is used.
pub fn clean_llm_output(raw: &str) -> String {
    if raw.contains("```") {
        let start = raw.find('\n').map_or(0, |i| i + 1);
        if let Some(end) = raw.rfind("```") {
            if end > start {
                return raw[start..end].trim().to_string();
            }
        }
    }
    raw.trim().to_string()
}

/// `CodeGenerator` backed by a `LanguageModel`
pub struct LlmCodeGenerator {
    model: Arc<dyn LanguageModel>,
}

impl LlmCodeGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    async fn generate_cleaned(&self, prompt: &str, what: &str) -> Result<String> {
        let raw = self.model.generate(prompt).await?;
        let cleaned = clean_llm_output(&raw);
        if cleaned.is_empty() {
            return Err(AgentError::llm(format!("model returned an empty {}", what)));
        }
        Ok(cleaned)
    }
}

#[async_trait::async_trait]
impl CodeGenerator for LlmCodeGenerator {
    async fn generate_page(&self, brief: &str, attachments: &[DecodedAttachment]) -> Result<String> {
        info!("Generating code from brief ({} attachments)", attachments.len());
        self.generate_cleaned(&prompts::page_prompt(brief, attachments), "page")
            .await
    }

    async fn revise_page(&self, existing_html: &str, brief: &str) -> Result<String> {
        info!("Revising existing page");
        self.generate_cleaned(&prompts::revision_prompt(existing_html, brief), "revision")
            .await
    }

    async fn generate_readme(&self, brief: &str, repo_name: &str) -> String {
        info!("Generating README.md");
        match self
            .generate_cleaned(&prompts::readme_prompt(brief, repo_name), "README")
            .await
        {
            Ok(readme) => readme,
            Err(e) => {
                warn!("README generation failed, using fallback: {}", e);
                prompts::fallback_readme(brief, repo_name)
            }
        }
    }
}
