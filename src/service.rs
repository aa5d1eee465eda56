//! Summarization pipeline.
//!
//! Validates paper text, builds the prompt, makes one provider call under a
//! server-side timeout, and repairs the reply into a structured document.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;
use crate::llm::{
    literature_review_prompt, summary_prompt, LlmError, ModelSelector, TextGenerator,
};
use crate::models::{LiteratureReviewResult, ReviewContext, SummaryContext, SummaryResult};
use crate::repair::{repair, Repaired};
use crate::utils::{char_len, truncate_chars};

/// Papers requested when a literature review does not say.
pub const DEFAULT_NUM_PAPERS: u32 = 10;

/// Upper bound on papers per literature review.
pub const MAX_NUM_PAPERS: u32 = 50;

/// Errors from the summarization pipeline.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Paper text is too short or empty. Please provide at least {min} characters.")]
    TextTooShort { min: usize },

    #[error("Research topic is required")]
    MissingTopic,

    #[error(transparent)]
    Provider(#[from] LlmError),
}

impl ServiceError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Provider(_))
    }
}

/// Bounds applied to paper text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLimits {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl TextLimits {
    /// Reject text whose trimmed length is below the minimum.
    pub fn check(&self, text: &str) -> Result<(), ServiceError> {
        if char_len(text.trim()) < self.min_chars {
            return Err(ServiceError::TextTooShort {
                min: self.min_chars,
            });
        }
        Ok(())
    }
}

/// Summarizer shared by the HTTP handlers and the CLI.
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    selector: ModelSelector,
    limits: TextLimits,
    provider_timeout: Duration,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: &Settings) -> Self {
        Self {
            generator,
            selector: ModelSelector::new(settings.llm.models.clone()),
            limits: TextLimits {
                min_chars: settings.min_text_chars,
                max_chars: settings.max_text_chars,
            },
            provider_timeout: settings.llm.provider_timeout(),
        }
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    /// Summarize one paper.
    ///
    /// Text past `max_chars` is dropped before prompting. A reply that is
    /// not a JSON object still succeeds, as a fallback document.
    pub async fn summarize(
        &self,
        text: &str,
        context: SummaryContext,
    ) -> Result<Repaired<SummaryResult>, ServiceError> {
        self.limits.check(text)?;

        let total_chars = char_len(text);
        let text = truncate_chars(text, self.limits.max_chars);
        if total_chars > self.limits.max_chars {
            info!(
                total_chars,
                kept_chars = self.limits.max_chars,
                "Paper text truncated before prompting"
            );
        }

        let reply = self.complete(&summary_prompt(text)).await?;
        Ok(repair(&reply, &context))
    }

    /// Synthesize a literature review for a topic.
    ///
    /// `num_papers` defaults to [`DEFAULT_NUM_PAPERS`] and is clamped to
    /// `1..=MAX_NUM_PAPERS`.
    pub async fn literature_review(
        &self,
        topic: &str,
        keywords: Option<&str>,
        num_papers: Option<u32>,
    ) -> Result<Repaired<LiteratureReviewResult>, ServiceError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ServiceError::MissingTopic);
        }

        let keywords = keywords.map(str::trim).filter(|k| !k.is_empty());
        let num_papers = num_papers
            .unwrap_or(DEFAULT_NUM_PAPERS)
            .clamp(1, MAX_NUM_PAPERS);

        let prompt = literature_review_prompt(topic, keywords, num_papers);
        let reply = self.complete(&prompt).await?;

        let context = ReviewContext {
            topic: topic.to_string(),
        };
        Ok(repair(&reply, &context))
    }

    /// Select a model and make one provider call, bounded by the timeout.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let model = self.selector.select(self.generator.as_ref()).await?;
        debug!(model, prompt_chars = char_len(prompt), "Calling provider");

        match tokio::time::timeout(self.provider_timeout, self.generator.generate(model, prompt))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.provider_timeout.as_secs())),
        }
    }
}
