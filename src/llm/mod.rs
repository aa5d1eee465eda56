//! Generative-AI integration for paper summaries and literature reviews.
//!
//! Uses Google's Gemini API through an injectable [`TextGenerator`].

mod client;
mod selector;

pub use client::{
    literature_review_prompt, summary_prompt, GeminiClient, LlmConfig, LlmError, ModelAttempt,
    ModelInfo, TextGenerator,
};
pub use selector::{probe_candidates, ModelSelector};
