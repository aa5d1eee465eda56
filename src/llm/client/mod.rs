//! Gemini client for paper summarization.
//!
//! Talks to Google's Generative Language REST API. Handlers never see this
//! type directly: they hold an `Arc<dyn TextGenerator>` built by the
//! composition root, so tests can swap in a scripted generator.

mod config;
mod prompts;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const API_KEY_HEADER: &str = "x-goog-api-key";

pub use config::LlmConfig;
pub use prompts::{literature_review_prompt, summary_prompt};

/// One failed candidate during model selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    pub error: String,
}

/// Errors that can occur during provider operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider returned no text: {0}")]
    EmptyResponse(String),

    #[error("Provider did not answer within {0} seconds")]
    Timeout(u64),

    #[error("No working model found (tried {})", format_attempts(.attempts))]
    NoModelAvailable { attempts: Vec<ModelAttempt> },
}

fn format_attempts(attempts: &[ModelAttempt]) -> String {
    if attempts.is_empty() {
        return "no candidates configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.model, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Model metadata as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-1.5-flash`.
    pub name: String,
    pub display_name: Option<String>,
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Model identifier without the `models/` prefix.
    pub fn id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }

    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

/// A text-generation provider.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt` with the given model.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError>;

    /// Confirm the model exists and can generate content.
    async fn probe_model(&self, model: &str) -> Result<(), LlmError>;

    /// List models visible to the configured credentials.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError>;
}

/// Gemini REST client.
pub struct GeminiClient {
    config: LlmConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.provider_timeout())
            .build()
            .map_err(|e| {
                LlmError::Connection(format!("Failed to create HTTP client: {}", e.without_url()))
            })?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.config.api_key.as_deref().ok_or(LlmError::MissingApiKey)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into an [`LlmError::Api`], preferring the
    /// provider's own error message over the raw body.
    async fn api_error(resp: reqwest::Response) -> LlmError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        LlmError::Api { status, message }
    }

    /// Map a transport failure. The URL is dropped from the message so
    /// nothing request-specific ends up in responses or logs.
    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.config.provider_timeout_secs)
        } else {
            LlmError::Connection(e.without_url().to_string())
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LlmError> {
        let resp = self
            .client
            .get(self.url(path))
            .header(API_KEY_HEADER, self.api_key()?)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }

        resp.json()
            .await
            .map_err(|e| LlmError::Parse(e.without_url().to_string()))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        debug!(model, prompt_chars = prompt.len(), "Sending generateContent request");
        let resp = self
            .client
            .post(self.url(&format!("models/{}:generateContent", model)))
            .header(API_KEY_HEADER, self.api_key()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.without_url().to_string()))?;

        let text = extract_text(body)?;
        info!(model, reply_chars = text.len(), "Provider reply received");
        Ok(text)
    }

    async fn probe_model(&self, model: &str) -> Result<(), LlmError> {
        let info: ModelInfo = self.get_json(&format!("models/{}", model), &[]).await?;
        if info.supported_generation_methods.is_empty() || info.supports_generate_content() {
            Ok(())
        } else {
            Err(LlmError::Api {
                status: 400,
                message: format!("{} does not support generateContent", info.id()),
            })
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let query: Vec<(&str, &str)> = match page_token.as_deref() {
                Some(token) => vec![("pageToken", token)],
                None => Vec::new(),
            };
            let page: ListModelsResponse = self.get_json("models", &query).await?;
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(models)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: GenerateResponse) -> Result<String, LlmError> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::EmptyResponse(format!("prompt blocked: {}", reason)));
    }

    let candidate = body
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| LlmError::EmptyResponse("no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(LlmError::EmptyResponse(format!("finish reason {}", reason)));
    }

    Ok(text)
}
