//! Generative-AI provider configuration.
//!
//! Env vars: GEMINI_API_KEY, GEMINI_ENDPOINT, GEMINI_MODELS (comma-separated),
//! GEMINI_TEMPERATURE, GEMINI_MAX_OUTPUT_TOKENS, GEMINI_TIMEOUT_SECS.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the Gemini client and model selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL, up to and including the version segment.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key. Never written back to config files.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Candidate models, tried in order.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens in response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Upper bound on one provider call, in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_models() -> Vec<String> {
    vec![
        "gemini-2.0-flash-exp".to_string(),
        "gemini-1.5-flash".to_string(),
        "gemini-1.5-pro".to_string(),
    ]
}

fn default_temperature() -> f32 {
    0.4
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_provider_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            models: default_models(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            provider_timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Apply overrides from a key lookup, usually the process environment.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(endpoint) = lookup("GEMINI_ENDPOINT") {
            self.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(models) = lookup("GEMINI_MODELS") {
            let parsed: Vec<String> = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.models = parsed;
            }
        }
        if let Some(t) = lookup("GEMINI_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = t;
        }
        if let Some(n) = lookup("GEMINI_MAX_OUTPUT_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_output_tokens = n;
        }
        if let Some(n) = lookup("GEMINI_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.provider_timeout_secs = n;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}
