//! Model selection.
//!
//! Candidates are confirmed with one lightweight provider request each, in
//! order, and the first callable one wins. A successful choice is cached for
//! the life of the selector; failures are not, so a provider outage at
//! startup heals on the next request.

use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::client::{LlmError, ModelAttempt, TextGenerator};

pub struct ModelSelector {
    candidates: Vec<String>,
    selected: OnceCell<String>,
}

impl ModelSelector {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            selected: OnceCell::new(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// The cached choice, if selection has already succeeded.
    pub fn selected(&self) -> Option<&str> {
        self.selected.get().map(String::as_str)
    }

    /// Return the selected model, probing candidates on first use.
    pub async fn select(&self, generator: &dyn TextGenerator) -> Result<&str, LlmError> {
        self.selected
            .get_or_try_init(|| probe_candidates(&self.candidates, generator))
            .await
            .map(String::as_str)
    }
}

/// Probe each candidate in order and return the first that answers.
pub async fn probe_candidates(
    candidates: &[String],
    generator: &dyn TextGenerator,
) -> Result<String, LlmError> {
    let mut attempts = Vec::new();

    for model in candidates {
        match generator.probe_model(model).await {
            Ok(()) => {
                info!(model = %model, "Selected generative model");
                return Ok(model.clone());
            }
            Err(e) => {
                warn!(model = %model, error = %e, "Model candidate rejected");
                attempts.push(ModelAttempt {
                    model: model.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    Err(LlmError::NoModelAvailable { attempts })
}
