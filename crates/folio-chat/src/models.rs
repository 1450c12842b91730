//! Model catalog, live probe, and test-then-switch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::completion::{CompletionClient, ModelConfig};
use crate::error::{ChatError, CompletionError};
use crate::prompt::PromptMessage;
use folio_core::Role;

/// Served when the upstream model list cannot be fetched.
pub const FALLBACK_MODELS: &[&str] = &[
    "llama-3.1-70b-versatile",
    "llama-3.1-8b-instant",
    "llama-3.2-90b-text-preview",
    "llama-3.2-11b-text-preview",
    "llama-3.2-3b-preview",
    "llama-3.2-1b-preview",
];

const PROBE_PROMPT: &str = "Hello, can you respond with just \"API test successful\"?";
const SWITCH_PROMPT: &str = "Hello";

/// Result of a successful model switch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSwitch {
    /// Configuration to install.
    pub config: ModelConfig,
    pub old_model: String,
    /// Reply to the validation call.
    pub test_response: String,
}

/// Model operations over a completion client.
///
/// Stateless: the active [`ModelConfig`] is owned by the caller.
#[derive(Clone)]
pub struct ModelControl {
    completion: Arc<dyn CompletionClient>,
}

impl ModelControl {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    pub fn is_ready(&self) -> bool {
        self.completion.is_ready()
    }

    /// Llama models offered upstream, or the known list when listing fails.
    pub async fn available_models(&self) -> Vec<String> {
        match self.completion.list_models().await {
            Ok(models) => models
                .into_iter()
                .filter(|m| m.to_lowercase().contains("llama"))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Model listing failed, using fallback list");
                FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
            }
        }
    }

    /// One live completion with the given settings.
    pub async fn probe(&self, config: &ModelConfig) -> Result<String, CompletionError> {
        self.ask(PROBE_PROMPT, config).await
    }

    /// Validate `new_model` with a live call and return the config to install.
    ///
    /// `current` is never modified; on failure the caller keeps it.
    pub async fn switch_model(
        &self,
        current: &ModelConfig,
        new_model: &str,
    ) -> Result<ModelSwitch, ChatError> {
        let new_model = new_model.trim();
        if new_model.is_empty() {
            return Err(ChatError::Validation("Model name is required".to_string()));
        }

        let candidate = current.with_model(new_model);
        let test_response = self.ask(SWITCH_PROMPT, &candidate).await.map_err(|e| {
            tracing::warn!(model = %new_model, error = %e, "Model switch rejected");
            e
        })?;

        tracing::info!(old_model = %current.model, new_model = %new_model, "Model switched");
        Ok(ModelSwitch {
            config: candidate,
            old_model: current.model.clone(),
            test_response,
        })
    }

    async fn ask(&self, text: &str, config: &ModelConfig) -> Result<String, CompletionError> {
        let messages = [PromptMessage::new(Role::User, text)];
        self.completion
            .complete(&messages, config)
            .await
            .map_err(|f| CompletionError::classify(&f, &config.model))
    }
}
