//! Completion collaborator seam and per-call model settings.

use async_trait::async_trait;
use folio_core::config::CompletionConfig;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamFailure;
use crate::prompt::PromptMessage;

/// Sampling settings for one completion call.
///
/// The active model is a plain value: callers hold their own copy and a
/// model switch produces a new one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl ModelConfig {
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }

    /// Same sampling settings, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::from_config(&CompletionConfig::default())
    }
}

/// Chat-completion API.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the prompt and return the assistant text.
    async fn complete(
        &self,
        messages: &[PromptMessage],
        config: &ModelConfig,
    ) -> Result<String, UpstreamFailure>;

    /// Model ids the upstream currently offers.
    async fn list_models(&self) -> Result<Vec<String>, UpstreamFailure>;

    /// Whether the client has what it needs (credentials) to make calls.
    fn is_ready(&self) -> bool;
}
