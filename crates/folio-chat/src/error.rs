//! Error types for the conversation core.

use folio_core::error::FolioError;

/// Errors surfaced by chat operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conversation not found: {0}")]
    NotFound(String),
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
    #[error("notification error: {0}")]
    Notification(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<FolioError> for ChatError {
    fn from(err: FolioError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

/// Raw failure reported by a completion collaborator.
///
/// Carries the upstream reason verbatim; [`CompletionError::classify`] turns
/// it into a user-facing category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct UpstreamFailure {
    pub reason: String,
}

impl UpstreamFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Classified completion failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("Invalid API key. Please check your GROQ_API_KEY.")]
    InvalidApiKey,
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("Model '{model}' not found. Please check available models.")]
    ModelNotFound { model: String },
    #[error("Insufficient quota. Please check your Groq account.")]
    InsufficientQuota,
    #[error("Completion API error: {0}")]
    Upstream(String),
}

impl CompletionError {
    /// Classify an upstream failure by the known substrings in its reason.
    ///
    /// `model` is the model the failed call was made with.
    pub fn classify(failure: &UpstreamFailure, model: &str) -> Self {
        let reason = failure.reason.to_lowercase();
        if reason.contains("invalid_api_key") {
            CompletionError::InvalidApiKey
        } else if reason.contains("rate_limit") {
            CompletionError::RateLimited
        } else if reason.contains("model_not_found") {
            CompletionError::ModelNotFound {
                model: model.to_string(),
            }
        } else if reason.contains("insufficient_quota") {
            CompletionError::InsufficientQuota
        } else {
            CompletionError::Upstream(failure.reason.clone())
        }
    }

    /// Machine-readable category name.
    pub fn code(&self) -> &'static str {
        match self {
            CompletionError::InvalidApiKey => "invalid_api_key",
            CompletionError::RateLimited => "rate_limited",
            CompletionError::ModelNotFound { .. } => "model_not_found",
            CompletionError::InsufficientQuota => "insufficient_quota",
            CompletionError::Upstream(_) => "completion_failed",
        }
    }
}
