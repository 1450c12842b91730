//! Application state shared across all route handlers.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use folio_chat::{
    ChatOrchestrator, CompletionClient, EmailSender, InMemoryConversationStore, ModelConfig,
    ModelControl,
};
use folio_core::{FolioConfig, SystemClock, UuidGenerator};

use crate::error::ApiError;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. The active
/// model is swapped with a single write after a successful switch; every
/// request works on its own clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FolioConfig>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub models: ModelControl,
    pub active_model: Arc<RwLock<ModelConfig>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire the in-memory store and orchestrator around the given collaborators.
    pub fn new(
        config: FolioConfig,
        completion: Arc<dyn CompletionClient>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        let clock = Arc::new(SystemClock);
        let store = Arc::new(InMemoryConversationStore::new(
            clock.clone(),
            Arc::new(UuidGenerator),
        ));
        let orchestrator =
            ChatOrchestrator::new(store, completion.clone(), email, clock, &config.chat);
        Self::from_parts(config, orchestrator, ModelControl::new(completion))
    }

    pub fn from_parts(
        config: FolioConfig,
        orchestrator: ChatOrchestrator,
        models: ModelControl,
    ) -> Self {
        let active_model = ModelConfig::from_config(&config.completion);
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            models,
            active_model: Arc::new(RwLock::new(active_model)),
            start_time: Instant::now(),
        }
    }

    /// Snapshot of the active model settings.
    pub fn current_model(&self) -> Result<ModelConfig, ApiError> {
        self.active_model
            .read()
            .map(|m| m.clone())
            .map_err(|e| ApiError::Internal(format!("model lock poisoned: {}", e)))
    }

    pub fn install_model(&self, model: ModelConfig) -> Result<(), ApiError> {
        let mut active = self
            .active_model
            .write()
            .map_err(|e| ApiError::Internal(format!("model lock poisoned: {}", e)))?;
        *active = model;
        Ok(())
    }
}
