//! Route handler functions for all API endpoints.
//!
//! Handlers extract JSON bodies and path parameters, delegate to the
//! orchestrator or model control in `AppState`, and return JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use folio_chat::{ChatError, ChatReply, ChatRequest};
use folio_core::{ConversationMetadata, ConversationSummary, Turn};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

/// Body of POST /api/chat. A missing message is a validation error, not a
/// malformed request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatBody {
    pub message: Option<String>,
    pub conversation_id: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EndConversationBody {
    pub conversation_id: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SwitchModelBody {
    pub model: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub messages: Vec<Turn>,
    pub metadata: ConversationMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndConversationResponse {
    /// `snapshot_sent` or `snapshot_failed`.
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub completion_ready: bool,
    pub uptime_secs: u64,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub status: String,
    pub response: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub current_model: String,
    pub available_models: Vec<String>,
    pub llama_models: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwitchModelResponse {
    pub status: String,
    pub message: String,
    pub test_response: String,
    pub old_model: String,
    pub new_model: String,
}

// =============================================================================
// Chat and conversations
// =============================================================================

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) = payload?;
    let message = body
        .message
        .ok_or_else(|| ApiError::BadRequest("Message is required".to_string()))?;

    let request = ChatRequest {
        message,
        conversation_id: body.conversation_id,
        user_email: body.user_email,
    };
    let model = state.current_model()?;
    let reply = state.orchestrator.handle_message(request, &model).await?;
    Ok(Json(reply))
}

/// GET /api/conversation/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let record = state.orchestrator.conversation(&id)?;
    Ok(Json(ConversationResponse {
        conversation_id: record.id,
        messages: record.messages,
        metadata: record.metadata,
    }))
}

/// DELETE /api/conversation/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orchestrator.delete_conversation(&id)?;
    Ok(Json(MessageResponse {
        message: "Conversation deleted successfully".to_string(),
    }))
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    Ok(Json(state.orchestrator.conversations()?))
}

/// POST /api/end-conversation
pub async fn end_conversation(
    State(state): State<AppState>,
    payload: Result<Json<EndConversationBody>, JsonRejection>,
) -> Result<Json<EndConversationResponse>, ApiError> {
    let Json(body) = payload?;
    let id = body
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("conversation_id is required".to_string()))?;

    let outcome = state
        .orchestrator
        .end_conversation(&id, body.user_email.as_deref())
        .await?;
    let status = if outcome.notified {
        "snapshot_sent"
    } else {
        "snapshot_failed"
    };
    Ok(Json(EndConversationResponse {
        status: status.to_string(),
    }))
}

// =============================================================================
// Health and models
// =============================================================================

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        model: state.current_model()?.model,
        completion_ready: state.models.is_ready(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /api/test-api - one live completion with the active model.
pub async fn test_api(State(state): State<AppState>) -> Result<Json<ProbeResponse>, ApiError> {
    let model = state.current_model()?;
    let response = state
        .models
        .probe(&model)
        .await
        .map_err(|e| ApiError::from(ChatError::from(e)))?;
    Ok(Json(ProbeResponse {
        status: "success".to_string(),
        response,
        model: model.model,
    }))
}

/// GET|POST /api/models
pub async fn models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, ApiError> {
    let current_model = state.current_model()?.model;
    // The catalog is already llama-only; both fields carry it.
    let available_models = state.models.available_models().await;
    let llama_models = available_models.clone();
    Ok(Json(ModelsResponse {
        current_model,
        available_models,
        llama_models,
    }))
}

/// POST /api/switch-model
///
/// The new model is installed only after a live call with it succeeds.
pub async fn switch_model(
    State(state): State<AppState>,
    payload: Result<Json<SwitchModelBody>, JsonRejection>,
) -> Result<Json<SwitchModelResponse>, ApiError> {
    let Json(body) = payload?;
    let requested = body.model.unwrap_or_default();
    let current = state.current_model()?;

    let switch = state
        .models
        .switch_model(&current, &requested)
        .await
        .map_err(|err| match err {
            ChatError::Completion(e) => ApiError::ModelRejected {
                code: e.code(),
                message: format!("Failed to switch to {}: {}", requested.trim(), e),
            },
            other => ApiError::from(other),
        })?;

    let new_model = switch.config.model.clone();
    state.install_model(switch.config)?;
    Ok(Json(SwitchModelResponse {
        status: "success".to_string(),
        message: format!("Successfully switched to {}", new_model),
        test_response: switch.test_response,
        old_model: switch.old_model,
        new_model,
    }))
}
