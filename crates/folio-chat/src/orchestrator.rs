//! Chat orchestrator: routes each visitor message to the completion API or
//! to the site owner's inbox, and records the exchange.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use folio_core::config::ChatConfig;
use folio_core::{Clock, ConversationRecord, ConversationSummary, NewConversation, Turn};

use crate::completion::{CompletionClient, ModelConfig};
use crate::error::{ChatError, CompletionError};
use crate::extract::{
    ContactInfoExtraction, ContactMessageExtraction, IndicatorMessageExtractor,
    RegexContactInfoExtractor,
};
use crate::intent::{ContactIntentDetector, KeywordIntentDetector};
use crate::notify::{contact_email, snapshot_email, EmailSender};
use crate::prompt::PromptBuilder;
use crate::store::{render_snapshot, ConversationStore};
use crate::types::{ChatReply, ChatRequest, EndOutcome};

type ConversationLock = Arc<tokio::sync::Mutex<()>>;

/// Central coordinator for visitor messages.
///
/// Requests on the same conversation are serialized so each one appends its
/// turn pair without interleaving. Different conversations never contend.
pub struct ChatOrchestrator {
    store: Arc<dyn ConversationStore>,
    completion: Arc<dyn CompletionClient>,
    email: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    intent: Box<dyn ContactIntentDetector>,
    contact_info: Box<dyn ContactInfoExtraction>,
    contact_message: Box<dyn ContactMessageExtraction>,
    prompt: PromptBuilder,
    owner_name: String,
    max_message_length: usize,
    locks: Mutex<HashMap<String, ConversationLock>>,
}

impl ChatOrchestrator {
    /// Orchestrator with the default keyword and pattern heuristics.
    pub fn new(
        store: Arc<dyn ConversationStore>,
        completion: Arc<dyn CompletionClient>,
        email: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            store,
            completion,
            email,
            clock,
            intent: Box::new(KeywordIntentDetector::default()),
            contact_info: Box::new(RegexContactInfoExtractor),
            contact_message: Box::new(IndicatorMessageExtractor::default()),
            prompt: PromptBuilder::from_config(config),
            owner_name: config.owner_name.clone(),
            max_message_length: config.max_message_length,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_intent_detector(mut self, detector: impl ContactIntentDetector + 'static) -> Self {
        self.intent = Box::new(detector);
        self
    }

    pub fn with_contact_info(mut self, extractor: impl ContactInfoExtraction + 'static) -> Self {
        self.contact_info = Box::new(extractor);
        self
    }

    pub fn with_contact_message(
        mut self,
        extractor: impl ContactMessageExtraction + 'static,
    ) -> Self {
        self.contact_message = Box::new(extractor);
        self
    }

    /// Handle an incoming visitor message.
    ///
    /// Returns the reply text and the conversation id (new or existing).
    /// A supplied id that is unknown, or deleted while the request waited,
    /// starts a new conversation, so the returned id can differ from the one
    /// sent.
    pub async fn handle_message(
        &self,
        request: ChatRequest,
        model: &ModelConfig,
    ) -> Result<ChatReply, ChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::Validation("Message is required".to_string()));
        }
        if message.chars().count() > self.max_message_length {
            return Err(ChatError::Validation(format!(
                "Message exceeds {} characters",
                self.max_message_length
            )));
        }

        let user_email = request
            .user_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        let mut id =
            self.resolve_conversation(request.conversation_id.as_deref(), user_email, model)?;
        let mut guard = self.conversation_lock(&id)?.lock_owned().await;

        if !self.store.contains(&id)? {
            tracing::warn!(conversation_id = %id, "Conversation deleted while waiting, starting a new conversation");
            drop(guard);
            self.release_lock(&id)?;
            id = self.start_conversation(user_email, model)?;
            guard = self.conversation_lock(&id)?.lock_owned().await;
        }
        let _guard = guard;

        let response = if self.intent.detect(message) {
            tracing::info!(conversation_id = %id, "Contact intent detected");
            self.handle_contact(&id, message, user_email).await?
        } else {
            self.handle_chat(&id, message, model).await?
        };

        Ok(ChatReply {
            response,
            conversation_id: id,
        })
    }

    /// End a conversation: mail its snapshot to the admin and stamp `ended_at`.
    ///
    /// The conversation is marked ended even when the mail cannot be delivered.
    pub async fn end_conversation(
        &self,
        conversation_id: &str,
        visitor_email: Option<&str>,
    ) -> Result<EndOutcome, ChatError> {
        if !self.store.contains(conversation_id)? {
            return Err(ChatError::NotFound(conversation_id.to_string()));
        }
        let lock = self.conversation_lock(conversation_id)?;
        let _guard = lock.lock().await;

        let record = match self.store.get(conversation_id) {
            Ok(record) => record,
            Err(e) => {
                self.release_lock(conversation_id)?;
                return Err(e);
            }
        };
        let snapshot = render_snapshot(&record);
        let visitor_email = visitor_email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .or(record.metadata.user_email.as_deref());

        let mail = snapshot_email(conversation_id, &snapshot, visitor_email);
        let notified = self.email.send(&mail).await;
        if notified {
            tracing::info!(conversation_id = %conversation_id, turns = record.messages.len(), "Snapshot sent");
        } else {
            let err = ChatError::Notification(format!("snapshot for {} not delivered", conversation_id));
            tracing::warn!(error = %err, "Snapshot email failed");
        }

        self.store.mark_ended(conversation_id)?;
        Ok(EndOutcome { snapshot, notified })
    }

    pub fn conversation(&self, conversation_id: &str) -> Result<ConversationRecord, ChatError> {
        self.store.get(conversation_id)
    }

    pub fn conversations(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        self.store.list()
    }

    /// Delete a conversation. Unknown ids are not an error.
    pub fn delete_conversation(&self, conversation_id: &str) -> Result<(), ChatError> {
        self.store.delete(conversation_id)?;
        self.release_lock(conversation_id)
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Reuse a known id; anything else gets a fresh conversation.
    fn resolve_conversation(
        &self,
        requested: Option<&str>,
        user_email: Option<&str>,
        model: &ModelConfig,
    ) -> Result<String, ChatError> {
        if let Some(id) = requested.map(str::trim).filter(|id| !id.is_empty()) {
            if self.store.contains(id)? {
                return Ok(id.to_string());
            }
            tracing::warn!(conversation_id = %id, "Unknown conversation id, starting a new conversation");
        }
        self.start_conversation(user_email, model)
    }

    fn start_conversation(
        &self,
        user_email: Option<&str>,
        model: &ModelConfig,
    ) -> Result<String, ChatError> {
        self.store.create(NewConversation {
            user_email: user_email.map(str::to_string),
            model: model.model.clone(),
        })
    }

    fn conversation_lock(&self, conversation_id: &str) -> Result<ConversationLock, ChatError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| ChatError::Storage(format!("lock table poisoned: {}", e)))?;
        Ok(locks
            .entry(conversation_id.to_string())
            .or_default()
            .clone())
    }

    /// Drop the lock entry. Holders of a clone keep their guard.
    fn release_lock(&self, conversation_id: &str) -> Result<(), ChatError> {
        self.locks
            .lock()
            .map_err(|e| ChatError::Storage(format!("lock table poisoned: {}", e)))?
            .remove(conversation_id);
        Ok(())
    }

    async fn handle_contact(
        &self,
        id: &str,
        message: &str,
        user_email: Option<&str>,
    ) -> Result<String, ChatError> {
        let info = self.contact_info.extract(message);
        let Some(email) = info.email.as_deref().or(user_email) else {
            tracing::debug!(conversation_id = %id, "Contact request without an email, asking for details");
            return Ok(self.ask_for_details());
        };

        let forwarded = self.contact_message.extract_message(message);
        let mail = contact_email(email, info.name.as_deref(), &forwarded);
        let response = if self.email.send(&mail).await {
            tracing::info!(conversation_id = %id, "Contact message forwarded");
            self.confirmation()
        } else {
            let err = ChatError::Notification(format!("contact message from {} not delivered", email));
            tracing::warn!(conversation_id = %id, error = %err, "Contact email failed");
            self.delivery_failed()
        };

        self.record_exchange(id, message, &response)?;
        Ok(response)
    }

    async fn handle_chat(
        &self,
        id: &str,
        message: &str,
        model: &ModelConfig,
    ) -> Result<String, ChatError> {
        // Built before appending, so the history holds only earlier turns.
        let prompt = self.prompt.build(self.store.as_ref(), Some(id), message)?;

        let response = self
            .completion
            .complete(&prompt, model)
            .await
            .map_err(|failure| {
                let err = CompletionError::classify(&failure, &model.model);
                tracing::error!(
                    conversation_id = %id,
                    model = %model.model,
                    category = err.code(),
                    reason = %failure,
                    "Completion call failed"
                );
                err
            })?;

        self.record_exchange(id, message, &response)?;
        tracing::debug!(conversation_id = %id, prompt_len = prompt.len(), "Chat turn completed");
        Ok(response)
    }

    fn record_exchange(&self, id: &str, message: &str, response: &str) -> Result<(), ChatError> {
        self.store.append(id, Turn::user(message, self.clock.now()))?;
        self.store.append(id, Turn::assistant(response, self.clock.now()))
    }

    fn ask_for_details(&self) -> String {
        format!(
            "I'd be happy to pass your message along to {}. Could you please provide your \
             email address so they can get back to you?",
            self.owner_name
        )
    }

    fn confirmation(&self) -> String {
        format!(
            "Your message has been sent to {owner}. Thank you for reaching out - {owner} will \
             respond as soon as possible.",
            owner = self.owner_name
        )
    }

    fn delivery_failed(&self) -> String {
        format!(
            "I'm sorry, I couldn't deliver your message to {} right now. Please try again in a \
             moment.",
            self.owner_name
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
