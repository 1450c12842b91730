//! Prompt assembly.
//!
//! A prompt is the system preamble, then a rolling window of the most
//! recent stored turns, then the new visitor message.

use folio_core::config::ChatConfig;
use folio_core::{Role, Turn};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::store::ConversationStore;

/// One entry of the message list sent to the completion API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Turn> for PromptMessage {
    fn from(turn: &Turn) -> Self {
        Self::new(turn.role, turn.content.clone())
    }
}

/// Builds completion prompts for a deployment.
///
/// The window is a turn count, not a token budget.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
    history_window: usize,
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>, history_window: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history_window,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.system_prompt(), config.history_window)
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Prompt for `new_message` in the given conversation.
    ///
    /// `None` means a new conversation with no history. A named conversation
    /// that the store does not know is `NotFound`.
    pub fn build(
        &self,
        store: &dyn ConversationStore,
        conversation_id: Option<&str>,
        new_message: &str,
    ) -> Result<Vec<PromptMessage>, ChatError> {
        match conversation_id {
            Some(id) => {
                let record = store.get(id)?;
                Ok(self.build_from_history(&record.messages, new_message))
            }
            None => Ok(self.build_from_history(&[], new_message)),
        }
    }

    /// Prompt from an explicit history, oldest turn first.
    pub fn build_from_history(&self, history: &[Turn], new_message: &str) -> Vec<PromptMessage> {
        let start = history.len().saturating_sub(self.history_window);
        let recent = &history[start..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(PromptMessage::new(Role::System, self.system_prompt.clone()));
        messages.extend(recent.iter().map(PromptMessage::from));
        messages.push(PromptMessage::new(Role::User, new_message));
        messages
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}
