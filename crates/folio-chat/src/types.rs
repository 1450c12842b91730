//! Request and reply types for chat operations.

use serde::{Deserialize, Serialize};

/// Inbound visitor message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Existing conversation to continue. A new one is started when absent.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Email the frontend already knows for this visitor.
    #[serde(default)]
    pub user_email: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn from_email(mut self, user_email: impl Into<String>) -> Self {
        self.user_email = Some(user_email.into());
        self
    }
}

/// Reply text and the conversation it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: String,
}

/// Contact details pulled out of a visitor message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Result of ending a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndOutcome {
    /// Snapshot text that was sent to the admin.
    pub snapshot: String,
    /// Whether the snapshot email was delivered.
    pub notified: bool,
}
