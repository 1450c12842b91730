use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona and instructions for the completion model.
    System,
    /// The portfolio visitor.
    User,
    /// The completion model, or the relay speaking on its behalf.
    Assistant,
}

impl Role {
    /// Wire name, as sent to the completion API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Capitalized name used in conversation snapshots.
    pub fn title(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Conversation records
// =============================================================================

/// One message exchanged within a conversation.
///
/// Turns are never mutated once appended to a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Role::User, content, timestamp)
    }

    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Role::Assistant, content, timestamp)
    }
}

/// Lifecycle metadata kept alongside a conversation's turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every append. Never earlier than `created_at`.
    pub updated_at: DateTime<Utc>,
    /// Set once when the visitor ends the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Visitor email supplied with the first message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Completion model in effect when the conversation started.
    pub model: String,
}

/// A full conversation: id, ordered turns, and metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub messages: Vec<Turn>,
    pub metadata: ConversationMetadata,
}

/// List view of a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub message_count: usize,
    pub last_message: Option<Turn>,
    pub metadata: ConversationMetadata,
}

impl From<&ConversationRecord> for ConversationSummary {
    fn from(record: &ConversationRecord) -> Self {
        Self {
            conversation_id: record.id.clone(),
            message_count: record.messages.len(),
            last_message: record.messages.last().cloned(),
            metadata: record.metadata.clone(),
        }
    }
}

/// Parameters recorded when a conversation is created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewConversation {
    pub user_email: Option<String>,
    pub model: String,
}
