//! Conversation core for the Folio relay.
//!
//! Routes inbound visitor messages either to the completion API or to the
//! site owner's inbox, and owns the short-lived conversation state both paths
//! write to.

pub mod completion;
pub mod error;
pub mod extract;
pub mod intent;
pub mod mock;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod prompt;
pub mod store;
pub mod types;

pub use completion::{CompletionClient, ModelConfig};
pub use error::{ChatError, CompletionError, UpstreamFailure};
pub use extract::{
    ContactInfoExtraction, ContactMessageExtraction, IndicatorMessageExtractor,
    RegexContactInfoExtractor,
};
pub use intent::{ContactIntentDetector, KeywordIntentDetector};
pub use models::{ModelControl, ModelSwitch};
pub use notify::{EmailSender, OutgoingEmail};
pub use orchestrator::ChatOrchestrator;
pub use prompt::{PromptBuilder, PromptMessage};
pub use store::{ConversationStore, InMemoryConversationStore};
pub use types::{ChatReply, ChatRequest, ContactInfo, EndOutcome};
