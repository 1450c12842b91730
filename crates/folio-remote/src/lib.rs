//! HTTP adapters for the relay's outside collaborators: the Groq
//! chat-completions API and the admin email channel.

pub mod email;
pub mod groq;

pub use email::{sender_from_config, LogEmailSender, ResendEmailSender};
pub use groq::GroqClient;
