//! Outgoing notification emails.
//!
//! The relay only ever mails the site owner: contact requests and
//! end-of-conversation snapshots. Delivery is behind [`EmailSender`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A message addressed to the configured admin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    /// Visitor address replies should go to.
    pub reply_to: Option<String>,
}

impl OutgoingEmail {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            reply_to: None,
        }
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Body as delivered, with the visitor address on top when known.
    pub fn rendered_body(&self) -> String {
        match &self.reply_to {
            Some(addr) => format!("From: {}\n\n{}", addr, self.body),
            None => self.body.clone(),
        }
    }
}

/// Delivers emails to the admin.
///
/// Delivery problems are reported as `false`; implementations log the
/// cause themselves.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> bool;
}

/// Compose the notification for a visitor contact request.
pub fn contact_email(email: &str, name: Option<&str>, message: &str) -> OutgoingEmail {
    let subject = format!("Portfolio contact from {}", name.unwrap_or(email));
    let body = format!(
        "Message from {} (email: {}):\n\n{}",
        name.unwrap_or("visitor"),
        email,
        message
    );
    OutgoingEmail::new(subject, body).with_reply_to(email)
}

/// Compose the end-of-conversation snapshot mail.
pub fn snapshot_email(
    conversation_id: &str,
    snapshot: &str,
    visitor_email: Option<&str>,
) -> OutgoingEmail {
    let subject = format!("Conversation snapshot {}", conversation_id);
    let body = match visitor_email {
        Some(addr) => format!("Visitor email: {}\n\n{}", addr, snapshot),
        None => snapshot.to_string(),
    };
    let email = OutgoingEmail::new(subject, body);
    match visitor_email {
        Some(addr) => email.with_reply_to(addr),
        None => email,
    }
}
