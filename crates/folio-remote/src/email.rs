//! Admin email delivery.
//!
//! `ResendEmailSender` posts to the Resend HTTP API. `LogEmailSender` only
//! writes the message to the log and is used when no email key is set.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use folio_chat::{EmailSender, OutgoingEmail};
use folio_core::config::EmailConfig;
use folio_core::{FolioError, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

/// Pick the sender for a configuration: Resend when a key is present,
/// log-only otherwise.
pub fn sender_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    if config.api_key.trim().is_empty() {
        tracing::warn!("EMAIL_API_KEY not set; notification emails will only be logged");
        return Ok(Arc::new(LogEmailSender::new(&config.admin_email)));
    }
    Ok(Arc::new(ResendEmailSender::new(config)?))
}

// =============================================================================
// ResendEmailSender
// =============================================================================

pub struct ResendEmailSender {
    client: Client,
    api_url: String,
    api_key: Secret<String>,
    from: String,
    admin_email: String,
}

impl ResendEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FolioError::Config(format!("failed to build HTTP client: {}", e)))?;

        // Without a sender address the admin mails themselves.
        let from = if config.from_address.trim().is_empty() {
            config.admin_email.clone()
        } else {
            config.from_address.clone()
        };

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: Secret::new(config.api_key.clone()),
            from,
            admin_email: config.admin_email.clone(),
        })
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> bool {
        let request = SendEmailRequest {
            from: &self.from,
            to: [self.admin_email.as_str()],
            subject: &email.subject,
            text: email.rendered_body(),
            reply_to: email.reply_to.as_deref(),
        };

        let result = self
            .client
            .post(&self.api_url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!(subject = %email.subject, "Email sent to admin");
                true
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::error!(%status, body = %body, subject = %email.subject, "Email API rejected message");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, subject = %email.subject, "Email request failed");
                false
            }
        }
    }
}

// =============================================================================
// LogEmailSender
// =============================================================================

/// Writes emails to the log instead of sending them.
#[derive(Debug, Clone)]
pub struct LogEmailSender {
    admin_email: String,
}

impl LogEmailSender {
    pub fn new(admin_email: impl Into<String>) -> Self {
        Self {
            admin_email: admin_email.into(),
        }
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> bool {
        tracing::info!(
            to = %self.admin_email,
            subject = %email.subject,
            reply_to = email.reply_to.as_deref().unwrap_or("-"),
            body = %email.rendered_body(),
            "Email (log only)"
        );
        true
    }
}
