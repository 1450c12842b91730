//! Deterministic collaborators for tests.
//!
//! Used by this crate's unit tests and by the HTTP integration tests, so
//! they are public rather than `cfg(test)`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use folio_core::{Clock, IdGenerator};

use crate::completion::{CompletionClient, ModelConfig};
use crate::error::UpstreamFailure;
use crate::notify::{EmailSender, OutgoingEmail};
use crate::prompt::PromptMessage;

// =============================================================================
// Completion
// =============================================================================

/// A completion call as the mock saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub messages: Vec<PromptMessage>,
    pub config: ModelConfig,
}

/// Completion client with a canned outcome.
///
/// Replies with fixed text (or fails with a fixed reason) and records every
/// call. Individual models can be made to fail.
#[derive(Debug)]
pub struct MockCompletionClient {
    outcome: Result<String, UpstreamFailure>,
    model_failures: HashMap<String, UpstreamFailure>,
    models: Option<Vec<String>>,
    ready: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockCompletionClient {
    /// Client that answers every call with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            outcome: Ok(reply.into()),
            model_failures: HashMap::new(),
            models: None,
            ready: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Client whose every call fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(UpstreamFailure::new(reason)),
            ..Self::replying("")
        }
    }

    /// Upstream model list. Without it, listing fails.
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    /// Calls made with `model` fail with `reason`.
    pub fn failing_for_model(mut self, model: impl Into<String>, reason: impl Into<String>) -> Self {
        self.model_failures
            .insert(model.into(), UpstreamFailure::new(reason));
        self
    }

    /// Report the client as lacking credentials.
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::replying("Mock reply")
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        config: &ModelConfig,
    ) -> Result<String, UpstreamFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                config: config.clone(),
            });
        }
        if let Some(failure) = self.model_failures.get(&config.model) {
            return Err(failure.clone());
        }
        self.outcome.clone()
    }

    async fn list_models(&self) -> Result<Vec<String>, UpstreamFailure> {
        self.models
            .clone()
            .ok_or_else(|| UpstreamFailure::new("model listing unavailable"))
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

// =============================================================================
// Email
// =============================================================================

/// Email sender that keeps every message it is asked to deliver.
#[derive(Debug, Default)]
pub struct RecordingEmailSender {
    fail: bool,
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender that records attempts but reports every delivery as failed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every email passed to `send`, including failed attempts.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> bool {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        !self.fail
    }
}

// =============================================================================
// Clock and ids
// =============================================================================

/// Manually advanced clock.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock by `secs`, which may be negative.
    pub fn advance_secs(&self, secs: i64) {
        if let Ok(mut now) = self.now.lock() {
            *now += Duration::seconds(secs);
        }
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self::at(start)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|n| *n).unwrap_or_else(|_| Utc::now())
    }
}

/// Ids `conv-1`, `conv-2`, ... in creation order.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicUsize,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("conv-{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Role;

    #[tokio::test]
    async fn test_mock_completion_records_calls() {
        let client = MockCompletionClient::replying("hi there");
        let msgs = vec![PromptMessage::new(Role::User, "hello")];
        let reply = client.complete(&msgs, &ModelConfig::default()).await.unwrap();
        assert_eq!(reply, "hi there");
        assert_eq!(client.call_count(), 1);
        assert_eq!(client.calls()[0].messages, msgs);
    }

    #[tokio::test]
    async fn test_mock_completion_failures() {
        let client = MockCompletionClient::failing("rate_limit_exceeded");
        let err = client.complete(&[], &ModelConfig::default()).await.unwrap_err();
        assert_eq!(err.reason, "rate_limit_exceeded");

        let client = MockCompletionClient::replying("ok").failing_for_model("bad", "model_not_found");
        let cfg = ModelConfig::default();
        assert!(client.complete(&[], &cfg).await.is_ok());
        assert!(client.complete(&[], &cfg.with_model("bad")).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_completion_models() {
        assert!(MockCompletionClient::default().list_models().await.is_err());
        let client = MockCompletionClient::default().with_models(["a", "b"]);
        assert_eq!(client.list_models().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_recording_email_sender() {
        let ok = RecordingEmailSender::new();
        assert!(ok.send(&OutgoingEmail::new("s", "b")).await);
        let bad = RecordingEmailSender::failing();
        assert!(!bad.send(&OutgoingEmail::new("s", "b")).await);
        assert_eq!(ok.sent().len(), 1);
        assert_eq!(bad.sent().len(), 1);
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::default();
        let start = clock.now();
        clock.advance_secs(90);
        assert_eq!((clock.now() - start).num_seconds(), 90);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::default();
        assert_eq!(ids.next_id(), "conv-1");
        assert_eq!(ids.next_id(), "conv-2");
    }
}
