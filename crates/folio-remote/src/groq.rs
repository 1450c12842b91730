//! Groq completion client.
//!
//! Speaks the OpenAI-compatible chat-completions protocol:
//! `POST {base_url}/chat/completions` and `GET {base_url}/models`, both with
//! bearer auth.
//!
//! Non-2xx responses become an [`UpstreamFailure`] whose reason carries the
//! status and the upstream `error.code` / `error.message`, so the core can
//! classify it.

use std::time::Duration;

use async_trait::async_trait;
use folio_chat::{CompletionClient, ModelConfig, PromptMessage, UpstreamFailure};
use folio_core::config::CompletionConfig;
use folio_core::{FolioError, Result};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Chat-completions client for Groq (or any OpenAI-compatible endpoint).
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: Secret<String>,
    timeout: Duration,
}

impl GroqClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FolioError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: Secret::new(config.api_key.clone()),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }

    fn ensure_key(&self) -> std::result::Result<(), UpstreamFailure> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(UpstreamFailure::new(
                "invalid_api_key: no API key configured",
            ))
        }
    }

    fn transport_failure(&self, e: reqwest::Error) -> UpstreamFailure {
        if e.is_timeout() {
            UpstreamFailure::new(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else if e.is_connect() {
            UpstreamFailure::new(format!("connection failed: {}", e))
        } else {
            UpstreamFailure::new(e.to_string())
        }
    }

    /// Pass 2xx responses through; turn anything else into a failure.
    async fn check_status(response: Response) -> std::result::Result<Response, UpstreamFailure> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(UpstreamFailure::new(error_reason(status.as_u16(), &body)))
    }
}

/// Failure reason from a non-2xx status and body.
fn error_reason(status: u16, body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|env| env.error);
    match parsed {
        Some(ErrorDetail {
            code: Some(code),
            message,
        }) => format!(
            "Error code: {} - {}: {}",
            status,
            code,
            message.unwrap_or_default()
        ),
        Some(ErrorDetail {
            code: None,
            message: Some(message),
        }) => format!("Error code: {} - {}", status, message),
        _ => format!("Error code: {} - {}", status, body.trim()),
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        config: &ModelConfig,
    ) -> std::result::Result<String, UpstreamFailure> {
        self.ensure_key()?;

        let request = ChatCompletionRequest {
            model: &config.model,
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            stream: false,
        };

        tracing::debug!(model = %config.model, messages = messages.len(), "Sending completion request");
        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", self.bearer())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;
        let response = Self::check_status(response).await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamFailure::new(format!("failed to parse completion response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| UpstreamFailure::new("no choices in completion response"))
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, UpstreamFailure> {
        self.ensure_key()?;

        let response = self
            .client
            .get(self.models_url())
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;
        let response = Self::check_status(response).await?;

        let body: ModelList = response
            .json()
            .await
            .map_err(|e| UpstreamFailure::new(format!("failed to parse model list: {}", e)))?;
        Ok(body.data.into_iter().map(|m| m.id).collect())
    }

    fn is_ready(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_chat::CompletionError;
    use folio_core::Role;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard, key: &str) -> GroqClient {
        GroqClient::new(&CompletionConfig {
            base_url: format!("{}/", server.url()),
            api_key: key.to_string(),
            ..CompletionConfig::default()
        })
        .unwrap()
    }

    fn prompt() -> Vec<PromptMessage> {
        vec![
            PromptMessage::new(Role::System, "be brief"),
            PromptMessage::new(Role::User, "Hello"),
        ]
    }

    // ---- Completion ----

    #[tokio::test]
    async fn test_complete_sends_openai_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer gsk_test")
            .match_body(Matcher::PartialJson(json!({
                "model": "llama-3.1-70b-versatile",
                "max_tokens": 1000,
                "stream": false,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "Hello"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server, "gsk_test");
        let reply = client.complete(&prompt(), &ModelConfig::default()).await.unwrap();
        assert_eq!(reply, "Hi there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_error_body_is_classifiable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#)
            .create_async()
            .await;

        let client = client_for(&server, "gsk_wrong");
        let failure = client
            .complete(&prompt(), &ModelConfig::default())
            .await
            .unwrap_err();
        assert_eq!(
            failure.reason,
            "Error code: 401 - invalid_api_key: Invalid API Key"
        );
        assert_eq!(
            CompletionError::classify(&failure, "m"),
            CompletionError::InvalidApiKey
        );
    }

    #[tokio::test]
    async fn test_complete_without_choices_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = client_for(&server, "gsk_test");
        let failure = client
            .complete(&prompt(), &ModelConfig::default())
            .await
            .unwrap_err();
        assert!(failure.reason.contains("no choices"));
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server, "");
        assert!(!client.is_ready());
        let failure = client
            .complete(&prompt(), &ModelConfig::default())
            .await
            .unwrap_err();
        assert!(failure.reason.contains("invalid_api_key"));
        mock.assert_async().await;
    }

    // ---- Models ----

    #[tokio::test]
    async fn test_list_models() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .match_header("authorization", "Bearer gsk_test")
            .with_status(200)
            .with_body(r#"{"object":"list","data":[{"id":"llama-3.1-8b-instant"},{"id":"mixtral-8x7b-32768"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server, "gsk_test");
        assert_eq!(
            client.list_models().await.unwrap(),
            vec!["llama-3.1-8b-instant", "mixtral-8x7b-32768"]
        );
    }

    #[tokio::test]
    async fn test_list_models_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = client_for(&server, "gsk_test");
        let failure = client.list_models().await.unwrap_err();
        assert_eq!(failure.reason, "Error code: 503 - upstream unavailable");
    }

    // ---- Reasons ----

    #[test]
    fn test_error_reason_message_only() {
        assert_eq!(
            error_reason(429, r#"{"error":{"message":"Rate limit reached (rate_limit_exceeded)"}}"#),
            "Error code: 429 - Rate limit reached (rate_limit_exceeded)"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GroqClient::new(&CompletionConfig {
            base_url: "https://api.groq.com/openai/v1/".into(),
            ..CompletionConfig::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "https://api.groq.com/openai/v1");
        assert_eq!(
            client.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }
}
