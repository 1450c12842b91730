use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FolioError, Result};

/// Top-level configuration for the Folio relay.
///
/// Loaded from `~/.folio/config.toml` by default, then overridden by
/// environment variables (see [`FolioConfig::apply_env_overrides`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl FolioConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FolioConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognised keys: `GROQ_API_KEY`, `GROQ_MODEL`, `GROQ_BASE_URL`,
    /// `EMAIL_API_KEY`, `EMAIL_FROM` (or its legacy alias `EMAIL_USER`),
    /// `ADMIN_EMAIL`, `FOLIO_PORT`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GROQ_API_KEY") {
            self.completion.api_key = v;
        }
        if let Some(v) = get("GROQ_MODEL") {
            self.completion.model = v;
        }
        if let Some(v) = get("GROQ_BASE_URL") {
            self.completion.base_url = v;
        }
        if let Some(v) = get("EMAIL_API_KEY") {
            self.email.api_key = v;
        }
        if let Some(v) = get("EMAIL_FROM").or_else(|| get("EMAIL_USER")) {
            self.email.from_address = v;
        }
        if let Some(v) = get("ADMIN_EMAIL") {
            self.email.admin_email = v;
        }
        if let Some(v) = get("FOLIO_PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %v, "Ignoring invalid FOLIO_PORT"),
            }
        }
    }

    /// Check the configuration for values the relay cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(FolioError::Config("server.port must be non-zero".into()));
        }
        if self.chat.history_window == 0 {
            return Err(FolioError::Config(
                "chat.history_window must be at least 1".into(),
            ));
        }
        if self.chat.max_message_length == 0 {
            return Err(FolioError::Config(
                "chat.max_message_length must be at least 1".into(),
            ));
        }
        if !self.email.admin_email.contains('@') {
            return Err(FolioError::Config(format!(
                "email.admin_email is not an address: '{}'",
                self.email.admin_email
            )));
        }
        if !self.email.from_address.is_empty() && !self.email.from_address.contains('@') {
            return Err(FolioError::Config(format!(
                "email.from_address is not an address: '{}'",
                self.email.from_address
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Allowed CORS origins. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            allowed_origins: vec!["*".to_string()],
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Completion API settings (Groq, OpenAI-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// API base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    /// API key. Usually supplied through `GROQ_API_KEY`.
    pub api_key: String,
    /// Model used at startup.
    pub model: String,
    /// Maximum tokens generated per reply.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: String::new(),
            model: "llama-3.1-70b-versatile".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            top_p: 1.0,
            timeout_secs: 30,
        }
    }
}

/// Notification email settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Email API endpoint (Resend-compatible).
    pub api_url: String,
    /// Email API key. When empty, emails are only logged.
    pub api_key: String,
    /// Sender address.
    pub from_address: String,
    /// Address that receives contact messages and snapshots.
    pub admin_email: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: String::new(),
            from_address: String::new(),
            admin_email: "admin@example.com".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Conversation behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Name of the portfolio owner, used in the persona and replies.
    pub owner_name: String,
    /// Explicit system prompt. When unset, one is derived from `owner_name`.
    pub system_prompt: Option<String>,
    /// Number of stored turns replayed to the completion API.
    pub history_window: usize,
    /// Maximum inbound message length in characters.
    pub max_message_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            owner_name: "the site owner".to_string(),
            system_prompt: None,
            history_window: 10,
            max_message_length: 4000,
        }
    }
}

impl ChatConfig {
    /// The system prompt sent ahead of every conversation.
    pub fn system_prompt(&self) -> String {
        match &self.system_prompt {
            Some(prompt) if !prompt.trim().is_empty() => prompt.clone(),
            _ => format!(
                "You are an assistant for {}'s developer portfolio. \
                 You are talking to a potential HR, manager, or developer who \
                 is visiting the portfolio and helping them with their queries. \
                 You should be professional and provide accurate information. \
                 Return responses in markdown format.",
                self.owner_name
            ),
        }
    }
}
