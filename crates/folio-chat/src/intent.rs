//! Contact-intent detection.
//!
//! Decides whether a visitor message is a request to reach the site owner
//! rather than a question for the assistant.

/// Phrases that mark a message as a contact request.
pub const DEFAULT_CONTACT_PHRASES: &[&str] = &[
    "contact you",
    "reach out",
    "send message",
    "talk to developer",
    "speak to admin",
    "feedback",
    "report issue",
    "suggestion",
    "contact admin",
    "message you",
    "get in touch",
    "talk to you",
    "want to tell you",
    "need to contact",
    "reach admin",
];

/// Policy deciding whether a message carries contact intent.
pub trait ContactIntentDetector: Send + Sync {
    fn detect(&self, message: &str) -> bool;
}

/// Case-insensitive substring match against a fixed phrase list.
///
/// Matches anywhere in the message, so a bare "feedback" triggers it.
#[derive(Debug, Clone)]
pub struct KeywordIntentDetector {
    phrases: Vec<String>,
}

impl KeywordIntentDetector {
    /// Detector over a custom phrase list.
    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Default for KeywordIntentDetector {
    fn default() -> Self {
        Self::with_phrases(DEFAULT_CONTACT_PHRASES)
    }
}

impl ContactIntentDetector for KeywordIntentDetector {
    fn detect(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.phrases.iter().any(|p| lower.contains(p.as_str()))
    }
}
