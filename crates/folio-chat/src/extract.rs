//! Contact detail and message extraction.
//!
//! Pulls a reply address and name out of free text, and isolates the part of
//! the message the visitor actually wants forwarded.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ContactInfo;

// =============================================================================
// Compiled patterns
// =============================================================================

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.-]+@[\w.-]+").expect("Invalid email regex"));

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:my name is|i am|this is)\s+([A-Za-z\s]{2,40})")
        .expect("Invalid name regex")
});

/// Markers after which the forwarded message begins, in priority order.
pub const DEFAULT_MESSAGE_INDICATORS: &[&str] = &[
    "tell you",
    "message:",
    "say:",
    "feedback:",
    "report:",
    "contact you about",
];

static DEFAULT_INDICATOR_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DEFAULT_MESSAGE_INDICATORS
        .iter()
        .map(|i| indicator_regex(i).expect("Invalid indicator regex"))
        .collect()
});

fn indicator_regex(indicator: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", regex::escape(indicator)))
}

// =============================================================================
// Contact info
// =============================================================================

/// Policy extracting reply details from a message.
pub trait ContactInfoExtraction: Send + Sync {
    fn extract(&self, message: &str) -> ContactInfo;
}

/// Pattern-based extractor.
///
/// Email is the first `local@domain` run of word characters, dots and
/// hyphens. Name follows "my name is", "i am" or "this is" and is 2 to 40
/// letters or spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexContactInfoExtractor;

impl RegexContactInfoExtractor {
    pub fn extract_email(&self, message: &str) -> Option<String> {
        let found = EMAIL_RE.find(message)?;
        // Sentence punctuation directly after an address is not part of it.
        let email = found.as_str().trim_end_matches('.');
        if email.ends_with('@') {
            return None;
        }
        Some(email.to_string())
    }

    pub fn extract_name(&self, message: &str) -> Option<String> {
        let caps = NAME_RE.captures(message)?;
        let name = caps.get(1)?.as_str().trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

impl ContactInfoExtraction for RegexContactInfoExtractor {
    fn extract(&self, message: &str) -> ContactInfo {
        ContactInfo {
            email: self.extract_email(message),
            name: self.extract_name(message),
        }
    }
}

// =============================================================================
// Forwarded message
// =============================================================================

/// Policy isolating the text to forward to the site owner.
pub trait ContactMessageExtraction: Send + Sync {
    fn extract_message(&self, message: &str) -> String;
}

/// Splits the message after the first indicator found.
///
/// Indicators are tried in priority order and matched case-insensitively.
/// The remainder is cut from the original text, so the visitor's casing
/// survives. When no indicator matches, or nothing follows it, the whole
/// message is forwarded.
#[derive(Debug, Clone)]
pub struct IndicatorMessageExtractor {
    indicators: Vec<Regex>,
}

impl IndicatorMessageExtractor {
    /// Extractor over a custom indicator list, in priority order.
    pub fn with_indicators<I, S>(indicators: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indicators = indicators
            .into_iter()
            .filter(|i| !i.as_ref().is_empty())
            .map(|i| indicator_regex(i.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { indicators })
    }
}

impl Default for IndicatorMessageExtractor {
    fn default() -> Self {
        Self {
            indicators: DEFAULT_INDICATOR_RES.clone(),
        }
    }
}

impl ContactMessageExtraction for IndicatorMessageExtractor {
    fn extract_message(&self, message: &str) -> String {
        for re in &self.indicators {
            if let Some(m) = re.find(message) {
                let rest = message[m.end()..].trim();
                if rest.is_empty() {
                    break;
                }
                return rest.to_string();
            }
        }
        message.to_string()
    }
}
