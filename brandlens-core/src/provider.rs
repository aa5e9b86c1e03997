//! Provider definitions for completion endpoints

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat-completion API
    OpenAi,
    /// Google Gemini generateContent API
    Gemini,
}

impl Provider {
    /// Get the full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    /// Tag used for the `source` column of the assembled dataset and for
    /// default per-provider file names
    pub fn source_tag(&self) -> &'static str {
        match self {
            Provider::OpenAi => "chatgpt",
            Provider::Gemini => "gemini",
        }
    }

    /// Environment variables checked (in order) for this provider's API key
    pub fn env_keys(&self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &["OPENAI_API_KEY"],
            Provider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        }
    }

    /// Default model queried when no override is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-5-mini",
            Provider::Gemini => "gemini-2.5-flash",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "chatgpt" | "gpt" => Ok(Provider::OpenAi),
            "gemini" | "google" => Ok(Provider::Gemini),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("ChatGPT".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("claude".parse::<Provider>().is_err());
    }

    #[test]
    fn test_source_tags_are_distinct() {
        assert_ne!(
            Provider::OpenAi.source_tag(),
            Provider::Gemini.source_tag()
        );
    }
}
