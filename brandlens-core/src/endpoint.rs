//! Completion-endpoint contract shared by all provider adapters
//!
//! An endpoint is a pure transport: one outbound request per `complete`
//! call, no retry policy, no pacing. The only obligation beyond the call
//! itself is classifying the provider's failure into a [`FailureKind`] so
//! the retry controller can route it.

use async_trait::async_trait;
use thiserror::Error;

use crate::provider::Provider;

/// Classification of a failed completion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Provider signalled throttling or exhausted quota
    RateLimited,
    /// Provider rejected the credential
    Auth,
    /// Anything else: network faults, 5xx, malformed responses
    Transient,
}

/// A classified failure returned by a provider adapter
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CompletionError {
    pub kind: FailureKind,
    pub message: String,
}

impl CompletionError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Auth,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }
}

/// Fallback classification by message inspection.
///
/// Adapters classify from the provider's structured error first (HTTP status,
/// error code/status fields) and only fall through to this when the shape of
/// the failure carries no usable code. Substring matching against provider
/// error text is best-effort by nature; keep every such heuristic here.
pub fn classify_message(message: &str) -> FailureKind {
    let lowered = message.to_lowercase();

    if message.contains("429")
        || message.contains("RESOURCE_EXHAUSTED")
        || lowered.contains("rate limit")
        || lowered.contains("rate_limit")
        || lowered.contains("quota")
    {
        return FailureKind::RateLimited;
    }

    if message.contains("401")
        || message.contains("API_KEY_INVALID")
        || lowered.contains("authentication")
        || lowered.contains("invalid_api_key")
        || lowered.contains("api key expired")
    {
        return FailureKind::Auth;
    }

    FailureKind::Transient
}

/// One provider's completion interface
#[async_trait]
pub trait CompletionEndpoint: Send + Sync {
    /// Which provider this endpoint talks to
    fn provider(&self) -> Provider;

    /// Send a single prompt and return the response text.
    ///
    /// Exactly one outbound request; errors are classified, never retried.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Minimal-cost liveness check, run once before a collection loop starts.
    async fn probe(&self) -> Result<(), CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit_messages() {
        assert_eq!(
            classify_message("Error code: 429 - too many requests"),
            FailureKind::RateLimited
        );
        assert_eq!(
            classify_message("You exceeded your current quota"),
            FailureKind::RateLimited
        );
        assert_eq!(
            classify_message("RESOURCE_EXHAUSTED: slow down"),
            FailureKind::RateLimited
        );
    }

    #[test]
    fn test_classify_auth_messages() {
        assert_eq!(
            classify_message("Incorrect API key provided (invalid_api_key)"),
            FailureKind::Auth
        );
        assert_eq!(classify_message("API key expired"), FailureKind::Auth);
        assert_eq!(classify_message("401 Unauthorized"), FailureKind::Auth);
    }

    #[test]
    fn test_classify_defaults_to_transient() {
        assert_eq!(
            classify_message("connection reset by peer"),
            FailureKind::Transient
        );
        assert_eq!(classify_message("internal server error"), FailureKind::Transient);
    }
}
