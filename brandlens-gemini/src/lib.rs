//! Gemini completion endpoint adapter
//!
//! Hand-rolled REST client for the generateContent API. Retry policy lives
//! in the collection driver; this crate only issues requests and classifies
//! the failures it gets back.

use async_trait::async_trait;
use brandlens_core::{
    classify_message, BrandLensError, CompletionEndpoint, CompletionError, Provider, ProviderConfig,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Base URL for the Generative Language API
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini generateContent endpoint
#[derive(Debug, Clone)]
pub struct GeminiEndpoint {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Structured error body: `{"error": {"code": ..., "status": ..., ...}}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl GeminiEndpoint {
    pub fn new(config: ProviderConfig) -> Result<Self, BrandLensError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| BrandLensError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionEndpoint for GeminiEndpoint {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    #[instrument(skip(self, prompt))]
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/models/{}:generateContent", GEMINI_API_BASE, self.model);

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::transient(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &body));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            CompletionError::transient(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = parsed
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }

    /// Lists available models, the cheapest authenticated call the API offers.
    #[instrument(skip(self))]
    async fn probe(&self) -> Result<(), CompletionError> {
        let url = format!("{}/models", GEMINI_API_BASE);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| CompletionError::transient(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &body));
        }

        debug!("Gemini model listing succeeded");
        Ok(())
    }
}

/// Map an HTTP failure onto the shared failure taxonomy.
///
/// The status code and the structured error body are inspected first;
/// message matching is only the final fallback.
fn classify_response(status: StatusCode, body: &str) -> CompletionError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error);

    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| format!("Gemini API error ({}): {}", status, body));

    if status == StatusCode::TOO_MANY_REQUESTS
        || detail_status(&detail) == Some("RESOURCE_EXHAUSTED")
    {
        return CompletionError::rate_limited(message);
    }

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || matches!(
            detail_status(&detail),
            Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED")
        )
        || has_reason(&detail, "API_KEY_INVALID")
        || has_reason(&detail, "API_KEY_EXPIRED")
    {
        return CompletionError::auth(message);
    }

    CompletionError {
        kind: classify_message(&message),
        message,
    }
}

fn detail_status(detail: &Option<ErrorDetail>) -> Option<&str> {
    detail.as_ref().and_then(|d| d.status.as_deref())
}

/// Invalid/expired keys surface as 400 INVALID_ARGUMENT with a reason entry
/// in the details list rather than as a 401.
fn has_reason(detail: &Option<ErrorDetail>, reason: &str) -> bool {
    detail
        .as_ref()
        .map(|d| {
            d.details
                .iter()
                .any(|entry| entry.get("reason").and_then(|r| r.as_str()) == Some(reason))
        })
        .unwrap_or(false)
}
