//! OpenAI completion endpoint adapter
//!
//! Thin transport over the chat-completions API. Retry policy lives in the
//! collection driver; this crate only issues requests and classifies the
//! failures it gets back.

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use brandlens_core::{
    classify_message, CompletionEndpoint, CompletionError, FailureKind, Provider, ProviderConfig,
};
use tracing::instrument;

/// Prompt used by the liveness probe; kept tiny so the probe costs
/// next to nothing.
const PROBE_PROMPT: &str = "test";
const PROBE_MAX_TOKENS: u32 = 8;

/// OpenAI chat-completion endpoint
#[derive(Debug, Clone)]
pub struct OpenAiEndpoint {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEndpoint {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::with_config(OpenAIConfig::new().with_api_key(config.api_key));

        Self {
            client,
            model: config.model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, prompt: &str, max_tokens: Option<u32>) -> Result<String, CompletionError> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.model).messages([
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| CompletionError::transient(e.to_string()))?
                .into(),
        ]);
        if let Some(cap) = max_tokens {
            request.max_completion_tokens(cap);
        }
        let request = request
            .build()
            .map_err(|e| CompletionError::transient(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(classify)?;

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CompletionEndpoint for OpenAiEndpoint {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    #[instrument(skip(self, prompt))]
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.chat(prompt, None).await
    }

    #[instrument(skip(self))]
    async fn probe(&self) -> Result<(), CompletionError> {
        self.chat(PROBE_PROMPT, Some(PROBE_MAX_TOKENS)).await?;
        Ok(())
    }
}

/// Map the client error onto the shared failure taxonomy.
///
/// The structured error object is inspected first; only shapes without a
/// usable code fall back to message matching.
fn classify(err: OpenAIError) -> CompletionError {
    match err {
        OpenAIError::ApiError(api) => {
            let kind = classify_api_error(&api);
            CompletionError {
                kind,
                message: api.message,
            }
        }
        other => {
            let message = other.to_string();
            CompletionError {
                kind: classify_message(&message),
                message,
            }
        }
    }
}

fn classify_api_error(api: &ApiError) -> FailureKind {
    match (api.code.as_deref(), api.r#type.as_deref()) {
        (Some("rate_limit_exceeded"), _)
        | (Some("insufficient_quota"), _)
        | (_, Some("insufficient_quota")) => FailureKind::RateLimited,
        (Some("invalid_api_key"), _)
        | (Some("account_deactivated"), _)
        | (_, Some("authentication_error")) => FailureKind::Auth,
        _ => classify_message(&api.message),
    }
}
